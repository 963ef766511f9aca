//! Shared directory-cache core of a pluggable virtual filesystem.
//!
//! This crate is the in-memory inode/entry graph plus the path-resolution
//! and cache-lifecycle protocol that concrete backends (archive readers,
//! remote session protocols) plug into via the [`Backend`] trait. It
//! exposes a POSIX-shaped file API (open/read/write/seek/close,
//! stat/lstat/fstat, opendir/readdir/closedir, readlink, chdir) on top of
//! backend-supplied primitives, as [`VfsClass`] methods split one module
//! per component of the design:
//!
//! | Component | Module |
//! |---|---|
//! | Inode & Entry store | [`store`] |
//! | Superblock registry | [`superblock`] |
//! | Path resolver (tree) | [`resolve::tree`] |
//! | Path resolver (linear) | [`resolve::linear`] |
//! | File-handle layer | [`handle`] |
//! | Directory & meta API | [`api`] |
//! | Cache lifecycle | [`cache`] |
//! | Class wiring | [`class`] |

pub mod api;
pub mod backend;
pub mod cache;
pub mod class;
pub mod clock;
pub mod entry;
pub mod error;
pub mod handle;
pub mod ids;
pub mod inode;
pub mod path;
pub mod resolve;
pub mod stat;
pub mod store;
pub mod superblock;

pub use backend::{Backend, ChildSpec, DirLoad, NodeKind, OpenedArchive, SameResult};
pub use class::{ClassConfig, VfsClass};
pub use error::{Error, Result};
pub use ids::{DirId, EntryId, HandleId, InodeId, SuperId};
pub use path::{FindFlags, Follow};
pub use stat::Stat;
