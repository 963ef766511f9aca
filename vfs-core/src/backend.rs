//! The backend capability set the core consumes (spec §6).
//!
//! Every callable is a trait method; ones the spec marks "absent is a no-op"
//! carry a default implementation, ones marked *(required)* have none and
//! the concrete backend must supply them. Per-backend opaque payload slots
//! (spec §3, "opaque per-backend payload slot") are associated types rather
//! than a `void*`, so archive-like and remote-like backends each get a
//! typed payload instead of a cast.

use bytes::Bytes;

use crate::error::Result;
use crate::stat::Stat;

/// Outcome of [`Backend::archive_same`] (spec §4.B).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameResult {
    /// This superblock is not the one being looked for; keep scanning.
    Other,
    /// This superblock matches; reuse it.
    Match,
    /// This superblock doesn't match, and scanning should stop here rather
    /// than continue into older entries (spec: "allows short-circuit when a
    /// newer instance of the same endpoint should not unify with an older
    /// cached one").
    OtherAndStop,
}

/// The kind of node a backend hands back while populating a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    Regular,
    Symlink,
}

/// One child produced by [`Backend::dir_load`], carrying everything needed
/// to materialise an entry + inode for it.
pub struct ChildSpec<B: Backend> {
    pub name: String,
    pub kind: NodeKind,
    pub stat: Stat,
    pub linkname: Option<Bytes>,
    pub payload: B::InodePayload,
}

/// What a successful [`Backend::dir_load`] populates a directory with (spec
/// §4.D): the children to materialise, plus how many seconds from now the
/// directory stays fresh before `dir_uptodate` (spec §4.G) calls for a
/// reload — the resolver applies this to the inode's `timestamp` as
/// `now + ttl` (spec §4.D/§4.G: "backends set `timestamp = now + ttl`").
pub struct DirLoad<B: Backend> {
    pub children: Vec<ChildSpec<B>>,
    pub ttl: i64,
}

/// What a successful [`Backend::open_archive`] filled in (spec §4.B:
/// "require that the backend filled both `name` and `root`").
pub struct OpenedArchive<B: Backend> {
    pub name: String,
    pub root_stat: Stat,
    pub payload: B::SuperPayload,
}

pub trait Backend: Sized {
    /// Opaque per-inode backend payload (spec §3).
    type InodePayload: Default;
    /// Opaque per-entry backend payload (spec §3).
    type EntryPayload: Default;
    /// Opaque per-superblock backend payload (spec §3).
    type SuperPayload;
    /// Pre-validation token handed from [`Backend::archive_check`] through
    /// to [`Backend::archive_same`] (spec §4.B / §6).
    type Cookie: Default;

    /// `FL_READONLY`: omit `write` from the wired method table (spec §4.H).
    const READONLY: bool = false;
    /// `FL_REMOTE`: select the linear resolver and expiry-driven directory
    /// loading instead of the fully-populated tree resolver (spec §4.C/§4.D).
    const REMOTE: bool = false;
    /// Whether this backend can stream bytes via `linear_start`/`linear_read`
    /// /`linear_close` instead of a local scratch file (spec §4.E).
    const SUPPORTS_LINEAR: bool = false;
    /// Whether this backend can write modified files back on close
    /// (spec §4.E `close`, hook `file_store`).
    const SUPPORTS_FILE_STORE: bool = false;

    // -- lifecycle hooks: absence is a no-op (spec §6 table) --------------

    fn init_inode(&self, _payload: &mut Self::InodePayload, _stat: &mut Stat) {}
    fn init_entry(&self, _payload: &mut Self::EntryPayload) {}
    fn free_inode(&self, _payload: &Self::InodePayload, _stat: &Stat) {}
    fn free_archive(&self, _payload: &Self::SuperPayload) {}

    /// Pre-validates a name before scanning the superblock list; returning
    /// `None` aborts the lookup (spec §6: "null aborts").
    fn archive_check(&self, _name: &str) -> Option<Self::Cookie> {
        Some(Self::Cookie::default())
    }

    // -- required hooks ----------------------------------------------------

    /// Decides whether an existing superblock matches the requested name
    /// (spec §4.B).
    fn archive_same(
        &self,
        super_payload: &Self::SuperPayload,
        name: &str,
        cookie: &Self::Cookie,
    ) -> SameResult;

    /// Opens a brand new superblock for `name` (spec §4.B).
    fn open_archive(&self, name: &str, cookie: &Self::Cookie) -> Result<OpenedArchive<Self>>;

    /// Populates the children of a directory, plus the TTL fresh lookups
    /// within it should be served without reloading (spec §4.D). Required
    /// for `REMOTE` backends; never called otherwise.
    fn dir_load(&self, _path: &str) -> Result<DirLoad<Self>> {
        unreachable!("dir_load called on a backend that does not set Backend::REMOTE")
    }

    // -- optional I/O hooks --------------------------------------------------

    fn fh_open(&self, _payload: &mut Self::InodePayload, _flags: i32, _mode: u32) -> Result<()> {
        Ok(())
    }
    fn fh_close(&self, _payload: &mut Self::InodePayload) -> Result<()> {
        Ok(())
    }

    /// Opens a streaming cursor at `offset`; only called when
    /// [`Backend::SUPPORTS_LINEAR`] is set.
    fn linear_start(&self, _payload: &mut Self::InodePayload, _offset: u64) -> Result<bool> {
        unreachable!("linear_start called without Backend::SUPPORTS_LINEAR")
    }
    /// Reads streamed bytes; `0` means EOF. Only called in the *open* linear
    /// state.
    fn linear_read(&self, _payload: &mut Self::InodePayload, _buf: &mut [u8]) -> Result<usize> {
        unreachable!("linear_read called without Backend::SUPPORTS_LINEAR")
    }
    /// Releases the streaming cursor when leaving the *open* linear state.
    fn linear_close(&self, _payload: &mut Self::InodePayload) {}

    /// Writes a dirty scratch file back to the backend; only called when
    /// [`Backend::SUPPORTS_FILE_STORE`] is set.
    fn file_store(&self, _full_path: &str, _local_path: &std::path::Path) -> Result<()> {
        unreachable!("file_store called without Backend::SUPPORTS_FILE_STORE")
    }
}
