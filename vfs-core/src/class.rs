//! Class wiring (spec §4.H).
//!
//! `VfsClass<B, C>` is the method table a concrete backend class installs:
//! one arena of inodes and one of entries shared by every superblock the
//! class has open, the superblock list itself, open file handles and
//! directory iterators, and the small amount of class-wide state spec §5
//! calls out (`inode_counter`, `rdev`, `logfile`, `flush`).
//!
//! Operations are implemented as `impl` blocks spread across sibling
//! modules (`store`, `superblock`, `resolve::{tree,linear}`, `handle`,
//! `cache`, `api`), one per spec component, all inherent methods on this
//! single struct — mirroring how the teacher crate's `TvixStoreFs` keeps
//! every FUSE operation as a method on one struct, just split by component
//! here for readability.

use std::fs::File;
use std::path::PathBuf;

use slab::Slab;

use crate::backend::Backend;
use crate::clock::{Clock, SystemClock};
use crate::entry::Entry;
use crate::handle::FileHandle;
use crate::inode::Inode;
use crate::superblock::Superblock;

/// Configuration an embedder passes in at construction time (spec §6.3:
/// "explicit configuration passed into the class, not hidden statics").
pub struct ClassConfig {
    /// `st_dev` value stamped on every inode this class allocates.
    pub dev: u64,
    /// Starting inode counter. Only matters for reproducible tests; real
    /// embedders leave this at 1.
    pub first_ino: u64,
    /// Mask applied to every mode passed to `default_stat` (spec §4.A).
    pub umask: u32,
    /// Symlink-chain depth before resolution fails with `ELOOP` (spec §8,
    /// property 9: "Symlink chain of length `follow` succeeds; length
    /// `follow+1` yields `ELOOP`").
    pub max_symlink_follow: u32,
    /// Directory new scratch files are created in (spec §3 `localname`:
    /// "a local-disk file that backs writable or body-cached inodes").
    pub scratch_dir: PathBuf,
}

impl Default for ClassConfig {
    fn default() -> Self {
        ClassConfig {
            dev: 0,
            first_ino: 1,
            umask: 0o022,
            max_symlink_follow: 5,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

pub struct VfsClass<B: Backend, C: Clock = SystemClock> {
    pub(crate) backend: B,
    pub(crate) config: ClassConfig,
    pub(crate) clock: C,

    pub(crate) inodes: Slab<Inode<B>>,
    pub(crate) entries: Slab<Entry<B>>,
    pub(crate) next_ino: u64,

    /// Stable-keyed storage for open superblocks.
    pub(crate) supers: Slab<Superblock<B>>,
    /// Scan order, most-recently-inserted-first (spec §4.B). A `SuperId`
    /// stays valid across insertions/removals elsewhere in the list, unlike
    /// a plain `Vec` index would.
    pub(crate) super_order: Vec<crate::ids::SuperId>,

    pub(crate) handles: Slab<FileHandle<B>>,
    pub(crate) dirs: Slab<crate::api::DirIter>,

    pub(crate) logfile: Option<File>,
    /// Set by `setctl(FLUSH)`, consumed by the next freshness check
    /// (spec §4.G).
    pub(crate) flush: bool,

    /// Instrumentation counters only (spec §5): total live inodes/entries
    /// across every superblock this class currently owns.
    pub(crate) total_inodes: u64,
    pub(crate) total_entries: u64,
}

impl<B: Backend> VfsClass<B, SystemClock> {
    pub fn new(backend: B, config: ClassConfig) -> Self {
        Self::with_clock(backend, config, SystemClock)
    }
}

impl<B: Backend, C: Clock> VfsClass<B, C> {
    pub fn with_clock(backend: B, config: ClassConfig, clock: C) -> Self {
        let next_ino = config.first_ino;
        VfsClass {
            backend,
            config,
            clock,
            inodes: Slab::new(),
            entries: Slab::new(),
            next_ino,
            supers: Slab::new(),
            super_order: Vec::new(),
            handles: Slab::new(),
            dirs: Slab::new(),
            logfile: None,
            flush: false,
            total_inodes: 0,
            total_entries: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Exposes the clock so deterministic tests can drive TTL expiry
    /// (spec §8, scenario S3) without sleeping; mirrors
    /// [`crate::clock::testing::FakeClock`]'s own `test-util` gate.
    #[cfg(any(test, feature = "test-util"))]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn total_inodes(&self) -> u64 {
        self.total_inodes
    }

    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }

    /// `setctl(LOGFILE, path)` (spec §4.F): stashes an open file for write
    /// on the class.
    pub fn set_logfile(&mut self, path: PathBuf) -> std::io::Result<()> {
        self.logfile = Some(File::create(path)?);
        Ok(())
    }

    /// `setctl(FLUSH)` (spec §4.F): consumed on the next `dir_uptodate`
    /// check.
    pub fn request_flush(&mut self) {
        self.flush = true;
    }
}
