//! Inodes (spec §3: "Inode").

use std::path::PathBuf;

use bytes::Bytes;

use crate::backend::Backend;
use crate::ids::{EntryId, SuperId};
use crate::stat::Stat;

/// A file, directory, or symlink (spec §3).
///
/// Invariants upheld by [`crate::store::InodeStore`]:
/// - `stat.nlink` equals the number of entries naming this inode.
/// - a non-directory inode has an empty `children` sequence.
/// - `entry`, when `Some`, points back to an entry whose `inode` is this one.
pub struct Inode<B: Backend> {
    pub stat: Stat,
    /// Symlink target. `Some` iff the inode is a symlink.
    pub linkname: Option<Bytes>,
    /// Local scratch file backing a writable or body-cached inode.
    pub localname: Option<PathBuf>,
    pub superblock: SuperId,
    /// Weak back-pointer to the entry that canonically names this inode,
    /// used for path reconstruction. Never an ownership edge.
    pub entry: Option<EntryId>,
    /// Ordered child entries, in insertion order (readdir's contract).
    /// Always empty for non-directories.
    pub children: Vec<EntryId>,
    pub payload: B::InodePayload,
    /// Wall-clock expiry stamp used by the linear resolver (spec §4.D/§4.G):
    /// backends set this to `now + ttl`; `dir_uptodate` compares against it.
    pub timestamp: i64,
}

impl<B: Backend> Inode<B> {
    pub fn is_dir(&self) -> bool {
        crate::stat::is_dir(self.stat.mode)
    }

    pub fn is_symlink(&self) -> bool {
        crate::stat::is_lnk(self.stat.mode)
    }

    pub fn is_regular(&self) -> bool {
        crate::stat::is_reg(self.stat.mode)
    }
}
