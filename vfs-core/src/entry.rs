//! Directory entries (spec §3: "Entry").

use crate::backend::Backend;
use crate::ids::InodeId;

/// A (name, inode, parent-directory) triple (spec §3).
///
/// Invariant upheld by [`crate::store::EntryStore`]: the parent directory's
/// child sequence contains this entry iff `parent` points to that directory.
pub struct Entry<B: Backend> {
    pub name: Box<str>,
    pub inode: InodeId,
    /// Weak link to the parent directory inode; `None` only transiently,
    /// between `new_entry` and `insert_entry`.
    pub parent: Option<InodeId>,
    pub payload: B::EntryPayload,
}
