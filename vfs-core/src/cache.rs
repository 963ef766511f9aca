//! Cache lifecycle (spec §4.G).

use tracing::trace;

use crate::backend::Backend;
use crate::class::VfsClass;
use crate::clock::Clock;
use crate::ids::SuperId;

impl<B: Backend, C: Clock> VfsClass<B, C> {
    /// `dir_uptodate(inode)` (spec §4.G): the class-wide flush flag, if set,
    /// forces one stale report and is then cleared; otherwise freshness is a
    /// wall-clock comparison against the inode's `timestamp` (backends set
    /// `timestamp = now + ttl`).
    pub fn dir_uptodate(&mut self, inode: crate::ids::InodeId) -> bool {
        if self.flush {
            self.flush = false;
            return false;
        }
        self.clock.now() < self.inode(inode).timestamp
    }

    /// `invalidate(super)` (spec §4.G): replaces the root with a fresh empty
    /// directory unless `want_stale` asks to keep the existing view.
    pub fn invalidate(&mut self, super_id: SuperId) {
        if self.superblock(super_id).want_stale {
            return;
        }

        let old_root = self.superblock(super_id).root;
        let mode = self.inode(old_root).stat.mode;
        let stat = self.default_stat(mode);

        self.free_inode(old_root);

        let new_root = self.new_inode(super_id, stat);
        self.superblock_mut(super_id).root = new_root;
        trace!(super_id = super_id.0, "invalidated root");
    }

    /// `setctl(STALE_DATA, arg)` (spec §4.F): toggles `want_stale`; clearing
    /// it also invalidates so the view catches up immediately.
    pub fn set_stale_data(&mut self, super_id: SuperId, want_stale: bool) {
        self.superblock_mut(super_id).want_stale = want_stale;
        if !want_stale {
            self.invalidate(super_id);
        }
    }

    /// Called whenever a superblock's `fd_usage` reaches zero (spec §4.G,
    /// §5): marks the super eligible for an external ager to reclaim. The
    /// ager itself is an external collaborator (spec §1) outside this
    /// crate's scope; this is the narrow call site it would hook.
    pub(crate) fn stamp_create(&mut self, super_id: SuperId) {
        trace!(super_id = super_id.0, "stamp_create");
    }

    /// Called whenever a superblock gains a new open handle, cancelling a
    /// pending `stamp_create` (spec §4.G).
    pub(crate) fn stamp_rmstamp(&mut self, super_id: SuperId) {
        trace!(super_id = super_id.0, "rmstamp");
    }
}
