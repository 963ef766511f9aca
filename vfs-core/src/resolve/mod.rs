//! Path resolution (spec §4.C/§4.D). Two strategies, one entry point: the
//! teacher's `find_entry` is implemented as a single generic method that
//! branches on `Backend::REMOTE`, per the design note "two resolvers, one
//! shape — expose `find_entry` as a strategy selected at class construction."

pub mod linear;
pub mod tree;

use crate::backend::Backend;
use crate::class::VfsClass;
use crate::clock::Clock;
use crate::error::Result;
use crate::ids::{InodeId, SuperId};
use crate::path::{canonicalize, FindFlags, Follow};

impl<B: Backend, C: Clock> VfsClass<B, C> {
    /// Resolves `path` starting at `start` within `super_id`. An empty
    /// canonical path resolves to `start` itself (spec §4.C step 2: "if
    /// empty, return the most recent entry").
    pub fn find_entry(
        &mut self,
        super_id: SuperId,
        start: InodeId,
        path: &str,
        flags: FindFlags,
        follow: Follow,
    ) -> Result<InodeId> {
        let canon = canonicalize(path);
        if canon.is_empty() {
            return Ok(start);
        }

        let mut budget = self.config.max_symlink_follow;
        if B::REMOTE {
            self.find_entry_linear(super_id, start, &canon, flags, follow, &mut budget)
        } else {
            self.find_entry_tree(super_id, start, &canon, flags, follow, &mut budget)
        }
    }
}
