//! Inode & entry store (spec §4.A).
//!
//! Operations here are the only place inodes and entries are created or
//! destroyed; every other component goes through them rather than touching
//! the arenas directly, so the `nlink`-equals-naming-entries and
//! child-sequence invariants (spec §8, properties 1–2) only need proving
//! once.

use tracing::trace;

use crate::backend::Backend;
use crate::class::VfsClass;
use crate::clock::Clock;
use crate::entry::Entry;
use crate::ids::{EntryId, InodeId, SuperId};
use crate::inode::Inode;
use crate::stat::{default_stat, Stat};

impl<B: Backend, C: Clock> VfsClass<B, C> {
    /// `default_stat(mode)` (spec §4.A): current uid/gid/time, `mode & !umask`.
    pub fn default_stat(&self, mode: u32) -> Stat {
        default_stat(mode, self.config.umask)
    }

    /// `new_inode(super, initial_stat)` (spec §4.A).
    pub fn new_inode(&mut self, super_id: SuperId, mut stat: Stat) -> InodeId {
        if stat.ino == 0 {
            stat.ino = self.next_ino;
            self.next_ino += 1;
        }
        stat.dev = self.config.dev;
        stat.nlink = 0;

        let mut payload = B::InodePayload::default();
        self.backend.init_inode(&mut payload, &mut stat);

        let id = InodeId(self.inodes.insert(Inode {
            stat,
            linkname: None,
            localname: None,
            superblock: super_id,
            entry: None,
            children: Vec::new(),
            payload,
            timestamp: 0,
        }));

        self.supers[super_id.0].ino_usage += 1;
        self.total_inodes += 1;
        trace!(ino = id.0, super_id = super_id.0, "new_inode");
        id
    }

    /// `new_entry(name, inode)` (spec §4.A).
    pub fn new_entry(&mut self, name: &str, inode: InodeId) -> EntryId {
        let mut payload = B::EntryPayload::default();
        self.backend.init_entry(&mut payload);

        let id = EntryId(self.entries.insert(Entry {
            name: name.into(),
            inode,
            parent: None,
            payload,
        }));

        self.inodes[inode.0].entry = Some(id);
        self.total_entries += 1;
        id
    }

    /// `insert_entry(parent_dir, entry)` (spec §4.A). Order is insertion
    /// order, forming part of `readdir`'s contract.
    pub fn insert_entry(&mut self, parent_dir: InodeId, entry: EntryId) {
        self.entries[entry.0].parent = Some(parent_dir);
        let inode = self.entries[entry.0].inode;
        self.inodes[inode.0].stat.nlink += 1;
        self.inodes[parent_dir.0].children.push(entry);
    }

    /// `generate_entry(name, parent, mode)` (spec §4.A): `new_inode` +
    /// `new_entry`, then links it into `parent`.
    pub fn generate_entry(&mut self, name: &str, parent: InodeId, mode: u32) -> InodeId {
        let super_id = self.inodes[parent.0].superblock;
        let stat = self.default_stat(mode);
        let inode = self.new_inode(super_id, stat);
        let entry = self.new_entry(name, inode);
        self.insert_entry(parent, entry);
        inode
    }

    /// `free_entry(entry)` (spec §4.A): unlinks from the parent's child
    /// sequence, releases the name, clears the inode's back-pointer if it
    /// pointed here, and releases the inode (may cascade).
    pub fn free_entry(&mut self, entry: EntryId) {
        let e = &self.entries[entry.0];
        let inode = e.inode;
        let parent = e.parent;

        if let Some(parent) = parent {
            self.inodes[parent.0].children.retain(|&c| c != entry);
        }

        if self.inodes[inode.0].entry == Some(entry) {
            self.inodes[inode.0].entry = None;
        }

        self.entries.remove(entry.0);
        self.total_entries -= 1;

        self.release_inode(inode);
    }

    /// Decrements `nlink` and destroys the inode at zero (spec §4.A
    /// `free_inode`, the "hard-link case" branch plus the terminal free).
    fn release_inode(&mut self, inode: InodeId) {
        let nlink = self.inodes[inode.0].stat.nlink;
        if nlink > 1 {
            self.inodes[inode.0].stat.nlink -= 1;
            return;
        }
        self.destroy_inode(inode);
    }

    /// Cascading delete: repeatedly frees `children.first()` until empty,
    /// which stays correct even if a reentrant `free_inode` mutates the
    /// sequence mid-walk (spec §4.A design decision), then runs the
    /// backend's `free_inode`, releases `linkname`, unlinks any
    /// `localname` scratch file, and frees the inode itself.
    fn destroy_inode(&mut self, inode: InodeId) {
        while let Some(&child) = self.inodes[inode.0].children.first() {
            self.free_entry(child);
        }

        self.backend
            .free_inode(&self.inodes[inode.0].payload, &self.inodes[inode.0].stat);

        let removed = self.inodes.remove(inode.0);
        if let Some(path) = removed.localname {
            let _ = std::fs::remove_file(path);
        }

        self.supers[removed.superblock.0].ino_usage -= 1;
        self.total_inodes -= 1;
        trace!(ino = inode.0, "destroy_inode");
    }

    /// `free_inode(inode)` as a public entry point: used when an external
    /// caller (e.g. superblock teardown) wants to release ownership of an
    /// inode it holds directly rather than through an entry.
    pub fn free_inode(&mut self, inode: InodeId) {
        self.release_inode(inode);
    }

    pub fn inode(&self, id: InodeId) -> &Inode<B> {
        &self.inodes[id.0]
    }

    pub fn inode_mut(&mut self, id: InodeId) -> &mut Inode<B> {
        &mut self.inodes[id.0]
    }

    pub fn entry(&self, id: EntryId) -> &Entry<B> {
        &self.entries[id.0]
    }

    /// Reconstructs an inode's full path by walking its canonical entry's
    /// parent chain up to the root (used for symlink-target resolution and
    /// write-back's "computed full path", spec §4.C/§4.E).
    pub fn full_path(&self, inode: InodeId) -> String {
        let mut parts = Vec::new();
        let mut cur = inode;
        while let Some(ent_id) = self.inodes[cur.0].entry {
            let ent = &self.entries[ent_id.0];
            parts.push(ent.name.as_ref());
            match ent.parent {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        parts.reverse();
        parts.join("/")
    }
}
