//! Directory & meta API (spec §4.F): opendir/readdir/closedir, stat/lstat/
//! fstat, readlink, chdir, plus the `setctl` sub-operations that don't
//! already live on [`crate::class::VfsClass`] directly (`STALE_DATA` is on
//! [`crate::cache`], `LOGFILE`/`FLUSH` are on [`crate::class`]) and the
//! `getlocalcopy`/`ungetlocalcopy` pair.

use std::path::PathBuf;

use tracing::instrument;

use crate::backend::Backend;
use crate::class::VfsClass;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::ids::{DirId, HandleId, InodeId, SuperId};
use crate::path::{FindFlags, Follow};
use crate::stat::Stat;

/// One yielded directory entry (spec §4.F: "a thread-unsafe, process-static
/// dirent shell whose `d_name` is the current entry's name"). Design note
/// 9(b) calls for attaching the buffer to the iterator rather than keeping
/// it process-global in a thread-safe reimplementation; `Dirent` is that
/// per-call buffer, owned by the caller rather than reused in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dirent {
    pub d_name: String,
}

/// A directory iterator handle, as returned by [`VfsClass::opendir`] (spec
/// §4.F). Pins its directory inode (`nlink += 1`) for its lifetime, matching
/// `closedir`'s release.
pub struct DirIter {
    pub(crate) dir: InodeId,
    pub(crate) pos: usize,
}

impl<B: Backend, C: Clock> VfsClass<B, C> {
    /// `opendir(path)` (spec §4.F): resolves with `FL_DIR|FL_FOLLOW`,
    /// requires `S_ISDIR`, pins the directory inode, and returns an
    /// iterator positioned at the first child.
    #[instrument(skip(self))]
    pub fn opendir(&mut self, super_id: SuperId, start: InodeId, path: &str) -> Result<DirId> {
        let inode = self.find_entry(super_id, start, path, FindFlags::DIR, Follow::Follow)?;
        if !self.inode(inode).is_dir() {
            return Err(Error::NotADirectory);
        }
        self.inode_mut(inode).stat.nlink += 1;
        Ok(DirId(self.dirs.insert(DirIter { dir: inode, pos: 0 })))
    }

    /// `readdir(h)` (spec §4.F): yields the current entry's name and
    /// advances the cursor; `None` past the end (the idiomatic-Rust
    /// replacement for the "null sentinel" the spec describes).
    pub fn readdir(&mut self, dir: DirId) -> Option<Dirent> {
        let iter_dir = self.dirs[dir.0].dir;
        let pos = self.dirs[dir.0].pos;
        let children = &self.inodes[iter_dir.0].children;
        let eid = *children.get(pos)?;
        self.dirs[dir.0].pos += 1;
        Some(Dirent {
            d_name: self.entries[eid.0].name.to_string(),
        })
    }

    /// `closedir(h)` (spec §4.F): releases the pin taken by `opendir` and
    /// frees the iterator.
    pub fn closedir(&mut self, dir: DirId) {
        let inode = self.dirs[dir.0].dir;
        self.dirs.remove(dir.0);
        self.free_inode(inode);
    }

    /// `chdir(path)` (spec §4.F): "exactly `opendir` + `closedir`". Since
    /// this core has no single global cwd, it hands back the resolved
    /// directory inode for the caller to keep as its own notion of "current
    /// directory" (the `start` argument to later resolver calls), rather
    /// than the POSIX 0/-1 the original returns.
    pub fn chdir(&mut self, super_id: SuperId, start: InodeId, path: &str) -> Result<InodeId> {
        let dir = self.opendir(super_id, start, path)?;
        let inode = self.dirs[dir.0].dir;
        self.closedir(dir);
        Ok(inode)
    }

    /// `stat` (spec §4.F): follows symlinks.
    pub fn stat(&mut self, super_id: SuperId, start: InodeId, path: &str) -> Result<Stat> {
        let inode = self.find_entry(super_id, start, path, FindFlags::empty(), Follow::Follow)?;
        Ok(self.inode(inode).stat)
    }

    /// `lstat` (spec §4.F): does not follow a symlink at the final segment.
    pub fn lstat(&mut self, super_id: SuperId, start: InodeId, path: &str) -> Result<Stat> {
        let inode = self.find_entry(super_id, start, path, FindFlags::empty(), Follow::NoFollow)?;
        Ok(self.inode(inode).stat)
    }

    /// `fstat` (spec §4.F): copies the open handle's inode stat.
    pub fn fstat(&self, handle: HandleId) -> Stat {
        let inode = self.handles[handle.0].inode;
        self.inode(inode).stat
    }

    /// `readlink(path, buf, size)` (spec §4.F): copies up to `buf.len()`
    /// bytes of the link body without NUL termination; `EINVAL` if the
    /// target isn't a symlink, `EFAULT` if its body is absent.
    pub fn readlink(
        &mut self,
        super_id: SuperId,
        start: InodeId,
        path: &str,
        buf: &mut [u8],
    ) -> Result<usize> {
        let inode = self.find_entry(super_id, start, path, FindFlags::empty(), Follow::NoFollow)?;
        if !self.inode(inode).is_symlink() {
            return Err(Error::Invalid);
        }
        let linkname = self.inode(inode).linkname.as_ref().ok_or(Error::Fault)?;
        let n = linkname.len().min(buf.len());
        buf[..n].copy_from_slice(&linkname[..n]);
        Ok(n)
    }

    /// `getlocalcopy(path)` (spec §4.F): opens the file read-only and, if
    /// its inode has a `localname`, returns a duplicate of that path; `None`
    /// otherwise. The handle is closed again immediately — the directory
    /// entry still names the inode, so this never tears it down.
    pub fn getlocalcopy(&mut self, super_id: SuperId, start: InodeId, path: &str) -> Result<Option<PathBuf>> {
        let handle = self.open(super_id, start, path, libc::O_RDONLY, 0, false)?;
        let inode = self.handles[handle.0].inode;
        let local = self.inode(inode).localname.clone();
        self.close(handle)?;
        Ok(local)
    }

    /// `ungetlocalcopy` (spec §4.F): a no-op, since the cache owns the
    /// scratch file regardless of how many local copies were handed out.
    pub fn ungetlocalcopy(&self, _path: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{OpenedArchive, SameResult};
    use crate::class::ClassConfig;
    use crate::clock::SystemClock;
    use crate::error::Error;
    use crate::stat::default_stat;
    use crate::superblock::OpenPolicy;

    struct StubBackend;

    impl Backend for StubBackend {
        type InodePayload = ();
        type EntryPayload = ();
        type SuperPayload = ();
        type Cookie = ();

        fn archive_same(&self, _: &(), _: &str, _: &()) -> SameResult {
            SameResult::Other
        }

        fn open_archive(&self, name: &str, _: &()) -> Result<OpenedArchive<Self>> {
            Ok(OpenedArchive {
                name: name.to_string(),
                root_stat: default_stat(libc::S_IFDIR | 0o755, 0),
                payload: (),
            })
        }
    }

    fn fresh() -> (VfsClass<StubBackend, SystemClock>, crate::ids::SuperId, InodeId) {
        let mut class = VfsClass::new(StubBackend, ClassConfig::default());
        let super_id = class.find_or_open_super("t", OpenPolicy::AllowOpen).unwrap();
        let root = class.superblock(super_id).root;
        (class, super_id, root)
    }

    #[test]
    fn readdir_yields_insertion_order_then_none() {
        let (mut class, _super_id, root) = fresh();
        class.generate_entry("b", root, libc::S_IFREG | 0o644);
        class.generate_entry("a", root, libc::S_IFREG | 0o644);

        let dir = class.opendir(_super_id, root, "").unwrap();
        let first = class.readdir(dir).unwrap();
        let second = class.readdir(dir).unwrap();
        assert_eq!(first.d_name, "b");
        assert_eq!(second.d_name, "a");
        assert!(class.readdir(dir).is_none());
        class.closedir(dir);
    }

    #[test]
    fn opendir_closedir_leaves_nlink_unchanged() {
        let (mut class, super_id, root) = fresh();
        class.generate_entry("d", root, libc::S_IFDIR | 0o755);

        let before = class.stat(super_id, root, "d").unwrap().nlink;
        let dir = class.opendir(super_id, root, "d").unwrap();
        class.closedir(dir);
        let after = class.stat(super_id, root, "d").unwrap().nlink;
        assert_eq!(before, after);
    }

    #[test]
    fn opendir_on_file_is_not_a_directory() {
        let (mut class, super_id, root) = fresh();
        class.generate_entry("f", root, libc::S_IFREG | 0o644);
        let err = class.opendir(super_id, root, "f").unwrap_err();
        assert!(matches!(err, Error::NotADirectory));
    }

    #[test]
    fn readlink_truncates_without_nul() {
        let (mut class, super_id, root) = fresh();
        let link = class.generate_entry("l", root, libc::S_IFLNK | 0o777);
        class.inode_mut(link).linkname = Some(bytes::Bytes::from_static(b"targetpath"));

        let mut buf = [0u8; 4];
        let n = class.readlink(super_id, root, "l", &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"targ");
    }

    #[test]
    fn readlink_on_non_symlink_is_invalid() {
        let (mut class, super_id, root) = fresh();
        class.generate_entry("f", root, libc::S_IFREG | 0o644);
        let mut buf = [0u8; 4];
        let err = class.readlink(super_id, root, "f", &mut buf).unwrap_err();
        assert!(matches!(err, Error::Invalid));
    }

    #[test]
    fn lstat_reports_symlink_without_following() {
        let (mut class, super_id, root) = fresh();
        let target = class.generate_entry("real", root, libc::S_IFREG | 0o644);
        let link = class.generate_entry("link", root, libc::S_IFLNK | 0o777);
        class.inode_mut(link).linkname = Some(bytes::Bytes::from_static(b"real"));
        let _ = target;

        let st = class.lstat(super_id, root, "link").unwrap();
        assert!(crate::stat::is_lnk(st.mode));
    }
}
