//! File-handle layer (spec §4.E): open/read/write/lseek/close, with the
//! linear-read fast path and the local-scratch-file slow path.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use tracing::{instrument, trace};

use crate::backend::Backend;
use crate::class::VfsClass;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::ids::{HandleId, InodeId, SuperId};
use crate::path::{split_parent, FindFlags, Follow};

/// Linear-read state machine (spec §9 "Linear state machine"): an explicit
/// four-variant enum rather than an integer flag, so write/seek paths can
/// assert *inactive* and the compiler enforces exhaustive handling
/// elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinearState {
    Inactive,
    Preopen,
    Open,
    Closed,
}

/// An open file (spec §4.E).
pub struct FileHandle<B: Backend> {
    pub inode: InodeId,
    pub super_id: SuperId,
    pub offset: u64,
    pub file: Option<File>,
    pub changed: bool,
    pub state: LinearState,
}

impl<B: Backend, C: Clock> VfsClass<B, C> {
    /// `open(path, flags, mode)` (spec §4.E).
    #[instrument(skip(self))]
    pub fn open(
        &mut self,
        super_id: SuperId,
        start: InodeId,
        path: &str,
        flags: i32,
        mode: u32,
        want_linear: bool,
    ) -> Result<HandleId> {
        let found = match self.find_entry(super_id, start, path, FindFlags::empty(), Follow::Follow) {
            Ok(inode) => Some(inode),
            Err(Error::NotFound) => None,
            Err(e) => return Err(e),
        };

        let creat = flags & libc::O_CREAT != 0;
        let excl = flags & libc::O_EXCL != 0;

        let (inode, created) = match found {
            Some(_) if creat && excl => return Err(Error::Exists),
            Some(inode) => (inode, false),
            None => {
                if !creat {
                    return Err(Error::NotFound);
                }
                if B::READONLY {
                    return Err(Error::Invalid);
                }

                let (dirname, name) = split_parent(path);
                let parent = self.find_entry(super_id, start, dirname, FindFlags::empty(), Follow::Follow)?;

                let inode = self.generate_entry(name, parent, libc::S_IFREG | (mode & 0o7777));
                match self.new_scratch_file() {
                    Ok(scratch) => self.inode_mut(inode).localname = Some(scratch),
                    Err(e) => {
                        self.unwind_created(inode);
                        return Err(e);
                    }
                }
                trace!(ino = inode.0, "allocated scratch file for new entry");
                (inode, true)
            }
        };

        // Every failure from here on, when `created` is true, must unlink
        // the freshly created entry/inode/scratch file rather than leak
        // them (spec §5, resource discipline).

        if self.inode(inode).is_dir() {
            if created {
                self.unwind_created(inode);
            }
            return Err(Error::IsADirectory);
        }

        let mut state = LinearState::Inactive;
        if want_linear && B::SUPPORTS_LINEAR {
            state = LinearState::Preopen;
        } else if let Err(e) = self.backend.fh_open(&mut self.inodes[inode.0].payload, flags, mode) {
            if created {
                self.unwind_created(inode);
            }
            return Err(e);
        }

        let file = match &self.inode(inode).localname {
            Some(path) => match open_with_flags(path, flags) {
                Ok(f) => Some(f),
                Err(e) => {
                    if created {
                        self.unwind_created(inode);
                    }
                    return Err(e);
                }
            },
            None => None,
        };

        let found_existing = found.is_some();
        self.stamp_rmstamp(super_id);
        self.superblock_mut(super_id).fd_usage += 1;
        self.inode_mut(inode).stat.nlink += 1;

        let changed = found.is_none();
        let handle = HandleId(self.handles.insert(FileHandle {
            inode,
            super_id,
            offset: 0,
            file,
            changed,
            state,
        }));
        Ok(handle)
    }

    /// `read(buf, n)` (spec §4.E).
    pub fn read(&mut self, handle: HandleId, buf: &mut [u8]) -> Result<usize> {
        let inode = self.handles[handle.0].inode;
        match self.handles[handle.0].state {
            LinearState::Preopen => {
                let offset = self.handles[handle.0].offset;
                self.backend.linear_start(&mut self.inodes[inode.0].payload, offset)?;
                self.handles[handle.0].state = LinearState::Open;
                let n = self.backend.linear_read(&mut self.inodes[inode.0].payload, buf)?;
                self.handles[handle.0].offset += n as u64;
                Ok(n)
            }
            LinearState::Open => {
                let n = self.backend.linear_read(&mut self.inodes[inode.0].payload, buf)?;
                self.handles[handle.0].offset += n as u64;
                Ok(n)
            }
            LinearState::Closed => unreachable!("read on a closed handle: programmer error"),
            LinearState::Inactive => match &mut self.handles[handle.0].file {
                Some(file) => {
                    let n = file.read(buf)?;
                    self.handles[handle.0].offset += n as u64;
                    Ok(n)
                }
                None => unreachable!("neither linear state nor local fd: backend bug"),
            },
        }
    }

    /// `write(buf, n)` (spec §4.E). Fatal if any linear state is set (spec
    /// §8, property 12).
    pub fn write(&mut self, handle: HandleId, buf: &[u8]) -> Result<usize> {
        assert_eq!(
            self.handles[handle.0].state,
            LinearState::Inactive,
            "write while a linear state is set: programmer error"
        );

        self.handles[handle.0].changed = true;
        match &mut self.handles[handle.0].file {
            Some(file) => {
                let n = file.write(buf)?;
                self.handles[handle.0].offset += n as u64;
                Ok(n)
            }
            None => Err(Error::Invalid),
        }
    }

    /// `lseek(off, whence)` (spec §4.E). Fatal once linear state is *open*.
    pub fn lseek(&mut self, handle: HandleId, offset: i64, whence: i32) -> Result<u64> {
        assert_ne!(
            self.handles[handle.0].state,
            LinearState::Open,
            "seek on an active linear stream: programmer error"
        );

        if let Some(file) = &mut self.handles[handle.0].file {
            let pos = match whence {
                libc::SEEK_SET => SeekFrom::Start(offset.max(0) as u64),
                libc::SEEK_CUR => SeekFrom::Current(offset),
                libc::SEEK_END => SeekFrom::End(offset),
                _ => return Err(Error::Invalid),
            };
            let new_pos = file.seek(pos)?;
            self.handles[handle.0].offset = new_pos;
            return Ok(new_pos);
        }

        let inode = self.handles[handle.0].inode;
        let size = self.inode(inode).stat.size as i64;
        let current = self.handles[handle.0].offset as i64;
        let target = match whence {
            libc::SEEK_SET => offset,
            libc::SEEK_CUR => current + offset,
            libc::SEEK_END => size + offset,
            _ => return Err(Error::Invalid),
        };
        let clamped = target.clamp(0, size) as u64;
        self.handles[handle.0].offset = clamped;
        Ok(clamped)
    }

    /// `close()` (spec §4.E).
    #[instrument(skip(self))]
    pub fn close(&mut self, handle: HandleId) -> Result<()> {
        let inode = self.handles[handle.0].inode;
        let super_id = self.handles[handle.0].super_id;

        self.superblock_mut(super_id).fd_usage -= 1;
        if self.superblock(super_id).fd_usage == 0 {
            self.stamp_create(super_id);
        }

        if self.handles[handle.0].state == LinearState::Open {
            self.backend.linear_close(&mut self.inodes[inode.0].payload);
            self.handles[handle.0].state = LinearState::Closed;
        }

        self.backend.fh_close(&mut self.inodes[inode.0].payload)?;

        if self.handles[handle.0].changed && B::SUPPORTS_FILE_STORE {
            let full = self.full_path(inode);
            let local = self
                .inode(inode)
                .localname
                .clone()
                .expect("changed handle without a scratch file: backend bug");
            self.backend.file_store(&full, &local)?;
            self.invalidate(super_id);
        }

        if let Some(file) = self.handles[handle.0].file.take() {
            drop(file);
        }

        self.free_inode(inode);
        self.handles.remove(handle.0);
        Ok(())
    }

    /// Unwinds a freshly created entry+inode (and its scratch file, via
    /// [`crate::store`]'s cascading free) after a failure partway through
    /// `open` (spec §5, resource discipline: "failures inside `open` after a
    /// scratch file is created must unlink it").
    fn unwind_created(&mut self, inode: InodeId) {
        match self.inode(inode).entry {
            Some(entry) => self.free_entry(entry),
            None => self.free_inode(inode),
        }
    }

    fn new_scratch_file(&self) -> Result<std::path::PathBuf> {
        let named = tempfile::Builder::new()
            .prefix("vfscore-")
            .tempfile_in(&self.config.scratch_dir)?;
        let (_file, temp_path) = named.into_parts();
        temp_path.keep().map_err(|e| Error::LocalIo(e.error))
    }
}


fn open_with_flags(path: &std::path::Path, flags: i32) -> Result<File> {
    let mut opts = OpenOptions::new();
    match flags & libc::O_ACCMODE {
        libc::O_WRONLY => {
            opts.write(true);
        }
        libc::O_RDWR => {
            opts.read(true).write(true);
        }
        _ => {
            opts.read(true);
        }
    }
    if flags & libc::O_APPEND != 0 {
        opts.append(true);
    }
    if flags & libc::O_TRUNC != 0 {
        opts.truncate(true);
    }
    Ok(opts.open(path)?)
}
