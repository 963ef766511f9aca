//! POSIX stat-shaped inode metadata (spec §3: "Attributes").

use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata carried by every [`crate::inode::Inode`], mirroring the fields
/// of `struct stat` that backends and the resolver actually touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stat {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    pub nlink: u32,
    pub ino: u64,
    pub dev: u64,
    pub rdev: u64,
}

pub fn is_dir(mode: u32) -> bool {
    mode & libc::S_IFMT == libc::S_IFDIR
}

pub fn is_reg(mode: u32) -> bool {
    mode & libc::S_IFMT == libc::S_IFREG
}

pub fn is_lnk(mode: u32) -> bool {
    mode & libc::S_IFMT == libc::S_IFLNK
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Produces a stat with the current uid/gid/time and `mode & !umask`, per
/// spec §4.A `default_stat`. `ino`/`dev`/`nlink` are filled in by the
/// caller (the inode store assigns `ino`, the class fixes `dev`, and
/// `nlink` starts at zero until the first naming entry is inserted).
pub fn default_stat(mode: u32, umask: u32) -> Stat {
    Stat {
        mode: mode & !umask,
        // SAFETY: getuid/getgid never fail.
        uid: unsafe { libc::getuid() },
        gid: unsafe { libc::getgid() },
        size: 0,
        atime: now(),
        mtime: now(),
        ctime: now(),
        nlink: 0,
        ino: 0,
        dev: 0,
        rdev: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umask_strips_write_bits() {
        let st = default_stat(libc::S_IFREG | 0o666, 0o022);
        assert_eq!(st.mode & 0o777, 0o644);
        assert!(is_reg(st.mode));
    }

    #[test]
    fn kind_predicates() {
        assert!(is_dir(libc::S_IFDIR | 0o755));
        assert!(is_lnk(libc::S_IFLNK | 0o777));
        assert!(!is_reg(libc::S_IFDIR));
    }
}
