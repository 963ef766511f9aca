//! Path grammar helpers (spec §6: "Path grammar").
//!
//! Paths are separator-delimited byte segments. The archive root is the
//! empty string, not a leading separator. Canonicalisation removes `.`
//! segments and collapses repeated separators, but deliberately leaves `..`
//! alone — callers still traverse it, unlike castore's `Path` type (which
//! forbids `..` entirely, since it models content-addressed trees rather
//! than a POSIX-shaped hierarchy).

pub const SEP: u8 = b'/';

/// Canonicalises `path` in place: drops `.` segments, collapses runs of
/// separators, and strips a leading/trailing separator. `..` segments are
/// preserved verbatim.
pub fn canonicalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for segment in path.split(SEP as char) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if !out.is_empty() {
            out.push(SEP as char);
        }
        out.push_str(segment);
    }
    out
}

/// Splits a canonicalised path into its first segment and the remainder
/// (the remainder still has any leading separator stripped).
pub fn split_first(path: &str) -> (&str, &str) {
    match path.find(SEP as char) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (path, ""),
    }
}

/// Splits a canonicalised path into `(dirname, basename)`, as used by the
/// linear resolver (spec §4.D step 2) when the caller didn't ask for a
/// directory outright.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind(SEP as char) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Joins a directory's full path with a relative symlink target, the way
/// the tree resolver does when constructing an absolute restart path (spec
/// §4.C: "prefixing the directory's full path when the linkname is
/// relative").
pub fn join(dir: &str, rel: &str) -> String {
    if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{dir}{}{rel}", SEP as char)
    }
}

bitflags::bitflags! {
    /// Resolver intent flags (spec §4.C/§4.D/§6).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FindFlags: u32 {
        /// Caller wants the result to be a directory (linear resolver: look
        /// it up directly in the flat root rather than splitting off a leaf).
        const DIR = 1 << 0;
        /// Auto-create a missing regular file at the final segment.
        const MKFILE = 1 << 1;
        /// Auto-create a missing directory at the final segment.
        const MKDIR = 1 << 2;
    }
}

/// Whether to follow a symlink at the final path segment. Intermediate
/// segments always follow regardless of this setting (spec §4.C step 5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Follow {
    Follow,
    NoFollow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_collapses_dots_and_separators() {
        assert_eq!(canonicalize("a//b/./c/"), "a/b/c");
        assert_eq!(canonicalize("/a/b"), "a/b");
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn canonicalize_preserves_dotdot() {
        assert_eq!(canonicalize("a/../b"), "a/../b");
        assert_eq!(canonicalize("../a"), "../a");
    }

    #[test]
    fn split_first_segment() {
        assert_eq!(split_first("a/b/c"), ("a", "b/c"));
        assert_eq!(split_first("a"), ("a", ""));
    }

    #[test]
    fn split_parent_basename() {
        assert_eq!(split_parent("usr/src/linux"), ("usr/src", "linux"));
        assert_eq!(split_parent("linux"), ("", "linux"));
    }

    #[test]
    fn join_relative_symlink() {
        assert_eq!(join("a/b", "c"), "a/b/c");
        assert_eq!(join("", "c"), "c");
    }
}
