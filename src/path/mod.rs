//! Path translation between the local platform and the remote host
//!
//! Remote paths are plain strings with '/' separators. Nothing here touches
//! the filesystem.

use std::path::{Component, Path, PathBuf};

/// Separator used on the remote side
pub const REMOTE_SEPARATOR: char = '/';

/// Convert a local path string into the remote convention.
///
/// Backslashes are flipped unconditionally; scp cannot address them as
/// separators. Idempotent.
pub fn to_remote(path: &str) -> String {
    path.replace('\\', "/")
}

/// Path of `full` relative to `root`, '/'-separated.
///
/// Returns `None` when `full` is not under `root` or equals it (an empty
/// relative path cannot name a file).
pub fn relative_to(root: &Path, full: &Path) -> Option<String> {
    let rest = full.strip_prefix(root).ok()?;

    let parts: Vec<String> = rest
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    Some(to_remote(&parts.join("/")))
}

/// Join a relative remote path onto a remote root.
pub fn join_remote(root: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches(REMOTE_SEPARATOR);
    if root.is_empty() {
        return relative.to_string();
    }
    if relative.is_empty() {
        return root.to_string();
    }
    format!("{}/{}", root.trim_end_matches(REMOTE_SEPARATOR), relative)
}

/// Directory portion of a '/'-separated relative path ("" at top level).
pub fn remote_parent(relative: &str) -> &str {
    match relative.rfind(REMOTE_SEPARATOR) {
        Some(idx) => &relative[..idx],
        None => "",
    }
}

/// Last component of a '/'-separated path.
pub fn remote_file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(REMOTE_SEPARATOR);
    match trimmed.rfind(REMOTE_SEPARATOR) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Re-join a '/'-separated relative path under a local base directory.
pub fn local_join(base: &Path, relative: &str) -> PathBuf {
    relative
        .split(REMOTE_SEPARATOR)
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_remote_flips_backslashes() {
        assert_eq!(to_remote(r"sub\dir\file.txt"), "sub/dir/file.txt");
        assert_eq!(to_remote("already/fine"), "already/fine");
        assert_eq!(to_remote(""), "");
    }

    #[test]
    fn test_to_remote_is_idempotent_and_clean() {
        let samples = [
            r"C:\Users\me\site",
            r"mixed\and/forward",
            "plain.txt",
            r"\\server\share\x",
            "",
        ];
        for sample in samples {
            let once = to_remote(sample);
            assert!(!once.contains('\\'), "{once} still has a backslash");
            assert_eq!(to_remote(&once), once);
        }
    }

    #[test]
    fn test_relative_to_nested_file() {
        let root = Path::new("/home/me/site");
        let full = Path::new("/home/me/site/sub/b.txt");
        assert_eq!(relative_to(root, full).as_deref(), Some("sub/b.txt"));
    }

    #[test]
    fn test_relative_to_top_level_file() {
        let root = Path::new("/home/me/site");
        let full = Path::new("/home/me/site/a.txt");
        assert_eq!(relative_to(root, full).as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_relative_to_root_itself_is_none() {
        let root = Path::new("/home/me/site");
        assert_eq!(relative_to(root, root), None);
        assert_eq!(relative_to(root, Path::new("/home/me/site/")), None);
    }

    #[test]
    fn test_relative_to_outside_root_is_none() {
        let root = Path::new("/home/me/site");
        assert_eq!(relative_to(root, Path::new("/home/me/other/a.txt")), None);
        assert_eq!(relative_to(root, Path::new("/home/me/site2/a.txt")), None);
    }

    #[test]
    fn test_relative_never_starts_with_separator_and_rejoins() {
        let root = Path::new("/data/root");
        let files = ["a.txt", "sub/b.txt", "x/y/z/deep.bin", ".hidden/cfg"];
        for file in files {
            let full = root.join(file);
            let rel = relative_to(root, &full).expect("file is under root");
            assert!(!rel.starts_with('/'));
            assert_eq!(local_join(root, &rel), full);
        }
    }

    #[test]
    fn test_relative_to_relative_roots() {
        let root = Path::new("./site");
        let full = Path::new("./site/css/main.css");
        assert_eq!(relative_to(root, full).as_deref(), Some("css/main.css"));
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("/var/www", "a.txt"), "/var/www/a.txt");
        assert_eq!(join_remote("/var/www/", "sub/b.txt"), "/var/www/sub/b.txt");
        assert_eq!(join_remote("/", "a.txt"), "/a.txt");
        assert_eq!(join_remote("www", "/a.txt"), "www/a.txt");
        assert_eq!(join_remote("", "a.txt"), "a.txt");
        assert_eq!(join_remote("/var/www", ""), "/var/www");
    }

    #[test]
    fn test_remote_parent() {
        assert_eq!(remote_parent("a.txt"), "");
        assert_eq!(remote_parent("sub/b.txt"), "sub");
        assert_eq!(remote_parent("x/y/z.txt"), "x/y");
    }

    #[test]
    fn test_remote_file_name() {
        assert_eq!(remote_file_name("/var/www/a.txt"), "a.txt");
        assert_eq!(remote_file_name("a.txt"), "a.txt");
        assert_eq!(remote_file_name("/var/www/sub/"), "sub");
    }

    #[test]
    fn test_local_join_skips_empty_parts() {
        let base = Path::new("/backups");
        assert_eq!(local_join(base, ""), PathBuf::from("/backups"));
        assert_eq!(local_join(base, "sub"), PathBuf::from("/backups/sub"));
        assert_eq!(local_join(base, "x//y"), PathBuf::from("/backups/x/y"));
    }
}
