//! Filesystem path completion for interactive argument entry.
//!
//! Used by the interactive shell when building commands; candidates never
//! cross the wire. Directory candidates carry a trailing separator so the
//! user can keep typing into them.

use std::env;
use std::io;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Produce completion candidates for a partial path.
///
/// Three cases, depending on what the partial string names:
/// - an existing directory: all its non-hidden entries, directories
///   suffixed with a separator;
/// - an existing file: every sibling whose name starts with that file's
///   basename (hidden siblings included, names returned bare);
/// - nothing existing: entries of the deepest existing ancestor directory
///   whose names start with the next path component to complete,
///   directories suffixed with a separator.
///
/// # Errors
///
/// Returns the underlying IO error when a directory listing fails.
pub fn complete(line: &str) -> io::Result<Vec<String>> {
    let path = absolute(Path::new(line))?;

    if path.is_dir() {
        return list_dir(&path, "", true, true);
    }

    if path.is_file() {
        let (parent, prefix) = split_basename(&path);
        // Sibling entries sharing the basename prefix; the file itself is
        // its own candidate.
        return list_dir(&parent, &prefix, false, false);
    }

    let (ancestor, prefix) = deepest_existing_ancestor(&path);
    list_dir(&ancestor, &prefix, false, true)
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn split_basename(path: &Path) -> (PathBuf, String) {
    let parent = path
        .parent()
        .map_or_else(|| PathBuf::from(MAIN_SEPARATOR.to_string()), Path::to_path_buf);
    let basename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (parent, basename)
}

/// Walk up the partial path to the deepest directory that exists, and
/// return it with the first missing component as the completion prefix.
fn deepest_existing_ancestor(path: &Path) -> (PathBuf, String) {
    let mut ancestor = path.to_path_buf();
    while !ancestor.is_dir() {
        if !ancestor.pop() {
            break;
        }
    }
    let prefix = path
        .strip_prefix(&ancestor)
        .ok()
        .and_then(|rest| rest.components().next())
        .and_then(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .unwrap_or_default();
    (ancestor, prefix)
}

fn list_dir(
    dir: &Path,
    prefix: &str,
    skip_hidden: bool,
    suffix_dirs: bool,
) -> io::Result<Vec<String>> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if skip_hidden && name.starts_with('.') {
            continue;
        }
        if !name.starts_with(prefix) {
            continue;
        }
        let full = dir.join(&name);
        if suffix_dirs && full.is_dir() {
            candidates.push(format!("{}{}", full.display(), MAIN_SEPARATOR));
        } else {
            candidates.push(full.display().to_string());
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = tempfile::Builder::new()
            .prefix("squall-complete-")
            .tempdir()
            .expect("tempdir");
        fs::write(dir.path().join("a.txt"), b"torrent").expect("a.txt");
        fs::write(dir.path().join(".hidden"), b"dotfile").expect(".hidden");
        fs::create_dir(dir.path().join("sub")).expect("sub");
        dir
    }

    fn candidate_set(candidates: Vec<String>) -> BTreeSet<String> {
        candidates.into_iter().collect()
    }

    #[test]
    fn existing_directory_lists_non_hidden_entries() {
        let dir = fixture();
        let root = dir.path().display().to_string();
        let candidates =
            candidate_set(complete(&root).expect("complete"));
        let expected: BTreeSet<String> = [
            format!("{root}{MAIN_SEPARATOR}a.txt"),
            format!("{root}{MAIN_SEPARATOR}sub{MAIN_SEPARATOR}"),
        ]
        .into();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn nonexistent_path_completes_against_parent_entries() {
        let dir = fixture();
        let partial = dir.path().join("a").display().to_string();
        let candidates = candidate_set(complete(&partial).expect("complete"));
        let expected: BTreeSet<String> =
            [format!("{}{MAIN_SEPARATOR}a.txt", dir.path().display())].into();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn nonexistent_directory_prefix_matches_with_separator_suffix() {
        let dir = fixture();
        let partial = dir.path().join("s").display().to_string();
        let candidates = candidate_set(complete(&partial).expect("complete"));
        let expected: BTreeSet<String> = [format!(
            "{}{MAIN_SEPARATOR}sub{MAIN_SEPARATOR}",
            dir.path().display()
        )]
        .into();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn existing_file_completes_against_sibling_prefixes() {
        let dir = fixture();
        fs::write(dir.path().join("a.txt.bak"), b"backup").expect("a.txt.bak");
        fs::create_dir(dir.path().join("a.txt.d")).expect("a.txt.d");

        // Directory siblings come back bare here, unlike the directory and
        // ancestor cases.
        let partial = dir.path().join("a.txt").display().to_string();
        let candidates = candidate_set(complete(&partial).expect("complete"));
        let expected: BTreeSet<String> = [
            format!("{}{MAIN_SEPARATOR}a.txt", dir.path().display()),
            format!("{}{MAIN_SEPARATOR}a.txt.bak", dir.path().display()),
            format!("{}{MAIN_SEPARATOR}a.txt.d", dir.path().display()),
        ]
        .into();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn hidden_entries_are_only_excluded_when_listing_a_directory() {
        let dir = fixture();
        let partial = dir.path().join(".hid").display().to_string();
        let candidates = candidate_set(complete(&partial).expect("complete"));
        let expected: BTreeSet<String> =
            [format!("{}{MAIN_SEPARATOR}.hidden", dir.path().display())].into();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn missing_intermediate_directories_fall_back_to_deepest_ancestor() {
        let dir = fixture();
        let partial = dir
            .path()
            .join("sub")
            .join("missing")
            .join("deeper")
            .display()
            .to_string();
        let candidates = complete(&partial).expect("complete");
        // `sub` is empty, and "missing" matches nothing inside it.
        assert!(candidates.is_empty());
    }
}
