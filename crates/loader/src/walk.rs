use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Breadth-first walk calling `callback` for every regular file under `path`.
///
/// Symlinks are never followed and unreadable entries are skipped. Entries of
/// a directory are visited in file-name order, so the walk is deterministic.
pub fn visit<F, C, E>(path: &Path, excludes: &F, callback: &mut C) -> Result<(), E>
where
    F: Fn(&Path) -> bool,
    C: FnMut(&Path) -> Result<(), E>,
    E: From<io::Error>,
{
    let mut pending: VecDeque<PathBuf> = VecDeque::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    pending.push_back(path.to_path_buf());

    while let Some(current) = pending.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if excludes(&current) {
            debug!(path = %current.display(), "Path excluded");
            continue;
        }
        let Some(metadata) = skip_denied(&current, fs::symlink_metadata(&current))? else {
            continue;
        };
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            debug!(path = %current.display(), "Symlink skipped");
            continue;
        }
        if file_type.is_file() {
            callback(&current)?;
        } else if file_type.is_dir() {
            debug!(path = %current.display(), "Entering directory");
            let Some(entries) = skip_denied(&current, fs::read_dir(&current))? else {
                continue;
            };
            let mut children = Vec::new();
            for entry in entries {
                if let Some(entry) = skip_denied(&current, entry)? {
                    children.push(entry.path());
                }
            }
            children.sort();
            pending.extend(children);
        }
    }

    Ok(())
}

fn skip_denied<T>(path: &Path, result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            debug!(path = %path.display(), "Permission denied");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::visit;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn collect(base: &Path) -> Vec<PathBuf> {
        let mut seen = Vec::new();
        let mut cb = |p: &Path| -> io::Result<()> {
            seen.push(p.strip_prefix(base).unwrap().to_path_buf());
            Ok(())
        };
        visit(base, &|_| false, &mut cb).unwrap();
        seen
    }

    #[test]
    fn visits_nested_directories_in_name_order() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("b/c")).unwrap();
        fs::write(base.join("z.yaml"), b"").unwrap();
        fs::write(base.join("a.yaml"), b"").unwrap();
        fs::write(base.join("b/file.yaml"), b"").unwrap();
        fs::write(base.join("b/c/leaf.yaml"), b"").unwrap();

        assert_eq!(
            collect(base),
            vec![
                PathBuf::from("a.yaml"),
                PathBuf::from("z.yaml"),
                PathBuf::from("b/file.yaml"),
                PathBuf::from("b/c/leaf.yaml"),
            ]
        );
    }

    #[test]
    fn excluded_directories_are_not_entered() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join(".git")).unwrap();
        fs::write(base.join(".git/config.yaml"), b"").unwrap();
        fs::write(base.join("rules.yaml"), b"").unwrap();

        let mut seen = Vec::new();
        let excludes = |p: &Path| p.file_name().is_some_and(|n| n == ".git");
        let mut cb = |p: &Path| -> io::Result<()> {
            seen.push(p.to_path_buf());
            Ok(())
        };
        visit(base, &excludes, &mut cb).unwrap();
        assert_eq!(seen, vec![base.join("rules.yaml")]);
    }

    #[cfg(unix)]
    #[test]
    fn terminates_on_symlink_loop() {
        use std::os::unix::fs as unix_fs;

        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("a")).unwrap();
        fs::write(base.join("root.txt"), b"").unwrap();
        fs::write(base.join("a/file.txt"), b"").unwrap();
        unix_fs::symlink(base, base.join("a/loop")).unwrap();

        assert_eq!(
            collect(base),
            vec![PathBuf::from("root.txt"), PathBuf::from("a/file.txt")]
        );
    }
}
