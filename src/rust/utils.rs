use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Directory a file at `path` lives in; `.` for a bare file name.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Creates a synced temporary file holding `bytes` next to `path`.
///
/// Nothing at `path` changes until the returned file is persisted.
pub(crate) fn stage(path: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let dir = parent_dir(path);
    fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Replaces `path` with `bytes` in one rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    stage(path, bytes)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Replaces two files as a unit.
///
/// Both files are staged before either is renamed. If the second rename
/// fails, the first file is put back the way it was.
pub(crate) fn write_pair_atomic(first: (&Path, &[u8]), second: (&Path, &[u8])) -> io::Result<()> {
    let (first_path, first_bytes) = first;
    let (second_path, second_bytes) = second;

    let first_tmp = stage(first_path, first_bytes)?;
    let second_tmp = stage(second_path, second_bytes)?;

    let previous = match fs::read(first_path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    first_tmp.persist(first_path).map_err(|e| e.error)?;
    if let Err(e) = second_tmp.persist(second_path) {
        log::error!("Failed to replace {:?}, restoring {:?}", second_path, first_path);
        match previous {
            Some(bytes) => write_atomic(first_path, &bytes)?,
            None => fs::remove_file(first_path)?,
        }
        return Err(e.error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_pair_restores_first_file_when_second_is_blocked() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        fs::write(&first, b"old").unwrap();
        fs::create_dir(&second).unwrap();

        assert!(write_pair_atomic((first.as_path(), &b"new"[..]), (second.as_path(), &b"new"[..])).is_err());
        assert_eq!(fs::read(&first).unwrap(), b"old");
        assert!(second.is_dir());
    }

    #[test]
    fn test_pair_removes_new_first_file_when_second_is_blocked() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        fs::create_dir(&second).unwrap();

        assert!(write_pair_atomic((first.as_path(), &b"new"[..]), (second.as_path(), &b"new"[..])).is_err());
        assert!(!first.exists());
        // only the blocking directory remains
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("model.bin")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("models/model.bin")), PathBuf::from("models"));
    }
}
