//! Custom assertions for deployed trees

use std::path::Path;

/// Permission bits of `path` (0 where permissions are not modelled)
pub fn mode_of<P: AsRef<Path>>(path: P) -> u32 {
    let metadata = std::fs::metadata(path.as_ref())
        .unwrap_or_else(|e| panic!("Failed to stat {}: {e}", path.as_ref().display()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o777
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        0
    }
}

pub fn assert_file_exists<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    assert!(path.is_file(), "File does not exist: {}", path.display());
}

pub fn assert_not_exists<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    assert!(!path.exists(), "Path should not exist: {}", path.display());
}

pub fn assert_is_directory<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    assert!(path.is_dir(), "Path is not a directory: {}", path.display());
}

pub fn assert_file_content<P: AsRef<Path>>(path: P, expected: &str) {
    let path = path.as_ref();
    let actual = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    assert_eq!(actual, expected, "File content mismatch in {}", path.display());
}

#[cfg(unix)]
pub fn assert_mode<P: AsRef<Path>>(path: P, expected: u32) {
    let path = path.as_ref();
    let actual = mode_of(path);
    assert_eq!(
        actual,
        expected,
        "Mode mismatch in {}: {actual:o} != {expected:o}",
        path.display()
    );
}

#[cfg(unix)]
pub fn assert_owner<P: AsRef<Path>>(path: P, uid: u32) {
    use std::os::unix::fs::MetadataExt;

    let path = path.as_ref();
    let metadata = std::fs::metadata(path).expect("Failed to get metadata");
    assert_eq!(metadata.uid(), uid, "Owner mismatch in {}", path.display());
}
