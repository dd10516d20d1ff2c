//! Path metadata.

/// Existence, size and kind of a stored path.
///
/// Produced fresh by every `get_file_info` call; drivers do not cache it.
/// When `file_exists` is false, `size` is zero and `file_is_folder` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileInfo {
    /// Size in bytes. Zero for folders and missing paths.
    pub size: u64,
    /// Whether anything exists at the path.
    pub file_exists: bool,
    /// Whether the path is a folder (a directory or an object prefix).
    pub file_is_folder: bool,
}

impl FileInfo {
    /// Info for a path that does not exist.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            size: 0,
            file_exists: false,
            file_is_folder: false,
        }
    }

    /// Info for an existing file of `size` bytes.
    #[must_use]
    pub const fn file(size: u64) -> Self {
        Self {
            size,
            file_exists: true,
            file_is_folder: false,
        }
    }

    /// Info for an existing folder.
    #[must_use]
    pub const fn folder() -> Self {
        Self {
            size: 0,
            file_exists: true,
            file_is_folder: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_has_no_size_and_is_not_folder() {
        let info = FileInfo::missing();
        assert!(!info.file_exists);
        assert!(!info.file_is_folder);
        assert_eq!(info.size, 0);
        assert_eq!(info, FileInfo::default());
    }

    #[test]
    fn file_and_folder_exist() {
        assert!(FileInfo::file(11).file_exists);
        assert_eq!(FileInfo::file(11).size, 11);
        assert!(FileInfo::folder().file_is_folder);
    }
}
