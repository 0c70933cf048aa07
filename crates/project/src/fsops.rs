//! Context actions offered by the workspace tree: create, delete, rename.
//! 工作區樹提供的快捷動作：建立、刪除、重新命名。
//!
//! Each action is a direct filesystem call; failures bubble up as plain
//! `io::Error` values for the shell to surface as blocking dialogs.
//! 每個動作都是直接的檔案系統呼叫，失敗以 `io::Error` 回傳，由外殼顯示對話框。

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Creates an empty file; refuses to clobber an existing one.
/// 建立空白檔案；若檔案已存在則拒絕覆寫。
pub fn create_file(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(|_| ())
}

/// Creates a new folder.
/// 建立新資料夾。
pub fn create_folder(path: &Path) -> io::Result<()> {
    fs::create_dir(path)
}

/// Removes a file, or a folder with all of its contents.
/// 移除檔案，或遞迴移除整個資料夾。
pub fn remove(path: &Path) -> io::Result<()> {
    if fs::metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Renames a file or folder.
/// 重新命名檔案或資料夾。
pub fn rename(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_file_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");

        create_file(&path).unwrap();
        assert!(path.exists());

        let err = create_file(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn remove_handles_files_and_folders() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.txt");
        let folder = dir.path().join("nested");

        fs::write(&file, "x").unwrap();
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("inner.txt"), "y").unwrap();

        remove(&file).unwrap();
        remove(&folder).unwrap();
        assert!(!file.exists());
        assert!(!folder.exists());
    }

    #[test]
    fn remove_missing_path_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(remove(&missing).is_err());
    }

    #[test]
    fn rename_moves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("old.txt");
        let to = dir.path().join("new.txt");
        fs::write(&from, "contents").unwrap();

        rename(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "contents");
    }

    #[test]
    fn create_folder_then_rename() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("alpha");
        let renamed = dir.path().join("beta");

        create_folder(&folder).unwrap();
        rename(&folder, &renamed).unwrap();
        assert!(renamed.is_dir());
    }
}
