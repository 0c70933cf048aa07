use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::language::Language;

/// 尚未綁定檔案的分頁顯示名稱。 / Display name used for tabs without a bound file.
pub const UNTITLED_NAME: &str = "Untitled";

/// 文件載入或儲存時可能發生的錯誤。 / Errors that can occur while loading or saving a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("document has no associated path")]
    Unbound,
    #[error("file is not valid UTF-8")]
    InvalidUtf8,
}

/// 代表單一編輯分頁背後的文字文件。 / In-memory text document backing a single editor tab.
#[derive(Debug, Clone)]
pub struct Document {
    path: Option<PathBuf>,
    contents: String,
    language: Language,
    is_modified: bool,
}

impl Document {
    /// 建立一個空內容且尚未綁定檔案的文件。 / Creates an unbound document with empty contents.
    pub fn new() -> Self {
        Self {
            path: None,
            contents: String::new(),
            language: Language::Plain,
            is_modified: false,
        }
    }

    /// 以指定文字建立未綁定文件。 / Creates an unbound document with the given contents.
    pub fn with_contents(text: impl Into<String>) -> Self {
        Self {
            path: None,
            contents: text.into(),
            language: Language::Plain,
            is_modified: false,
        }
    }

    /// 從磁碟載入 UTF-8 文件；副檔名決定語言模式。 / Loads a UTF-8 document from disk; the extension selects the language mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path_ref = path.as_ref();
        let bytes = fs::read(path_ref)?;
        // 若開頭有 UTF-8 BOM 則去除。 / Strip a leading UTF-8 BOM when present.
        let payload = bytes
            .strip_prefix(b"\xEF\xBB\xBF".as_slice())
            .unwrap_or(&bytes);
        let contents =
            String::from_utf8(payload.to_vec()).map_err(|_| DocumentError::InvalidUtf8)?;

        Ok(Self {
            path: Some(path_ref.to_path_buf()),
            language: Language::from_path(path_ref),
            contents,
            is_modified: false,
        })
    }

    /// 取得文件所綁定的檔案路徑（若存在）。 / Returns the bound file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 回傳分頁標籤使用的顯示名稱。 / Returns the display name shown on the tab label.
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNTITLED_NAME.to_string())
    }

    /// 取得目前的語言模式。 / Returns the current language mode.
    pub fn language(&self) -> Language {
        self.language
    }

    /// 覆寫語言模式（僅影響語法標示）。 / Overrides the language mode (highlighting only).
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// 取得目前文件內容。 / Returns the current document contents.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// 以新文字取代內容並標記文件為已修改。 / Replaces the contents, marking the document as modified.
    pub fn set_contents(&mut self, text: impl Into<String>) {
        self.contents = text.into();
        self.is_modified = true;
    }

    /// 判斷文件是否仍有未儲存變更。 / Returns whether the document has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// 將文件標記為已修改。 / Marks the document as having unsaved changes.
    pub fn mark_modified(&mut self) {
        self.is_modified = true;
    }

    /// 將文件儲存至已綁定的路徑；未綁定時回傳 [`DocumentError::Unbound`]。 / Saves to the bound path; unbound documents report [`DocumentError::Unbound`].
    pub fn save(&mut self) -> Result<PathBuf, DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::Unbound)?;
        self.save_as(path.clone())?;
        Ok(path)
    }

    /// 另存為新路徑：重新綁定、依新副檔名更新語言模式。 / Saves to a new path, rebinding and refreshing the language mode.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path_ref = path.as_ref();
        let payload = normalize_crlf(&self.contents);

        // 先寫入暫存檔再重新命名，寫入失敗時原檔維持不變。 / Write through a temporary file plus rename so a failed save leaves the target untouched.
        let tmp_path = path_ref.with_extension("tmp_codepp");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(payload.as_bytes())?;
            tmp_file.sync_all()?;
        }
        fs::rename(&tmp_path, path_ref)?;

        self.path = Some(path_ref.to_path_buf());
        self.language = Language::from_path(path_ref);
        self.is_modified = false;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// 將行尾統一為 CRLF：先把 CRLF 收斂成 LF，再把 LF 展開成 CRLF。 / Normalises line endings to CRLF: collapse CRLF to LF, then expand every LF to CRLF.
///
/// 此轉換具冪等性。 / The transformation is idempotent.
pub fn normalize_crlf(input: &str) -> String {
    let collapsed = input.replace("\r\n", "\n");
    collapsed.replace('\n', "\r\n")
}
