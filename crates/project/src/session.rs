use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use codepp_core::{probe_path, Document, FileStatus, Language};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier assigned to each editor session for the process lifetime.
/// 編輯工作階段在程序存續期間的唯一識別碼。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors reported by the tab/session manager.
/// 分頁管理可能回報的錯誤。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("tab index {index} is out of range for {len} open tabs")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One open document: buffer, optional file binding, language mode, and the
/// detected file status shown on the status surface.
/// 單一開啟文件：緩衝內容、可選的檔案綁定、語言模式與偵測狀態。
#[derive(Debug, Clone)]
pub struct EditorSession {
    id: SessionId,
    document: Document,
    status: FileStatus,
}

impl EditorSession {
    fn new(document: Document) -> Self {
        let status = match document.path() {
            Some(path) => probe_path(path),
            None => FileStatus::fallback(),
        };
        Self {
            id: SessionId::next(),
            document,
            status,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Tab label derived from the bound path, or the placeholder when unbound.
    /// 由綁定路徑推導的分頁標籤；未綁定時為預設名稱。
    pub fn display_name(&self) -> String {
        self.document.display_name()
    }

    pub fn language(&self) -> Language {
        self.document.language()
    }

    pub fn is_modified(&self) -> bool {
        self.document.is_modified()
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    /// Re-probes the bound file; unbound sessions fall back to the defaults.
    /// 重新偵測綁定檔案；未綁定時回到預設狀態。
    pub fn refresh_status(&mut self) -> FileStatus {
        self.status = match self.document.path() {
            Some(path) => probe_path(path),
            None => FileStatus::fallback(),
        };
        self.status
    }
}

/// Ordered collection of editor sessions plus the focused index.
/// 依序排列的工作階段集合與目前聚焦的索引。
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Vec<EditorSession>,
    current: Option<usize>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            current: None,
        }
    }

    /// Creates a session for the given document, focuses it, and returns its id.
    /// 以指定文件建立工作階段、設為焦點並回傳識別碼。
    pub fn open_document(&mut self, document: Document) -> SessionId {
        let session = EditorSession::new(document);
        let id = session.id();
        self.sessions.push(session);
        self.current = Some(self.sessions.len() - 1);
        id
    }

    /// Creates an unbound session with the given text and language mode.
    /// 建立未綁定檔案的新工作階段。
    pub fn new_session(&mut self, text: impl Into<String>, language: Language) -> SessionId {
        let mut document = Document::with_contents(text);
        document.set_language(language);
        self.open_document(document)
    }

    /// Removes the session at `index`. Out-of-range indices are reported, not
    /// panicked on, and leave the collection untouched.
    /// 移除指定索引的工作階段；越界時回報錯誤且不更動集合。
    pub fn close_session(&mut self, index: usize) -> Result<EditorSession, SessionError> {
        if index >= self.sessions.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.sessions.len(),
            });
        }
        let removed = self.sessions.remove(index);
        self.current = if self.sessions.is_empty() {
            None
        } else {
            // 移除後焦點停留在最接近的有效分頁。 / Keep focus on the nearest valid tab after removal.
            let current = self.current.unwrap_or(0);
            let adjusted = if index < current { current - 1 } else { current };
            Some(adjusted.min(self.sessions.len() - 1))
        };
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Focuses the session at `index`.
    /// 將焦點移至指定索引。
    pub fn set_current(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.sessions.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.sessions.len(),
            });
        }
        self.current = Some(index);
        Ok(())
    }

    pub fn current_session(&self) -> Option<&EditorSession> {
        self.current.and_then(|index| self.sessions.get(index))
    }

    pub fn current_session_mut(&mut self) -> Option<&mut EditorSession> {
        let index = self.current?;
        self.sessions.get_mut(index)
    }

    pub fn get(&self, index: usize) -> Option<&EditorSession> {
        self.sessions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut EditorSession> {
        self.sessions.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EditorSession> {
        self.sessions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EditorSession> {
        self.sessions.iter_mut()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|session| session.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let mut manager = SessionManager::new();
        let a = manager.new_session("", Language::Plain);
        let b = manager.new_session("", Language::Plain);
        assert_ne!(a, b);
    }

    #[test]
    fn live_count_tracks_creations_minus_closures() {
        let mut manager = SessionManager::new();
        for _ in 0..5 {
            manager.new_session("", Language::Plain);
        }
        manager.close_session(0).unwrap();
        manager.close_session(2).unwrap();
        assert_eq!(manager.len(), 3);

        // current always references a valid session while non-empty
        // 集合非空時焦點必定有效
        let current = manager.current_index().unwrap();
        assert!(manager.get(current).is_some());

        for _ in 0..3 {
            let index = manager.current_index().unwrap();
            manager.close_session(index).unwrap();
        }
        assert!(manager.is_empty());
        assert_eq!(manager.current_index(), None);
    }

    #[test]
    fn new_session_becomes_current() {
        let mut manager = SessionManager::new();
        manager.new_session("one", Language::Plain);
        let id = manager.new_session("two", Language::Python);
        let current = manager.current_session().unwrap();
        assert_eq!(current.id(), id);
        assert_eq!(current.language(), Language::Python);
        assert_eq!(current.document().contents(), "two");
    }

    #[test]
    fn close_out_of_range_reports_error_without_changes() {
        let mut manager = SessionManager::new();
        manager.new_session("", Language::Plain);
        let err = manager.close_session(3).unwrap_err();
        assert_eq!(err, SessionError::IndexOutOfRange { index: 3, len: 1 });
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.current_index(), Some(0));
    }

    #[test]
    fn closing_before_current_shifts_focus_index() {
        let mut manager = SessionManager::new();
        manager.new_session("a", Language::Plain);
        manager.new_session("b", Language::Plain);
        let c = manager.new_session("c", Language::Plain);
        assert_eq!(manager.current_index(), Some(2));

        manager.close_session(0).unwrap();
        assert_eq!(manager.current_index(), Some(1));
        assert_eq!(manager.current_session().unwrap().id(), c);
    }

    #[test]
    fn closing_current_focuses_nearest_tab() {
        let mut manager = SessionManager::new();
        manager.new_session("a", Language::Plain);
        manager.new_session("b", Language::Plain);
        manager.set_current(0).unwrap();
        manager.close_session(0).unwrap();
        assert_eq!(manager.current_index(), Some(0));
        assert_eq!(manager.current_session().unwrap().document().contents(), "b");
    }

    #[test]
    fn unbound_session_reports_placeholder_and_fallback_status() {
        let mut manager = SessionManager::new();
        manager.new_session("", Language::Plain);
        let session = manager.current_session().unwrap();
        assert_eq!(session.display_name(), "Untitled");
        assert_eq!(session.status(), codepp_core::FileStatus::fallback());
    }

    #[test]
    fn refresh_status_probes_bound_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unix.txt");
        std::fs::write(&path, "a\nb\n").unwrap();

        let mut manager = SessionManager::new();
        manager.open_document(Document::open(&path).unwrap());
        let session = manager.current_session_mut().unwrap();
        let status = session.refresh_status();
        assert_eq!(status.line_ending, codepp_core::LineEnding::Lf);
    }
}
