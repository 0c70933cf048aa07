use std::path::{Path, PathBuf};

use thiserror::Error;

use codepp_core::DocumentError;

use crate::session::{EditorSession, SessionId, SessionManager};

/// Three-way decision offered for a modified session losing its folder.
/// 資料夾關閉時針對已修改工作階段的三向決定。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    Discard,
    Cancel,
}

/// Supplies the save-or-discard decision during reconciliation, normally by
/// prompting the user through the dialog surface.
/// 在調和流程中提供儲存或捨棄的決定，通常透過對話框詢問使用者。
pub trait SaveDecider {
    fn decide(&mut self, session: &EditorSession) -> SaveChoice;
}

impl<F> SaveDecider for F
where
    F: FnMut(&EditorSession) -> SaveChoice,
{
    fn decide(&mut self, session: &EditorSession) -> SaveChoice {
        self(session)
    }
}

/// States of the close-reconciliation sweep.
/// 關閉調和流程的狀態。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    Scanning,
    Prompting,
    Aborted,
    Completed,
}

/// Result of a reconciliation sweep. `closed` lists the sessions removed
/// before the sweep finished or was cancelled.
/// 調和流程的結果；`closed` 列出流程結束或取消前已移除的工作階段。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Completed { closed: Vec<SessionId> },
    Aborted { closed: Vec<SessionId> },
}

impl ReconcileOutcome {
    pub fn closed(&self) -> &[SessionId] {
        match self {
            ReconcileOutcome::Completed { closed } => closed,
            ReconcileOutcome::Aborted { closed } => closed,
        }
    }

    pub fn was_aborted(&self) -> bool {
        matches!(self, ReconcileOutcome::Aborted { .. })
    }
}

/// Errors raised while switching or closing the workspace folder.
/// 切換或關閉工作區資料夾時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to save {name}: {source}")]
    Save {
        name: String,
        #[source]
        source: DocumentError,
    },
}

/// The currently open root folder and the hidden-entry filter flag.
/// 目前開啟的根資料夾與隱藏項目的篩選旗標。
#[derive(Debug, Default)]
pub struct Workspace {
    root: Option<PathBuf>,
    show_hidden: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            root: None,
            show_hidden: false,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.root.is_some()
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    /// Flips the hidden-entry filter. The flag change alone does not refresh
    /// any projection; callers rebuild it explicitly with [`crate::tree::scan`].
    /// 切換隱藏項目篩選；旗標改變不會自動更新樹狀投影，呼叫端需自行重建。
    pub fn toggle_hidden(&mut self) -> bool {
        self.show_hidden = !self.show_hidden;
        self.show_hidden
    }

    /// Returns whether `path` falls under the current root.
    /// 判斷路徑是否位於目前根目錄之下。
    pub fn contains(&self, path: &Path) -> bool {
        self.root.as_deref().is_some_and(|root| path.starts_with(root))
    }

    /// Adopts `path` as the workspace root. When a different folder was open,
    /// its sessions are reconciled first; a cancelled sweep keeps the old root.
    /// 採用新的根資料夾；若先前已開啟其他資料夾則先進行調和，取消時維持原根目錄。
    pub fn open_folder(
        &mut self,
        path: impl Into<PathBuf>,
        sessions: &mut SessionManager,
        decider: &mut dyn SaveDecider,
    ) -> Result<ReconcileOutcome, WorkspaceError> {
        let path = path.into();
        if let Some(old_root) = self.root.clone() {
            if old_root != path {
                let outcome = reconcile(&old_root, sessions, decider)?;
                if outcome.was_aborted() {
                    return Ok(outcome);
                }
                self.root = Some(path);
                return Ok(outcome);
            }
        }
        self.root = Some(path);
        Ok(ReconcileOutcome::Completed { closed: Vec::new() })
    }

    /// Reconciles sessions under the current root, then clears it. Cancelling
    /// the sweep leaves the folder open.
    /// 先調和根目錄下的工作階段再關閉資料夾；取消時資料夾維持開啟。
    pub fn close_folder(
        &mut self,
        sessions: &mut SessionManager,
        decider: &mut dyn SaveDecider,
    ) -> Result<ReconcileOutcome, WorkspaceError> {
        let Some(root) = self.root.clone() else {
            return Ok(ReconcileOutcome::Completed { closed: Vec::new() });
        };
        let outcome = reconcile(&root, sessions, decider)?;
        if !outcome.was_aborted() {
            self.root = None;
        }
        Ok(outcome)
    }
}

/// Runs the close-reconciliation sweep over every session bound under `root`,
/// in reverse tab order so removals keep the remaining indices stable.
/// 以反向分頁順序對根目錄下的工作階段執行關閉調和，移除時索引保持穩定。
fn reconcile(
    root: &Path,
    sessions: &mut SessionManager,
    decider: &mut dyn SaveDecider,
) -> Result<ReconcileOutcome, WorkspaceError> {
    let mut closed = Vec::new();
    let mut state = ReconcileState::Scanning;
    let mut index = sessions.len();

    loop {
        match state {
            ReconcileState::Scanning => {
                if index == 0 {
                    state = ReconcileState::Completed;
                    continue;
                }
                index -= 1;
                let Some(session) = sessions.get(index) else {
                    continue;
                };
                let bound_under = session
                    .document()
                    .path()
                    .is_some_and(|path| path.starts_with(root));
                if !bound_under {
                    continue;
                }
                if session.is_modified() {
                    state = ReconcileState::Prompting;
                } else if let Ok(removed) = sessions.close_session(index) {
                    closed.push(removed.id());
                }
            }
            ReconcileState::Prompting => {
                let Some(session) = sessions.get(index) else {
                    state = ReconcileState::Scanning;
                    continue;
                };
                match decider.decide(session) {
                    SaveChoice::Save => {
                        let name = session.display_name();
                        if let Some(session) = sessions.get_mut(index) {
                            session
                                .document_mut()
                                .save()
                                .map_err(|source| WorkspaceError::Save { name, source })?;
                        }
                        if let Ok(removed) = sessions.close_session(index) {
                            closed.push(removed.id());
                        }
                        state = ReconcileState::Scanning;
                    }
                    SaveChoice::Discard => {
                        if let Ok(removed) = sessions.close_session(index) {
                            closed.push(removed.id());
                        }
                        state = ReconcileState::Scanning;
                    }
                    SaveChoice::Cancel => {
                        state = ReconcileState::Aborted;
                    }
                }
            }
            ReconcileState::Aborted => return Ok(ReconcileOutcome::Aborted { closed }),
            ReconcileState::Completed => return Ok(ReconcileOutcome::Completed { closed }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepp_core::{Document, Language};
    use std::fs;
    use std::path::Path;

    fn open_at(
        sessions: &mut SessionManager,
        path: &Path,
        contents: &str,
        modified: bool,
    ) -> SessionId {
        fs::write(path, contents).unwrap();
        let id = sessions.open_document(Document::open(path).unwrap());
        if modified {
            sessions
                .current_session_mut()
                .unwrap()
                .document_mut()
                .set_contents(format!("{contents} edited"));
        }
        id
    }

    #[test]
    fn cancel_aborts_whole_sweep_and_keeps_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let mut sessions = SessionManager::new();

        // A (modified), B (unmodified), C (modified) in tab order.
        // A（已修改）、B（未修改）、C（已修改）依分頁順序排列。
        open_at(&mut sessions, &root.join("a.txt"), "a", true);
        open_at(&mut sessions, &root.join("b.txt"), "b", false);
        open_at(&mut sessions, &root.join("c.txt"), "c", true);

        let mut workspace = Workspace::new();
        workspace
            .open_folder(&root, &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Discard
            })
            .unwrap();
        assert_eq!(workspace.root(), Some(root.as_path()));

        let mut prompts = Vec::new();
        let outcome = workspace
            .close_folder(&mut sessions, &mut |session: &EditorSession| {
                prompts.push(session.display_name());
                SaveChoice::Cancel
            })
            .unwrap();

        // Reverse order means C is prompted first; Cancel stops everything.
        // 反向掃描先詢問 C；取消後整個流程立即中止。
        assert_eq!(prompts, vec!["c.txt"]);
        assert!(outcome.was_aborted());
        assert!(outcome.closed().is_empty());
        assert_eq!(sessions.len(), 3);
        assert!(workspace.is_open());
    }

    #[test]
    fn completed_sweep_closes_bound_sessions_and_clears_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let outside = tempfile::tempdir().unwrap();
        let mut sessions = SessionManager::new();

        open_at(&mut sessions, &root.join("in.txt"), "in", true);
        let kept = open_at(&mut sessions, &outside.path().join("out.txt"), "out", true);

        let mut workspace = Workspace::new();
        workspace
            .open_folder(&root, &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Discard
            })
            .unwrap();

        let outcome = workspace
            .close_folder(&mut sessions, &mut |_: &EditorSession| SaveChoice::Discard)
            .unwrap();

        assert!(!outcome.was_aborted());
        assert_eq!(outcome.closed().len(), 1);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.get(0).unwrap().id(), kept);
        assert!(!workspace.is_open());
    }

    #[test]
    fn save_choice_persists_before_closing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let file = root.join("keep.txt");
        let mut sessions = SessionManager::new();
        open_at(&mut sessions, &file, "original", true);

        let mut workspace = Workspace::new();
        workspace
            .open_folder(&root, &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Discard
            })
            .unwrap();
        workspace
            .close_folder(&mut sessions, &mut |_: &EditorSession| SaveChoice::Save)
            .unwrap();

        assert!(sessions.is_empty());
        let written = fs::read_to_string(&file).unwrap();
        assert_eq!(written, "original edited");
    }

    #[test]
    fn unmodified_sessions_close_without_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let mut sessions = SessionManager::new();
        open_at(&mut sessions, &root.join("quiet.txt"), "quiet", false);

        let mut workspace = Workspace::new();
        workspace
            .open_folder(&root, &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Cancel
            })
            .unwrap();

        let mut prompted = 0;
        let outcome = workspace
            .close_folder(&mut sessions, &mut |_: &EditorSession| {
                prompted += 1;
                SaveChoice::Cancel
            })
            .unwrap();

        assert_eq!(prompted, 0);
        assert!(!outcome.was_aborted());
        assert!(sessions.is_empty());
    }

    #[test]
    fn switching_folders_reconciles_against_the_old_root() {
        let old_dir = tempfile::tempdir().unwrap();
        let new_dir = tempfile::tempdir().unwrap();
        let mut sessions = SessionManager::new();
        open_at(&mut sessions, &old_dir.path().join("old.txt"), "old", false);

        let mut workspace = Workspace::new();
        workspace
            .open_folder(old_dir.path(), &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Cancel
            })
            .unwrap();

        let outcome = workspace
            .open_folder(new_dir.path(), &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Discard
            })
            .unwrap();

        assert!(!outcome.was_aborted());
        assert_eq!(workspace.root(), Some(new_dir.path()));
        assert!(sessions.is_empty());
    }

    #[test]
    fn cancelled_switch_keeps_the_old_root() {
        let old_dir = tempfile::tempdir().unwrap();
        let new_dir = tempfile::tempdir().unwrap();
        let mut sessions = SessionManager::new();
        open_at(&mut sessions, &old_dir.path().join("old.txt"), "old", true);

        let mut workspace = Workspace::new();
        workspace
            .open_folder(old_dir.path(), &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Discard
            })
            .unwrap();

        let outcome = workspace
            .open_folder(new_dir.path(), &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Cancel
            })
            .unwrap();

        assert!(outcome.was_aborted());
        assert_eq!(workspace.root(), Some(old_dir.path()));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn reopening_the_same_folder_skips_reconciliation() {
        let dir = tempfile::tempdir().unwrap();
        let mut sessions = SessionManager::new();
        open_at(&mut sessions, &dir.path().join("same.txt"), "same", true);

        let mut workspace = Workspace::new();
        workspace
            .open_folder(dir.path(), &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Cancel
            })
            .unwrap();
        let outcome = workspace
            .open_folder(dir.path(), &mut sessions, &mut |_: &EditorSession| {
                SaveChoice::Cancel
            })
            .unwrap();

        assert!(!outcome.was_aborted());
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn toggle_hidden_flips_flag_only() {
        let mut workspace = Workspace::new();
        assert!(!workspace.show_hidden());
        assert!(workspace.toggle_hidden());
        assert!(!workspace.toggle_hidden());
    }
}
