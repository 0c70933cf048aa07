use std::path::{Path, PathBuf};

use codepp_core::{Document, FileStatus, Language};
use codepp_project::tree::{self, TreeNode};
use codepp_project::{EditorSession, SessionId, SessionManager, Workspace};
use codepp_search::{replace_all, SearchOptions};
use codepp_settings::theme::DEFAULT_THEME;
use codepp_settings::{
    LastFolderStore, RecentFilesStore, ResolvedPalette, ThemeRegistry, DEFAULT_RECENT_CAPACITY,
};
use codepp_vcs::{GitFacade, GitResult, DEFAULT_LOG_LIMIT};

use crate::shell::{AppShell, TextWidget};

const RECENT_FILE_NAME: &str = "recent.list";
const WORKSPACE_STATE_NAME: &str = "workspace.state";

/// The top-level controller: owns every piece of application state and maps
/// user intents onto it, talking to the toolkit through the shell traits.
/// 最上層控制器：持有全部應用狀態並將使用者意圖映射至其上，
/// 透過外殼介面與工具組互動。
pub struct App<S: AppShell> {
    shell: S,
    sessions: SessionManager,
    widgets: Vec<S::Widget>,
    workspace: Workspace,
    themes: ThemeRegistry,
    recent: RecentFilesStore,
    last_folder: LastFolderStore,
    git: GitFacade,
    tree: Option<TreeNode>,
}

impl<S: AppShell> App<S> {
    /// Builds the controller with its stores rooted at `state_dir`. Store
    /// load failures fall back to empty state; missing state is normal.
    /// 以 `state_dir` 作為儲存根目錄建立控制器；載入失敗時退回空狀態。
    pub fn new(shell: S, state_dir: &Path) -> Self {
        let recent_path = state_dir.join(RECENT_FILE_NAME);
        let recent = RecentFilesStore::load(&recent_path, DEFAULT_RECENT_CAPACITY)
            .unwrap_or_else(|err| {
                log::warn!("failed to load recent files: {err}");
                RecentFilesStore::empty(&recent_path, DEFAULT_RECENT_CAPACITY)
            });
        Self {
            shell,
            sessions: SessionManager::new(),
            widgets: Vec::new(),
            workspace: Workspace::new(),
            themes: ThemeRegistry::with_builtins(),
            recent,
            last_folder: LastFolderStore::new(state_dir.join(WORKSPACE_STATE_NAME)),
            git: GitFacade::unbound(),
            tree: None,
        }
    }

    /// Applies the default theme and restores the remembered folder, if any.
    /// 套用預設主題並還原上次記住的資料夾（若有）。
    pub fn startup(&mut self) {
        self.apply_theme(DEFAULT_THEME);
        match self.last_folder.load() {
            Ok(Some(folder)) if folder.is_dir() => {
                self.open_folder_at(folder);
            }
            Ok(_) => {}
            Err(err) => log::warn!("failed to restore last folder: {err}"),
        }
    }

    // --- File menu ---
    // --- 檔案選單 ---

    /// Creates a fresh unbound tab.
    /// 建立新的未綁定分頁。
    pub fn file_new(&mut self) {
        self.sessions.new_session("", Language::Plain);
        let mut widget = self.shell.create_widget();
        widget.set_text("");
        widget.set_language(Language::Plain);
        if let Some(palette) = self.current_palette() {
            widget.apply_colors(palette.editor_background, palette.editor_text);
        }
        self.widgets.push(widget);
        self.shell.set_status("New file created.");
        self.refresh_file_status();
    }

    /// Opens a file chosen through the file dialog.
    /// 開啟由檔案對話框選取的檔案。
    pub fn file_open(&mut self) {
        if let Some(path) = self.shell.pick_open_file() {
            self.open_path(path);
        }
    }

    /// Opens the file at `path` in a new tab.
    /// 在新分頁開啟指定路徑的檔案。
    pub fn open_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let document = match Document::open(&path) {
            Ok(document) => document,
            Err(err) => {
                self.shell.show_error("Open Error", &err.to_string());
                return;
            }
        };

        let mut widget = self.shell.create_widget();
        widget.set_text(document.contents());
        widget.set_language(document.language());
        if let Some(palette) = self.current_palette() {
            widget.apply_colors(palette.editor_background, palette.editor_text);
        }
        self.sessions.open_document(document);
        self.widgets.push(widget);

        if let Err(err) = self.recent.add(&path) {
            log::warn!("failed to record recent file: {err}");
        }
        self.shell
            .set_status(&format!("Opened {}", path.display()));
        self.refresh_file_status();
    }

    /// Opens a file double-clicked in the workspace tree; folders are ignored.
    /// 開啟在樹中雙擊的檔案；資料夾則忽略。
    pub fn open_from_tree(&mut self, path: &Path) {
        if path.is_file() {
            self.open_path(path);
        }
    }

    /// Saves the focused tab, delegating to save-as when unbound.
    /// 儲存焦點分頁；未綁定檔案時轉為另存新檔。
    pub fn file_save(&mut self) {
        let Some(index) = self.sessions.current_index() else {
            return;
        };
        if self
            .sessions
            .get(index)
            .is_some_and(|session| session.document().path().is_none())
        {
            self.file_save_as();
            return;
        }
        self.sync_document(index);
        let Some(session) = self.sessions.get_mut(index) else {
            return;
        };
        match session.document_mut().save() {
            Ok(path) => {
                session.refresh_status();
                if let Some(widget) = self.widgets.get_mut(index) {
                    widget.set_modified(false);
                }
                self.shell.set_status(&format!("Saved {}", path.display()));
                self.refresh_file_status();
            }
            Err(err) => self.shell.show_error("Save Error", &err.to_string()),
        }
    }

    /// Saves the focused tab under a newly chosen path.
    /// 將焦點分頁另存為新選擇的路徑。
    pub fn file_save_as(&mut self) {
        let Some(index) = self.sessions.current_index() else {
            return;
        };
        let Some(path) = self.shell.pick_save_path() else {
            return;
        };
        self.sync_document(index);
        let Some(session) = self.sessions.get_mut(index) else {
            return;
        };
        if let Err(err) = session.document_mut().save_as(&path) {
            self.shell.show_error("Save As Error", &err.to_string());
            return;
        }
        session.refresh_status();
        let language = session.language();
        if let Some(widget) = self.widgets.get_mut(index) {
            widget.set_language(language);
            widget.set_modified(false);
        }
        if let Err(err) = self.recent.add(&path) {
            log::warn!("failed to record recent file: {err}");
        }
        self.shell
            .set_status(&format!("Saved as {}", path.display()));
        self.refresh_file_status();
    }

    /// Closes the focused tab. Ad-hoc close discards silently; the
    /// save-or-discard sweep only runs when a folder is being closed.
    /// 關閉焦點分頁。單獨關閉直接捨棄；儲存詢問只發生在關閉資料夾時。
    pub fn file_close(&mut self) {
        let Some(index) = self.sessions.current_index() else {
            return;
        };
        if self.sessions.close_session(index).is_ok() {
            self.widgets.remove(index);
            self.shell.set_status("Tab closed.");
        }
        self.refresh_file_status();
    }

    // --- Folder lifecycle ---
    // --- 資料夾生命週期 ---

    /// Opens a folder chosen through the folder dialog.
    /// 開啟由資料夾對話框選取的資料夾。
    pub fn open_folder(&mut self) {
        if let Some(folder) = self.shell.pick_folder() {
            self.open_folder_at(folder);
        }
    }

    /// Adopts `folder` as the workspace root, reconciling tabs bound under a
    /// previously open folder first.
    /// 採用指定資料夾為工作區根目錄；先調和前一個資料夾下的分頁。
    pub fn open_folder_at(&mut self, folder: impl Into<PathBuf>) {
        let folder = folder.into();
        self.sync_modified_documents();
        let before = self.session_ids();
        let result = {
            let shell = &mut self.shell;
            let mut decider =
                |session: &EditorSession| shell.ask_save_discard_cancel(&session.display_name());
            self.workspace
                .open_folder(&folder, &mut self.sessions, &mut decider)
        };
        self.prune_widgets(&before);
        match result {
            Err(err) => self.shell.show_error("Save Error", &err.to_string()),
            Ok(outcome) if outcome.was_aborted() => {
                self.shell.set_status("Folder change cancelled.");
            }
            Ok(_) => {
                self.git.rebind(Some(folder.clone()));
                if let Err(err) = self.last_folder.save(&folder) {
                    log::warn!("failed to remember folder: {err}");
                }
                self.rebuild_tree();
                self.shell
                    .set_status(&format!("Opened folder: {}", folder.display()));
            }
        }
        self.refresh_file_status();
    }

    /// Closes the workspace folder after reconciling its tabs.
    /// 先調和資料夾下的分頁，再關閉工作區資料夾。
    pub fn close_folder(&mut self) {
        self.sync_modified_documents();
        let before = self.session_ids();
        let result = {
            let shell = &mut self.shell;
            let mut decider =
                |session: &EditorSession| shell.ask_save_discard_cancel(&session.display_name());
            self.workspace.close_folder(&mut self.sessions, &mut decider)
        };
        self.prune_widgets(&before);
        match result {
            Err(err) => self.shell.show_error("Save Error", &err.to_string()),
            Ok(outcome) if outcome.was_aborted() => {
                self.shell.set_status("Folder close cancelled.");
            }
            Ok(_) => {
                self.git.rebind(None);
                if let Err(err) = self.last_folder.clear() {
                    log::warn!("failed to forget folder: {err}");
                }
                self.rebuild_tree();
                self.shell.set_status("Folder closed.");
            }
        }
        self.refresh_file_status();
    }

    /// Flips the hidden-entry filter and recomputes the projection. The flag
    /// alone never refreshes anything; the rebuild here is the explicit step.
    /// 切換隱藏項目篩選並重新計算投影；旗標本身不會觸發更新，
    /// 此處的重建即為明確的重新計算步驟。
    pub fn toggle_hidden(&mut self) {
        let show = self.workspace.toggle_hidden();
        self.rebuild_tree();
        self.shell.set_status(if show {
            "Hidden files shown."
        } else {
            "Hidden files hidden."
        });
    }

    // --- Tree context actions ---
    // --- 樹狀投影快捷動作 ---

    /// Creates an empty file under `parent`, prompting for its name.
    /// 在指定資料夾下建立空白檔案，名稱由輸入框取得。
    pub fn tree_create_file(&mut self, parent: &Path) {
        let Some(name) = self.prompt_nonempty("New File", "File name:") else {
            return;
        };
        match codepp_project::fsops::create_file(&parent.join(&name)) {
            Ok(()) => self.rebuild_tree(),
            Err(err) => self.shell.show_error("File Error", &err.to_string()),
        }
    }

    /// Creates a folder under `parent`, prompting for its name.
    /// 在指定資料夾下建立子資料夾，名稱由輸入框取得。
    pub fn tree_create_folder(&mut self, parent: &Path) {
        let Some(name) = self.prompt_nonempty("New Folder", "Folder name:") else {
            return;
        };
        match codepp_project::fsops::create_folder(&parent.join(&name)) {
            Ok(()) => self.rebuild_tree(),
            Err(err) => self.shell.show_error("Folder Error", &err.to_string()),
        }
    }

    /// Deletes a file, or a folder with its contents.
    /// 刪除檔案，或連同內容刪除資料夾。
    pub fn tree_delete(&mut self, path: &Path) {
        match codepp_project::fsops::remove(path) {
            Ok(()) => self.rebuild_tree(),
            Err(err) => self.shell.show_error("Delete Error", &err.to_string()),
        }
    }

    /// Renames a tree entry in place, prompting for the new name.
    /// 就地重新命名樹中的項目，新名稱由輸入框取得。
    pub fn tree_rename(&mut self, path: &Path) {
        let Some(name) = self.prompt_nonempty("Rename", "New name:") else {
            return;
        };
        let Some(parent) = path.parent() else {
            return;
        };
        match codepp_project::fsops::rename(path, &parent.join(&name)) {
            Ok(()) => self.rebuild_tree(),
            Err(err) => self.shell.show_error("Rename Error", &err.to_string()),
        }
    }

    // --- Edit menu ---
    // --- 編輯選單 ---

    pub fn edit_undo(&mut self) {
        if let Some(widget) = self.current_widget_mut() {
            widget.undo();
        }
    }

    pub fn edit_redo(&mut self) {
        if let Some(widget) = self.current_widget_mut() {
            widget.redo();
        }
    }

    pub fn edit_cut(&mut self) {
        if let Some(widget) = self.current_widget_mut() {
            widget.cut();
        }
    }

    pub fn edit_copy(&mut self) {
        if let Some(widget) = self.current_widget_mut() {
            widget.copy();
        }
    }

    pub fn edit_paste(&mut self) {
        if let Some(widget) = self.current_widget_mut() {
            widget.paste();
        }
    }

    pub fn edit_select_all(&mut self) {
        if let Some(widget) = self.current_widget_mut() {
            widget.select_all();
        }
    }

    // --- Search menu ---
    // --- 搜尋選單 ---

    /// Prompts for a pattern and highlights its first match.
    /// 詢問搜尋樣式並標示第一個符合項目。
    pub fn search_find(&mut self) {
        let Some(index) = self.sessions.current_index() else {
            return;
        };
        let Some(needle) = self.prompt_nonempty("Find", "Find:") else {
            return;
        };
        let found = self
            .widgets
            .get_mut(index)
            .map(|widget| widget.find_first(&needle))
            .unwrap_or(false);
        if !found {
            self.shell.set_status(&format!("'{needle}' not found"));
        }
    }

    /// Prompts for find/replace text and rewrites every occurrence.
    /// 詢問搜尋與取代文字，改寫所有符合項目。
    pub fn search_replace(&mut self) {
        let Some(index) = self.sessions.current_index() else {
            return;
        };
        let Some(find_text) = self.prompt_nonempty("Replace", "Find:") else {
            return;
        };
        let Some(replace_text) = self.shell.prompt_line("Replace", "Replace with:") else {
            return;
        };

        let Some(widget) = self.widgets.get_mut(index) else {
            return;
        };
        let options = SearchOptions::new(find_text.as_str());
        match replace_all(&widget.text(), &options, &replace_text) {
            Ok(outcome) => {
                if outcome.replacements > 0 {
                    widget.set_text(&outcome.replaced_text);
                    if let Some(session) = self.sessions.get_mut(index) {
                        session.document_mut().set_contents(outcome.replaced_text);
                    }
                }
                self.shell.set_status(&format!(
                    "Replaced {} occurrence(s) of '{find_text}' with '{replace_text}'",
                    outcome.replacements
                ));
            }
            Err(err) => self.shell.show_error("Replace Error", &err.to_string()),
        }
    }

    // --- Settings menu ---
    // --- 設定選單 ---

    /// Prompts for a theme name and applies it.
    /// 詢問主題名稱並套用。
    pub fn settings_theme(&mut self) {
        let names: Vec<String> = self.themes.names().map(String::from).collect();
        if let Some(choice) = self.shell.pick_choice("Theme", "Select theme:", &names) {
            self.apply_theme(&choice);
        }
    }

    /// Applies the named theme to the window, every live tab, and the tree,
    /// all before returning. An unknown name leaves everything untouched.
    /// 將指定主題同步套用到視窗、所有分頁與樹；未知名稱時一切維持原狀。
    pub fn apply_theme(&mut self, name: &str) {
        let palette = match self.themes.get(name).map(|theme| theme.resolve()) {
            Some(Ok(palette)) => palette,
            Some(Err(err)) => {
                log::warn!("theme '{name}' failed to resolve: {err}");
                return;
            }
            None => {
                log::warn!("theme '{name}' not found");
                self.shell.set_status(&format!("Theme '{name}' not found"));
                return;
            }
        };
        self.themes.set_current(name);
        self.shell.apply_window_theme(&palette);
        for widget in &mut self.widgets {
            widget.apply_colors(palette.editor_background, palette.editor_text);
        }
        self.shell
            .apply_tree_theme(palette.tree_background, palette.tree_text);
        self.shell.set_status(&format!("Theme set to {name}"));
    }

    // --- Git menu ---
    // --- Git 選單 ---

    pub fn git_status(&mut self) {
        let text = render_git(self.git.status());
        self.shell.show_info("Git Status", &text);
    }

    pub fn git_commit(&mut self) {
        let Some(message) = self.prompt_nonempty("Git Commit", "Commit message:") else {
            return;
        };
        let text = render_git(self.git.commit(&message));
        self.shell.show_info("Git Commit", &text);
    }

    pub fn git_push(&mut self) {
        let text = render_git(self.git.push());
        self.shell.show_info("Git Push", &text);
    }

    pub fn git_pull(&mut self) {
        let text = render_git(self.git.pull());
        self.shell.show_info("Git Pull", &text);
    }

    pub fn git_log(&mut self) {
        let text = render_git(self.git.log(DEFAULT_LOG_LIMIT));
        self.shell.show_info("Git Log", &text);
    }

    /// Clones a remote repository into a chosen destination folder.
    /// 將遠端儲存庫複製到選定的目的資料夾。
    pub fn git_clone(&mut self) {
        let Some(url) = self.prompt_nonempty("Git Clone", "Enter repository URL:") else {
            return;
        };
        let Some(dest) = self.shell.pick_folder() else {
            return;
        };
        match GitFacade::clone_into(&url, &dest) {
            Ok(_) => self.shell.show_info(
                "Git Clone",
                &format!("Repository cloned successfully to:\n{}", dest.display()),
            ),
            Err(err) => self.shell.show_error("Git Clone Error", &err.to_string()),
        }
    }

    // --- Tab focus and edit notifications ---
    // --- 分頁焦點與編輯通知 ---

    /// Focuses the tab at `index` and refreshes the file status display.
    /// 聚焦指定分頁並更新檔案狀態顯示。
    pub fn select_tab(&mut self, index: usize) {
        if self.sessions.set_current(index).is_ok() {
            self.refresh_file_status();
        }
    }

    /// Called by the shell when the widget text of a tab changes.
    /// 當某分頁的元件文字變動時由外殼呼叫。
    pub fn on_text_changed(&mut self, index: usize) {
        self.sync_document(index);
    }

    // --- Accessors used by the concrete shell and by tests ---
    // --- 提供實際外殼與測試使用的存取器 ---

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn themes(&self) -> &ThemeRegistry {
        &self.themes
    }

    pub fn recent(&self) -> &RecentFilesStore {
        &self.recent
    }

    pub fn git(&self) -> &GitFacade {
        &self.git
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    // --- Internals ---
    // --- 內部細節 ---

    fn current_widget_mut(&mut self) -> Option<&mut S::Widget> {
        let index = self.sessions.current_index()?;
        self.widgets.get_mut(index)
    }

    fn current_palette(&self) -> Option<ResolvedPalette> {
        self.themes.current_definition().resolve().ok()
    }

    fn prompt_nonempty(&mut self, title: &str, label: &str) -> Option<String> {
        let input = self.shell.prompt_line(title, label)?;
        if input.is_empty() {
            return None;
        }
        Some(input)
    }

    fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(EditorSession::id).collect()
    }

    /// Drops widgets whose session was removed, keeping both lists aligned.
    /// 移除對應工作階段已關閉的元件，維持兩個清單對齊。
    fn prune_widgets(&mut self, before: &[SessionId]) {
        let keep: Vec<bool> = before
            .iter()
            .map(|id| self.sessions.contains(*id))
            .collect();
        let mut index = 0;
        self.widgets.retain(|_| {
            let kept = keep.get(index).copied().unwrap_or(true);
            index += 1;
            kept
        });
    }

    /// Pulls the widget text of `index` into its document.
    /// 將指定分頁的元件文字同步進文件。
    fn sync_document(&mut self, index: usize) {
        let Some(widget) = self.widgets.get(index) else {
            return;
        };
        let text = widget.text();
        if let Some(session) = self.sessions.get_mut(index) {
            if session.document().contents() != text {
                session.document_mut().set_contents(text);
            }
        }
    }

    fn sync_modified_documents(&mut self) {
        for index in 0..self.widgets.len() {
            self.sync_document(index);
        }
    }

    fn rebuild_tree(&mut self) {
        match self.workspace.root() {
            Some(root) => match tree::scan(root, self.workspace.show_hidden()) {
                Ok(node) => self.tree = Some(node),
                Err(err) => {
                    self.shell.show_error("Folder Error", &err.to_string());
                    self.tree = None;
                }
            },
            None => self.tree = None,
        }
        self.shell.refresh_tree(self.tree.as_ref());
    }

    fn refresh_file_status(&mut self) {
        let status: Option<FileStatus> = self
            .sessions
            .current_session_mut()
            .map(EditorSession::refresh_status);
        self.shell.set_file_status(status.as_ref());
    }
}

fn render_git(result: GitResult) -> String {
    match result {
        Ok(text) if text.is_empty() => "(no output)".to_string(),
        Ok(text) => text,
        Err(failure) => failure.to_string(),
    }
}
