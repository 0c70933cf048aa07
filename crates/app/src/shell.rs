use std::path::PathBuf;

use codepp_core::{FileStatus, Language};
use codepp_project::{SaveChoice, TreeNode};
use codepp_settings::{Color, ResolvedPalette};

/// Adapter over the concrete text-editing widget bound to one tab.
/// 綁定單一分頁之實際文字編輯元件的轉接介面。
pub trait TextWidget {
    fn set_text(&mut self, text: &str);
    fn text(&self) -> String;

    /// The widget-side modified flag, cleared after a successful save.
    /// 元件端的已修改旗標；儲存成功後清除。
    fn is_modified(&self) -> bool;
    fn set_modified(&mut self, modified: bool);

    fn undo(&mut self);
    fn redo(&mut self);
    fn cut(&mut self);
    fn copy(&mut self);
    fn paste(&mut self);
    fn select_all(&mut self);

    /// First-match find; returns whether anything was located.
    /// 尋找第一個符合項目；回傳是否找到。
    fn find_first(&mut self, needle: &str) -> bool;

    /// Selects the highlighting mode keyed by language tag.
    /// 依語言標籤選擇語法標示模式。
    fn set_language(&mut self, language: Language);

    /// Applies the editor-role colours of the current theme.
    /// 套用現用主題的編輯器角色色彩。
    fn apply_colors(&mut self, background: Color, foreground: Color);
}

/// The windowing/dialog surface the controller drives.
/// 控制器所驅動的視窗與對話框介面。
pub trait AppShell {
    type Widget: TextWidget;

    /// Creates the widget backing a freshly opened tab.
    /// 建立新分頁背後的編輯元件。
    fn create_widget(&mut self) -> Self::Widget;

    fn pick_open_file(&mut self) -> Option<PathBuf>;
    fn pick_save_path(&mut self) -> Option<PathBuf>;
    fn pick_folder(&mut self) -> Option<PathBuf>;

    /// Single-line text prompt; `None` on dismissal.
    /// 單行文字輸入框；關閉時回傳 `None`。
    fn prompt_line(&mut self, title: &str, label: &str) -> Option<String>;

    /// Non-editable choice prompt; `None` on dismissal.
    /// 不可編輯的選項對話框；關閉時回傳 `None`。
    fn pick_choice(&mut self, title: &str, label: &str, choices: &[String]) -> Option<String>;

    /// {Save, Discard, Cancel} prompt used during close-reconciliation.
    /// 關閉調和流程使用的三鍵詢問框。
    fn ask_save_discard_cancel(&mut self, display_name: &str) -> SaveChoice;

    fn show_error(&mut self, title: &str, message: &str);
    fn show_info(&mut self, title: &str, message: &str);

    /// Transient status-bar message.
    /// 暫時性的狀態列訊息。
    fn set_status(&mut self, message: &str);

    /// Encoding/line-ending indicator for the focused tab; `None` when no
    /// tab is open.
    /// 顯示焦點分頁的編碼與行尾；無分頁時為 `None`。
    fn set_file_status(&mut self, status: Option<&FileStatus>);

    fn apply_window_theme(&mut self, palette: &ResolvedPalette);
    fn apply_tree_theme(&mut self, background: Color, foreground: Color);

    /// Re-renders the tree projection; `None` hides the tree.
    /// 重繪樹狀投影；`None` 表示隱藏樹。
    fn refresh_tree(&mut self, projection: Option<&TreeNode>);
}
