//! Session, workspace, and file-tree management for the code++ shell.
//! 管理 code++ 編輯器的分頁工作階段、工作區與檔案樹。

pub mod fsops;
pub mod session;
pub mod tree;
pub mod workspace;

pub use session::{EditorSession, SessionError, SessionId, SessionManager};
pub use tree::{scan, TreeNode, TreeNodeKind};
pub use workspace::{
    ReconcileOutcome, ReconcileState, SaveChoice, SaveDecider, Workspace, WorkspaceError,
};
