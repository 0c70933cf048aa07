//! Application controller for the code++ editor shell.
//! code++ 編輯器外殼的應用控制器。
//!
//! The controller owns all mutable application state (sessions, workspace,
//! themes, stores, git facade) and reaches the concrete UI toolkit only
//! through the [`AppShell`] and [`TextWidget`] traits, so tests can drive the
//! whole shell with scripted fakes.
//! 控制器持有全部可變狀態（分頁、工作區、主題、儲存、git 門面），
//! 僅透過 [`AppShell`] 與 [`TextWidget`] 介面觸及實際的 UI 工具組，
//! 測試因此能以腳本化替身驅動整個外殼。

mod controller;
mod shell;

pub use controller::App;
pub use shell::{AppShell, TextWidget};

pub use codepp_project::SaveChoice;
