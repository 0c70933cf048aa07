//! Facade over the external `git` command-line tool.
//! （對外部 `git` 指令列工具的門面封裝。）
//!
//! Every editor intent (commit, push, pull, …) maps to one subprocess
//! invocation, and every failure is normalised into a typed [`GitFailure`]
//! instead of propagating as a fault. An unbound root, or a root without a
//! repository, short-circuits each operation to
//! [`GitFailure::NotARepository`] without spawning anything.
//! 每個編輯器意圖對應一次子程序呼叫；所有失敗都轉為具型別的 [`GitFailure`]，
//! 不會向呼叫端拋出例外。未綁定根目錄或根目錄不是儲存庫時，
//! 一律直接回傳 [`GitFailure::NotARepository`]，不啟動任何子程序。

mod runner;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub use runner::{ToolCommand, ToolError, ToolOutput};

/// Default number of entries shown by [`GitFacade::log`].
/// （[`GitFacade::log`] 預設顯示的筆數。）
pub const DEFAULT_LOG_LIMIT: usize = 30;

const GIT_PROGRAM: &str = "git";

/// Normalised failure returned by every facade operation.
/// （所有門面操作統一回傳的失敗型別。）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GitFailure {
    /// The facade root is unbound or holds no repository.
    /// （根目錄未綁定或不是 git 儲存庫。）
    NotARepository,
    /// The tool could not be invoked, or exited with a failure.
    /// （工具無法啟動或以失敗結束。）
    Tool(String),
    /// The invocation exceeded the configured timeout.
    /// （執行時間超過設定的逾時限制。）
    TimedOut(Duration),
}

impl fmt::Display for GitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitFailure::NotARepository => write!(f, "Not a git repository"),
            GitFailure::Tool(detail) => write!(f, "Git error: {detail}"),
            GitFailure::TimedOut(timeout) => {
                write!(f, "Git error: timed out after {}ms", timeout.as_millis())
            }
        }
    }
}

/// Result type shared by the facade operations.
/// （門面操作共用的結果型別。）
pub type GitResult<T = String> = Result<T, GitFailure>;

/// Stateless-per-call adapter bound to an optional repository root.
/// （綁定可選儲存庫根目錄、每次呼叫皆無狀態的轉接器。）
#[derive(Debug, Clone)]
pub struct GitFacade {
    root: Option<PathBuf>,
    program: String,
    timeout: Option<Duration>,
}

impl GitFacade {
    /// Creates a facade bound to `root`.
    /// （建立綁定指定根目錄的門面。）
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            program: GIT_PROGRAM.to_string(),
            timeout: None,
        }
    }

    /// Creates a facade with no bound root; every operation reports
    /// [`GitFailure::NotARepository`].
    /// （建立未綁定根目錄的門面；所有操作回報 [`GitFailure::NotARepository`]。）
    pub fn unbound() -> Self {
        Self {
            root: None,
            program: GIT_PROGRAM.to_string(),
            timeout: None,
        }
    }

    /// Overrides the external tool binary.
    /// （覆寫外部工具的執行檔名稱。）
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Applies a per-invocation timeout.
    /// （設定每次呼叫的逾時限制。）
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Rebinds the facade to a new root, typically on folder switch.
    /// （重新綁定根目錄，通常在切換資料夾時呼叫。）
    pub fn rebind(&mut self, root: Option<PathBuf>) {
        self.root = root;
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Returns whether the bound root holds a repository.
    /// （判斷綁定的根目錄是否為儲存庫。）
    pub fn is_repo(&self) -> bool {
        self.root
            .as_deref()
            .is_some_and(|root| root.join(".git").exists())
    }

    pub fn status(&self) -> GitResult {
        self.run(&["status"])
    }

    /// Stages the given path, or everything when `path` is `None`.
    /// （暫存指定路徑；未指定時暫存全部變更。）
    pub fn add(&self, path: Option<&str>) -> GitResult {
        match path {
            Some(path) => self.run(&["add", path]),
            None => self.run(&["add", "--all"]),
        }
    }

    /// Stages all changes, then commits them with `message`.
    /// （先暫存所有變更，再以指定訊息提交。）
    pub fn commit(&self, message: &str) -> GitResult {
        self.run(&["add", "--all"])?;
        self.run(&["commit", "-m", message])
    }

    pub fn push(&self) -> GitResult {
        self.run(&["push"])
    }

    pub fn pull(&self) -> GitResult {
        self.run(&["pull"])
    }

    pub fn fetch(&self) -> GitResult {
        self.run(&["fetch"])
    }

    /// Shows the abbreviated commit log, newest first.
    /// （顯示精簡提交紀錄，最新在前。）
    pub fn log(&self, limit: usize) -> GitResult {
        let count = format!("-n{limit}");
        self.run(&["log", "--oneline", &count])
    }

    pub fn branch(&self) -> GitResult {
        self.run(&["branch"])
    }

    pub fn checkout(&self, branch: &str) -> GitResult {
        self.run(&["checkout", branch])
    }

    /// Creates and switches to a new branch.
    /// （建立並切換至新分支。）
    pub fn create_branch(&self, branch: &str) -> GitResult {
        self.run(&["checkout", "-b", branch])
    }

    /// Diff of the working tree, or between two revisions when both are given.
    /// （工作目錄的差異；提供兩個修訂時比較兩者。）
    pub fn diff(&self, a: Option<&str>, b: Option<&str>) -> GitResult {
        match (a, b) {
            (Some(a), Some(b)) => {
                let range = format!("{a}..{b}");
                self.run(&["diff", &range])
            }
            _ => self.run(&["diff"]),
        }
    }

    /// Fetch URLs of the configured remotes, in listed order. Failures yield
    /// an empty sequence to preserve the type contract.
    /// （依序列出遠端的抓取網址；失敗時回傳空序列以維持型別契約。）
    pub fn remotes(&self) -> Vec<String> {
        let Ok(listing) = self.run(&["remote", "-v"]) else {
            return Vec::new();
        };
        let mut urls = Vec::new();
        for line in listing.lines() {
            let mut fields = line.split_whitespace();
            let _name = fields.next();
            let Some(url) = fields.next() else { continue };
            if fields.next() == Some("(fetch)") && !urls.iter().any(|known| known == url) {
                urls.push(url.to_string());
            }
        }
        urls
    }

    /// Creates or updates a remote URL in one invocation.
    /// （以單次呼叫建立或更新遠端網址。）
    pub fn set_remote(&self, name: &str, url: &str) -> GitResult {
        let key = format!("remote.{name}.url");
        self.run(&["config", &key, url])?;
        Ok(format!("Remote '{name}' set to {url}"))
    }

    pub fn current_branch(&self) -> GitResult {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Unstages the given path, or everything when `path` is `None`.
    /// （取消暫存指定路徑；未指定時取消全部。）
    pub fn reset(&self, path: Option<&str>) -> GitResult {
        match path {
            Some(path) => self.run(&["reset", path]),
            None => self.run(&["reset"]),
        }
    }

    pub fn tags(&self) -> GitResult {
        self.run(&["tag"])
    }

    /// Creates a tag, annotated when a message is supplied.
    /// （建立標籤；提供訊息時建立含註解的標籤。）
    pub fn create_tag(&self, name: &str, message: Option<&str>) -> GitResult {
        match message {
            Some(message) if !message.is_empty() => {
                self.run(&["tag", "-a", name, "-m", message])
            }
            _ => self.run(&["tag", name]),
        }
    }

    pub fn delete_tag(&self, name: &str) -> GitResult {
        self.run(&["tag", "-d", name])
    }

    pub fn stash(&self) -> GitResult {
        self.run(&["stash"])
    }

    pub fn stash_pop(&self) -> GitResult {
        self.run(&["stash", "pop"])
    }

    /// One-line summary of the most recent commit.
    /// （最近一次提交的單行摘要。）
    pub fn last_commit(&self) -> GitResult {
        self.run(&["log", "-1", "--pretty=format:%h - %s (by %an)"])
    }

    pub fn blame(&self, file: &str) -> GitResult {
        self.run(&["blame", file])
    }

    pub fn cherry_pick(&self, commit: &str) -> GitResult {
        self.run(&["cherry-pick", commit])
    }

    pub fn revert(&self, commit: &str) -> GitResult {
        self.run(&["revert", "--no-edit", commit])
    }

    /// Initialises a repository at the root. Idempotent: an existing
    /// repository is reported, not re-initialised.
    /// （在根目錄初始化儲存庫。具冪等性：已存在時回報而非重新初始化。）
    pub fn init(&self) -> GitResult {
        let Some(root) = self.root.as_deref() else {
            return Err(GitFailure::NotARepository);
        };
        if self.is_repo() {
            return Ok("Repository already exists.".to_string());
        }
        self.invoke(root, &["init"])
    }

    /// Clones `url` into `dest`. Root-independent; used by the Clone action.
    /// （將遠端儲存庫複製到指定目錄；與綁定根目錄無關。）
    pub fn clone_into(url: &str, dest: &Path) -> GitResult {
        let dest_text = dest.to_string_lossy();
        let output = ToolCommand::new(GIT_PROGRAM)
            .args(["clone", url, dest_text.as_ref()])
            .run()
            .map_err(|err| GitFailure::Tool(err.to_string()))?;
        classify(output, None)
    }

    fn run(&self, args: &[&str]) -> GitResult {
        let Some(root) = self.root.as_deref() else {
            return Err(GitFailure::NotARepository);
        };
        if !self.is_repo() {
            return Err(GitFailure::NotARepository);
        }
        self.invoke(root, args)
    }

    fn invoke(&self, root: &Path, args: &[&str]) -> GitResult {
        let output = ToolCommand::new(self.program.as_str())
            .args(args.iter().copied())
            .current_dir(root)
            .timeout(self.timeout)
            .run()
            .map_err(|err| GitFailure::Tool(err.to_string()))?;
        classify(output, self.timeout)
    }
}

fn classify(output: ToolOutput, timeout: Option<Duration>) -> GitResult {
    if output.timed_out {
        return Err(GitFailure::TimedOut(timeout.unwrap_or_default()));
    }
    if output.success() {
        return Ok(output.stdout_text());
    }
    let mut detail = output.stderr_text();
    if detail.is_empty() {
        detail = output.stdout_text();
    }
    if detail.is_empty() {
        detail = match output.exit_code {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by signal".to_string(),
        };
    }
    Err(GitFailure::Tool(detail))
}
