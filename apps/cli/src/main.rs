use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codepp_core::{normalize_crlf, probe_path, Document};
use codepp_project::tree::{self, TreeNode};
use codepp_vcs::{GitFacade, GitFailure, DEFAULT_LOG_LIMIT};

#[derive(Parser)]
#[command(
    name = "codepp-cli",
    about = "Utility commands for the code++ editor shell",
    author,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 偵測檔案的編碼與行尾並顯示。 / Detect and print file encoding and line endings.
    Detect(DetectArgs),
    /// 將檔案行尾正規化為 CRLF。 / Normalise file line endings to CRLF.
    Normalize(NormalizeArgs),
    /// 顯示資料夾的樹狀投影。 / Print the file-tree projection of a folder.
    Tree(TreeArgs),
    /// 透過 git 門面執行版本控制操作。 / Run version-control operations through the git facade.
    #[command(subcommand)]
    Git(GitCommand),
}

#[derive(Args)]
struct DetectArgs {
    /// 要偵測的檔案。 / Files to probe.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Args)]
struct NormalizeArgs {
    /// 要正規化的檔案。 / Files to normalise.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// 僅回報需要改寫的檔案，不實際寫入。 / Report files that would change without rewriting them.
    #[arg(long)]
    check: bool,
}

#[derive(Args)]
struct TreeArgs {
    /// 投影的根資料夾。 / Root folder of the projection.
    dir: PathBuf,

    /// 包含以點開頭的隱藏項目。 / Include hidden dot-entries.
    #[arg(long)]
    hidden: bool,
}

#[derive(Subcommand)]
enum GitCommand {
    /// 顯示儲存庫狀態。 / Show repository status.
    Status(RepoArgs),
    /// 初始化儲存庫（已存在時僅回報）。 / Initialise a repository (idempotent).
    Init(RepoArgs),
    /// 顯示精簡提交紀錄。 / Show the abbreviated commit log.
    Log {
        #[command(flatten)]
        repo: RepoArgs,
        /// 顯示的筆數上限。 / Maximum number of entries.
        #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
        limit: usize,
    },
    /// 列出分支。 / List branches.
    Branch(RepoArgs),
    /// 顯示目前分支名稱。 / Print the current branch name.
    Current(RepoArgs),
    /// 依序列出遠端網址。 / List remote URLs in order.
    Remotes(RepoArgs),
    /// 顯示最近一次提交的摘要。 / Show the last commit summary.
    LastCommit(RepoArgs),
    /// 暫存所有變更後提交。 / Stage all changes, then commit.
    Commit {
        #[command(flatten)]
        repo: RepoArgs,
        /// 提交訊息。 / Commit message.
        #[arg(short, long)]
        message: String,
    },
    /// 顯示工作目錄差異。 / Show the working-tree diff.
    Diff(RepoArgs),
    /// 列出標籤。 / List tags.
    Tags(RepoArgs),
}

#[derive(Args)]
struct RepoArgs {
    /// 儲存庫根目錄；預設為目前目錄。 / Repository root (defaults to the current directory).
    #[arg(long, value_name = "PATH")]
    repo: Option<PathBuf>,
}

impl RepoArgs {
    fn facade(&self) -> Result<GitFacade> {
        let root = match &self.repo {
            Some(path) => path.clone(),
            None => env::current_dir().context("failed to resolve the current directory")?,
        };
        Ok(GitFacade::new(root))
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Detect(args) => detect(args),
        Commands::Normalize(args) => normalize(args),
        Commands::Tree(args) => print_tree(args),
        Commands::Git(command) => git(command),
    }
}

fn detect(args: DetectArgs) -> Result<ExitCode> {
    for input in &args.inputs {
        let status = probe_path(input);
        println!("{}: {}", input.display(), status.label());
    }
    Ok(ExitCode::SUCCESS)
}

fn normalize(args: NormalizeArgs) -> Result<ExitCode> {
    let mut pending = 0usize;
    for input in &args.inputs {
        let mut document = Document::open(input)
            .with_context(|| format!("failed to open {}", input.display()))?;
        let normalised = normalize_crlf(document.contents());
        if normalised == document.contents() {
            println!("{}: already CRLF", input.display());
            continue;
        }
        if args.check {
            println!("{}: needs normalisation", input.display());
            pending += 1;
            continue;
        }
        document.save()
            .with_context(|| format!("failed to save {}", input.display()))?;
        println!("{}: normalised", input.display());
    }
    if pending > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_tree(args: TreeArgs) -> Result<ExitCode> {
    let projection = tree::scan(&args.dir, args.hidden)
        .with_context(|| format!("failed to read {}", args.dir.display()))?;
    print_node(&projection, 0);
    Ok(ExitCode::SUCCESS)
}

fn print_node(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.is_folder() {
        println!("{indent}{}/", node.name);
    } else {
        println!("{indent}{}", node.name);
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn git(command: GitCommand) -> Result<ExitCode> {
    let outcome = match &command {
        GitCommand::Status(repo) => repo.facade()?.status(),
        GitCommand::Init(repo) => repo.facade()?.init(),
        GitCommand::Log { repo, limit } => repo.facade()?.log(*limit),
        GitCommand::Branch(repo) => repo.facade()?.branch(),
        GitCommand::Current(repo) => repo.facade()?.current_branch(),
        GitCommand::Remotes(repo) => {
            let remotes = repo.facade()?.remotes();
            if remotes.is_empty() {
                println!("(no remotes)");
            } else {
                for url in remotes {
                    println!("{url}");
                }
            }
            return Ok(ExitCode::SUCCESS);
        }
        GitCommand::LastCommit(repo) => repo.facade()?.last_commit(),
        GitCommand::Commit { repo, message } => repo.facade()?.commit(message),
        GitCommand::Diff(repo) => repo.facade()?.diff(None, None),
        GitCommand::Tags(repo) => repo.facade()?.tags(),
    };
    match outcome {
        Ok(text) => {
            if !text.is_empty() {
                println!("{text}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure @ GitFailure::NotARepository) => {
            println!("{failure}");
            Ok(ExitCode::FAILURE)
        }
        Err(failure) => {
            eprintln!("{failure}");
            Ok(ExitCode::FAILURE)
        }
    }
}
