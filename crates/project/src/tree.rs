use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Whether a tree node is a folder or a file.
/// 樹節點的種類：資料夾或檔案。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeNodeKind {
    Folder,
    File,
}

/// One entry of the workspace file-tree projection.
/// 工作區檔案樹投影中的單一節點。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: TreeNodeKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        self.kind == TreeNodeKind::Folder
    }

    /// Total number of nodes in this subtree, the node itself included.
    /// 此子樹的節點總數（含自身）。
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    /// Finds a node by exact path.
    /// 依完整路徑尋找節點。
    pub fn find(&self, path: &Path) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }
}

/// Builds the projection for `root`. Dot-entries are filtered out unless
/// `show_hidden` is set. The root must be readable; unreadable descendants
/// are logged and skipped.
/// 建立根目錄的樹狀投影；除非啟用 `show_hidden`，點開頭項目會被濾除。
/// 根目錄必須可讀，無法讀取的子目錄會記錄後略過。
pub fn scan(root: &Path, show_hidden: bool) -> io::Result<TreeNode> {
    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let children = scan_children(root, show_hidden, true)?;
    Ok(TreeNode {
        name,
        path: root.to_path_buf(),
        kind: TreeNodeKind::Folder,
        children,
    })
}

fn scan_children(dir: &Path, show_hidden: bool, is_root: bool) -> io::Result<Vec<TreeNode>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if is_root => return Err(err),
        Err(err) => {
            log::warn!("skipping unreadable directory {}: {err}", dir.display());
            return Ok(Vec::new());
        }
    };

    let mut nodes = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if !show_hidden && name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false);
        if is_dir {
            let children = scan_children(&path, show_hidden, false)?;
            nodes.push(TreeNode {
                name,
                path,
                kind: TreeNodeKind::Folder,
                children,
            });
        } else {
            nodes.push(TreeNode {
                name,
                path,
                kind: TreeNodeKind::File,
                children: Vec::new(),
            });
        }
    }

    // Folders first, then files, case-insensitive name order within each group.
    // 資料夾優先、檔案其次，同類依名稱不分大小寫排序。
    nodes.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(nodes)
}
