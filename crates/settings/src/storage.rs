use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::recent::RecentFiles;

const LAST_FOLDER_KEY: &str = "last_folder";

/// 管理最近檔案清單的持久化儲存。 / Persistence for the recent-files history.
#[derive(Debug)]
pub struct RecentFilesStore {
    path: PathBuf,
    history: RecentFiles,
}

impl RecentFilesStore {
    /// 從指定路徑載入清單；檔案不存在時回傳空集合。 / Loads the history; a missing file yields an empty set.
    pub fn load(path: impl AsRef<Path>, default_capacity: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    history: RecentFiles::new(default_capacity),
                })
            }
            Err(err) => return Err(err),
        };

        let mut lines = contents.lines();
        let mut capacity = default_capacity.max(1);
        if let Some(first_line) = lines.next() {
            if let Some(value) = first_line.trim().strip_prefix("capacity=") {
                if let Ok(parsed) = value.parse::<usize>() {
                    capacity = parsed.max(1);
                }
            }
        }

        let mut entries = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            entries.push(decode_path(trimmed)?);
        }

        Ok(Self {
            path,
            history: RecentFiles::with_entries(capacity, entries),
        })
    }

    /// 建立不含任何項目的儲存；之後的寫入仍落在指定路徑。 / Creates an empty store; later writes still target the given path.
    pub fn empty(path: impl AsRef<Path>, capacity: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            history: RecentFiles::new(capacity),
        }
    }

    /// 取得內部的最近檔案清單。 / Returns the underlying history.
    pub fn history(&self) -> &RecentFiles {
        &self.history
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.history.iter()
    }

    /// 新增或提升項目並立即寫回檔案。 / Adds or promotes an entry and persists it.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> io::Result<()> {
        self.history.add(path);
        self.persist()
    }

    /// 移除項目並同步儲存。 / Removes an entry and persists the change.
    pub fn remove(&mut self, path: &Path) -> io::Result<bool> {
        let removed = self.history.remove(path);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// 清空紀錄並同步儲存。 / Clears the history and persists immediately.
    pub fn clear(&mut self) -> io::Result<()> {
        self.history.clear();
        self.persist()
    }

    fn persist(&self) -> io::Result<()> {
        let mut payload = format!("capacity={}\n", self.history.capacity());
        for entry in self.history.iter() {
            payload.push_str(&encode_path(entry));
            payload.push('\n');
        }
        write_atomic(&self.path, payload.as_bytes())
    }
}

/// 記住最後開啟資料夾的單鍵儲存。 / Single-key store remembering the last opened folder.
#[derive(Debug)]
pub struct LastFolderStore {
    path: PathBuf,
}

impl LastFolderStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 讀取記住的資料夾；檔案不存在是正常狀態，回傳 `None`。 / Reads the remembered folder; a missing file is a normal state and yields `None`.
    pub fn load(&self) -> io::Result<Option<PathBuf>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        for line in contents.lines() {
            let trimmed = line.trim();
            if let Some(encoded) = trimmed.strip_prefix(&format!("{LAST_FOLDER_KEY}=")) {
                if encoded.is_empty() {
                    return Ok(None);
                }
                return decode_path(encoded).map(Some);
            }
        }
        Ok(None)
    }

    /// 記錄新的資料夾路徑；每次成功開啟資料夾時呼叫。 / Records a folder path; called on every successful folder open.
    pub fn save(&self, folder: &Path) -> io::Result<()> {
        let payload = format!("{LAST_FOLDER_KEY}={}\n", encode_path(folder));
        write_atomic(&self.path, payload.as_bytes())
    }

    /// 清除記住的路徑。 / Forgets the remembered path.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn encode_path(path: &Path) -> String {
    BASE64.encode(path_to_bytes(path))
}

fn decode_path(encoded: &str) -> io::Result<PathBuf> {
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|err| io::Error::new(ErrorKind::InvalidData, err))?;
    bytes_to_path(bytes)
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(unix)]
fn bytes_to_path(bytes: Vec<u8>) -> io::Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(windows)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str()
        .encode_wide()
        .flat_map(|unit| unit.to_le_bytes())
        .collect()
}

#[cfg(windows)]
fn bytes_to_path(bytes: Vec<u8>) -> io::Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    if bytes.len() % 2 != 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "encoded path payload has an odd length",
        ));
    }

    let wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    Ok(PathBuf::from(OsString::from_wide(&wide)))
}
