use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// 最近檔案清單的預設容量。 / Default capacity of the recent-files list.
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// 管理最近開啟檔案的有界清單，最新的排在最前面。 / Bounded most-recently-used list of opened files, newest first.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    capacity: usize,
    entries: VecDeque<PathBuf>,
}

impl RecentFiles {
    /// 建立指定容量的清單（最小為 1）。 / Creates a list with the given capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// 從持久化資料還原清單，超出容量的尾端項目被截斷。 / Restores the list from persisted entries, truncating any overflow.
    pub fn with_entries(capacity: usize, entries: Vec<PathBuf>) -> Self {
        let mut list = Self::new(capacity);
        for path in entries {
            if !list.entries.contains(&path) {
                list.entries.push_back(path);
            }
        }
        list.entries.truncate(list.capacity);
        list
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 新增路徑；既有項目會被提升到最前端而非重複。 / Records a path; an existing entry is promoted instead of duplicated.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.entries.retain(|existing| existing != &path);
        self.entries.push_front(path);
        self.entries.truncate(self.capacity);
    }

    /// 移除指定路徑；若存在則回傳 `true`。 / Removes a path, returning `true` when it was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|existing| existing.as_path() != path);
        before != self.entries.len()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|existing| existing == path)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &RecentFiles) -> Vec<String> {
        list.iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn re_adding_promotes_instead_of_duplicating() {
        let mut recent = RecentFiles::new(5);
        recent.add("a.txt");
        recent.add("b.txt");
        recent.add("a.txt");

        assert_eq!(names(&recent), vec!["a.txt", "b.txt"]);
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn overflow_evicts_the_oldest_entries() {
        let capacity = DEFAULT_RECENT_CAPACITY;
        let mut recent = RecentFiles::default();
        for i in 0..capacity + 3 {
            recent.add(format!("file-{i}.txt"));
        }

        assert_eq!(recent.len(), capacity);
        // 留下的是最新的 capacity 筆，最新在前。 / The newest `capacity` entries survive, newest first.
        let expected: Vec<String> = (3..capacity + 3)
            .rev()
            .map(|i| format!("file-{i}.txt"))
            .collect();
        assert_eq!(names(&recent), expected);
    }

    #[test]
    fn capacity_has_a_floor_of_one() {
        let mut recent = RecentFiles::new(0);
        recent.add("x");
        recent.add("y");
        assert_eq!(names(&recent), vec!["y"]);
    }

    #[test]
    fn remove_and_contains() {
        let mut recent = RecentFiles::new(3);
        recent.add("x");
        assert!(recent.contains(Path::new("x")));
        assert!(recent.remove(Path::new("x")));
        assert!(!recent.remove(Path::new("x")));
        assert!(recent.is_empty());
    }

    #[test]
    fn with_entries_truncates_and_deduplicates() {
        let entries = ["a", "b", "a", "c", "d"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let recent = RecentFiles::with_entries(3, entries);
        assert_eq!(names(&recent), vec!["a", "b", "c"]);
    }
}
