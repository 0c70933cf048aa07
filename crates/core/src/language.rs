use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

/// 依副檔名選擇的語法標示模式。 / Syntax highlighting mode selected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Plain,
    Python,
    CLike,
    Rust,
    Markup,
    Markdown,
    Shell,
}

static EXTENSION_MAP: Lazy<HashMap<&'static str, Language>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for ext in ["py", "pyw", "pyi"] {
        map.insert(ext, Language::Python);
    }
    for ext in ["c", "h", "cc", "hh", "cpp", "hpp", "cxx", "hxx", "ino"] {
        map.insert(ext, Language::CLike);
    }
    map.insert("rs", Language::Rust);
    for ext in ["html", "htm", "xml", "xhtml", "svg"] {
        map.insert(ext, Language::Markup);
    }
    for ext in ["md", "markdown"] {
        map.insert(ext, Language::Markdown);
    }
    for ext in ["sh", "bash", "zsh"] {
        map.insert(ext, Language::Shell);
    }
    map
});

impl Language {
    /// 依副檔名（不含點號）選擇語言模式。 / Selects the language mode from an extension without the leading dot.
    pub fn from_extension(extension: &str) -> Self {
        let lowered = extension.to_ascii_lowercase();
        EXTENSION_MAP
            .get(lowered.as_str())
            .copied()
            .unwrap_or(Language::Plain)
    }

    /// 依完整路徑選擇語言模式。 / Selects the language mode from a full path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Plain)
    }

    /// 提供給外部編輯元件的語言標籤。 / Language tag handed to the external editing widget.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Plain => "plain",
            Language::Python => "python",
            Language::CLike => "clike",
            Language::Rust => "rust",
            Language::Markup => "markup",
            Language::Markdown => "markdown",
            Language::Shell => "shell",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Plain
    }
}
