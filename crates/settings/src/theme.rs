use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 預設主題名稱。 / Name of the default theme.
pub const DEFAULT_THEME: &str = "light";

/// 解析色彩字串失敗的原因。 / Reasons a colour string fails to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("colour value must start with '#'")]
    MissingHash,
    #[error("colour value must have 3 or 6 hex digits")]
    BadLength,
    #[error("colour value contains a non-hex digit")]
    BadDigit,
}

/// RGB 色彩值。 / An RGB colour value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// 解析 `#rgb` 或 `#rrggbb` 格式的色彩。 / Parses a colour in `#rgb` or `#rrggbb` form.
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let digits = input
            .strip_prefix('#')
            .ok_or(ColorParseError::MissingHash)?;
        let expanded = match digits.len() {
            3 => {
                let mut full = String::with_capacity(6);
                for ch in digits.chars() {
                    full.push(ch);
                    full.push(ch);
                }
                full
            }
            6 => digits.to_string(),
            _ => return Err(ColorParseError::BadLength),
        };
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16).map_err(|_| ColorParseError::BadDigit)
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

/// 主題的明暗分類。 / Light or dark classification of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    Light,
    Dark,
}

/// 各介面角色對應的色彩字串。 / Hex colour strings per surface role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub window_background: String,
    pub window_text: String,
    pub editor_background: String,
    pub editor_text: String,
    pub tree_background: String,
    pub tree_text: String,
    pub tab_idle_background: String,
    pub tab_idle_text: String,
    pub tab_selected_background: String,
    pub tab_selected_text: String,
    pub status_background: String,
    pub status_text: String,
}

/// 解析完成、可直接套用的主題色盤。 / Fully parsed palette ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPalette {
    pub window_background: Color,
    pub window_text: Color,
    pub editor_background: Color,
    pub editor_text: Color,
    pub tree_background: Color,
    pub tree_text: Color,
    pub tab_idle_background: Color,
    pub tab_idle_text: Color,
    pub tab_selected_background: Color,
    pub tab_selected_text: Color,
    pub status_background: Color,
    pub status_text: Color,
}

/// 載入或驗證主題時可能發生的錯誤。 / Errors raised while loading or validating a theme.
#[derive(Debug, Error)]
pub enum ThemeLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid theme payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid colour for {role}: {source}")]
    InvalidColor {
        role: &'static str,
        #[source]
        source: ColorParseError,
    },
}

/// 一個具名主題：名稱、明暗分類與色盤。 / A named theme: name, kind, and palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDefinition {
    pub name: String,
    pub kind: ThemeKind,
    pub palette: ThemePalette,
}

impl ThemeDefinition {
    pub fn builtin_light() -> Self {
        Self {
            name: "light".into(),
            kind: ThemeKind::Light,
            palette: ThemePalette {
                window_background: "#ffffff".into(),
                window_text: "#222".into(),
                editor_background: "#f8f8f8".into(),
                editor_text: "#222".into(),
                tree_background: "#f8f8f8".into(),
                tree_text: "#222".into(),
                tab_idle_background: "#f0f0f0".into(),
                tab_idle_text: "#222".into(),
                tab_selected_background: "#e0e0e0".into(),
                tab_selected_text: "#111".into(),
                status_background: "#f0f0f0".into(),
                status_text: "#222".into(),
            },
        }
    }

    pub fn builtin_dark() -> Self {
        Self {
            name: "dark".into(),
            kind: ThemeKind::Dark,
            palette: ThemePalette {
                window_background: "#232629".into(),
                window_text: "#bbb".into(),
                editor_background: "#181a1b".into(),
                editor_text: "#ddd".into(),
                tree_background: "#181a1b".into(),
                tree_text: "#ddd".into(),
                tab_idle_background: "#232629".into(),
                tab_idle_text: "#bbb".into(),
                tab_selected_background: "#181a1b".into(),
                tab_selected_text: "#fff".into(),
                status_background: "#232629".into(),
                status_text: "#bbb".into(),
            },
        }
    }

    pub fn builtin_light_blue() -> Self {
        Self {
            name: "light blue".into(),
            kind: ThemeKind::Light,
            palette: ThemePalette {
                window_background: "#e6f2fb".into(),
                window_text: "#1a3d5c".into(),
                editor_background: "#f7fbff".into(),
                editor_text: "#1a3d5c".into(),
                tree_background: "#d9ecfa".into(),
                tree_text: "#1a3d5c".into(),
                tab_idle_background: "#b3d8f8".into(),
                tab_idle_text: "#1a3d5c".into(),
                tab_selected_background: "#73baf7".into(),
                tab_selected_text: "#fff".into(),
                status_background: "#b3d8f8".into(),
                status_text: "#1a3d5c".into(),
            },
        }
    }

    /// 從 JSON 檔案載入主題並驗證色盤。 / Loads a theme from a JSON file and validates its palette.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ThemeLoadError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let definition: ThemeDefinition = serde_json::from_str(&contents)?;
        definition.validate()?;
        Ok(definition)
    }

    /// 解析所有角色色彩。 / Resolves every role colour.
    pub fn resolve(&self) -> Result<ResolvedPalette, ThemeLoadError> {
        let parse = |role: &'static str, value: &str| {
            Color::from_hex(value).map_err(|source| ThemeLoadError::InvalidColor { role, source })
        };
        let palette = &self.palette;
        Ok(ResolvedPalette {
            window_background: parse("window_background", &palette.window_background)?,
            window_text: parse("window_text", &palette.window_text)?,
            editor_background: parse("editor_background", &palette.editor_background)?,
            editor_text: parse("editor_text", &palette.editor_text)?,
            tree_background: parse("tree_background", &palette.tree_background)?,
            tree_text: parse("tree_text", &palette.tree_text)?,
            tab_idle_background: parse("tab_idle_background", &palette.tab_idle_background)?,
            tab_idle_text: parse("tab_idle_text", &palette.tab_idle_text)?,
            tab_selected_background: parse(
                "tab_selected_background",
                &palette.tab_selected_background,
            )?,
            tab_selected_text: parse("tab_selected_text", &palette.tab_selected_text)?,
            status_background: parse("status_background", &palette.status_background)?,
            status_text: parse("status_text", &palette.status_text)?,
        })
    }

    pub fn validate(&self) -> Result<(), ThemeLoadError> {
        self.resolve().map(|_| ())
    }
}

static BUILTIN_THEMES: Lazy<Vec<ThemeDefinition>> = Lazy::new(|| {
    vec![
        ThemeDefinition::builtin_light(),
        ThemeDefinition::builtin_dark(),
        ThemeDefinition::builtin_light_blue(),
    ]
});

/// 具名主題的註冊表；程序中永遠恰有一個現用主題。 / Registry of named themes; exactly one theme is current at any time.
#[derive(Debug)]
pub struct ThemeRegistry {
    themes: BTreeMap<String, ThemeDefinition>,
    current: String,
}

impl ThemeRegistry {
    /// 建立含內建主題的註冊表，現用主題為預設值。 / Creates a registry seeded with the built-in themes and the default current theme.
    pub fn with_builtins() -> Self {
        let mut themes = BTreeMap::new();
        for theme in BUILTIN_THEMES.iter() {
            themes.insert(theme.name.clone(), theme.clone());
        }
        Self {
            themes,
            current: DEFAULT_THEME.to_string(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&ThemeDefinition> {
        self.themes.get(name)
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn current_definition(&self) -> &ThemeDefinition {
        // 現用名稱必定存在於註冊表中。 / The current name always resolves inside the registry.
        self.themes
            .get(&self.current)
            .unwrap_or_else(|| &BUILTIN_THEMES[0])
    }

    /// 切換現用主題；未知名稱僅記錄警告並維持原狀。 / Switches the current theme; an unknown name logs a warning and keeps the current one.
    pub fn set_current(&mut self, name: &str) -> bool {
        if self.themes.contains_key(name) {
            self.current = name.to_string();
            true
        } else {
            log::warn!("theme '{name}' not found; keeping '{}'", self.current);
            false
        }
    }

    /// 註冊（或覆蓋）一個已驗證的主題。 / Registers (or replaces) a validated theme.
    pub fn register(&mut self, definition: ThemeDefinition) -> Result<(), ThemeLoadError> {
        definition.validate()?;
        self.themes.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// 從 JSON 檔案載入並註冊主題，回傳主題名稱。 / Loads a theme from JSON and registers it, returning the theme name.
    pub fn register_from_file(&mut self, path: impl AsRef<Path>) -> Result<String, ThemeLoadError> {
        let definition = ThemeDefinition::from_file(path)?;
        let name = definition.name.clone();
        self.themes.insert(name.clone(), definition);
        Ok(name)
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(
            Color::from_hex("#1a3d5c").unwrap(),
            Color {
                r: 0x1A,
                g: 0x3D,
                b: 0x5C
            }
        );
        assert_eq!(
            Color::from_hex("#222").unwrap(),
            Color {
                r: 0x22,
                g: 0x22,
                b: 0x22
            }
        );
    }

    #[test]
    fn rejects_malformed_colours() {
        assert_eq!(Color::from_hex("222").unwrap_err(), ColorParseError::MissingHash);
        assert_eq!(Color::from_hex("#22").unwrap_err(), ColorParseError::BadLength);
        assert_eq!(Color::from_hex("#zzzzzz").unwrap_err(), ColorParseError::BadDigit);
    }

    #[test]
    fn builtins_resolve_cleanly() {
        for theme in [
            ThemeDefinition::builtin_light(),
            ThemeDefinition::builtin_dark(),
            ThemeDefinition::builtin_light_blue(),
        ] {
            theme.validate().unwrap();
        }
    }

    #[test]
    fn registry_starts_on_the_default_theme() {
        let registry = ThemeRegistry::with_builtins();
        assert_eq!(registry.current(), DEFAULT_THEME);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["dark", "light", "light blue"]);
    }

    #[test]
    fn unknown_theme_keeps_current() {
        let mut registry = ThemeRegistry::with_builtins();
        registry.set_current("dark");
        assert!(!registry.set_current("solarized"));
        assert_eq!(registry.current(), "dark");
    }

    #[test]
    fn switch_to_known_theme() {
        let mut registry = ThemeRegistry::with_builtins();
        assert!(registry.set_current("light blue"));
        assert_eq!(registry.current_definition().name, "light blue");
    }

    #[test]
    fn register_rejects_invalid_palettes() {
        let mut registry = ThemeRegistry::with_builtins();
        let mut theme = ThemeDefinition::builtin_light();
        theme.name = "broken".into();
        theme.palette.editor_background = "not-a-colour".into();
        assert!(registry.register(theme).is_err());
        assert!(registry.get("broken").is_none());
    }

    #[test]
    fn theme_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let mut theme = ThemeDefinition::builtin_dark();
        theme.name = "midnight".into();
        std::fs::write(&path, serde_json::to_string_pretty(&theme).unwrap()).unwrap();

        let mut registry = ThemeRegistry::with_builtins();
        let name = registry.register_from_file(&path).unwrap();
        assert_eq!(name, "midnight");
        assert!(registry.set_current("midnight"));
    }
}
