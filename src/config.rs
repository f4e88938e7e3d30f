use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::quiz::{self, GameMode, QUESTION_COUNTS};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_question_count")]
    pub question_count: u32,
    #[serde(default = "default_game_mode")]
    pub game_mode: String,
    /// `bundled`, a file path, or an http(s) URL.
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_dataset")]
    pub enrichment: String,
    #[serde(default = "default_metadata_lookup")]
    pub metadata_lookup: bool,
    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_question_count() -> u32 {
    quiz::DEFAULT_QUESTION_COUNT
}
fn default_game_mode() -> String {
    GameMode::Names.as_str().to_string()
}
fn default_dataset() -> String {
    "bundled".to_string()
}
fn default_metadata_lookup() -> bool {
    true
}
fn default_advance_delay_ms() -> u64 {
    quiz::DEFAULT_ADVANCE_DELAY.as_millis() as u64
}
fn default_log_file() -> String {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("globequiz")
        .join("globequiz.log")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            question_count: default_question_count(),
            game_mode: default_game_mode(),
            dataset: default_dataset(),
            enrichment: default_dataset(),
            metadata_lookup: default_metadata_lookup(),
            advance_delay_ms: default_advance_delay_ms(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("globequiz")
            .join("config.toml")
    }

    pub fn game_mode(&self) -> GameMode {
        GameMode::parse(&self.game_mode).unwrap_or_default()
    }

    /// Snap values from hand-edited or stale files back into range.
    pub fn normalize(&mut self) {
        if !QUESTION_COUNTS.contains(&self.question_count) {
            self.question_count = quiz::nearest_question_count(self.question_count);
        }
        if GameMode::parse(&self.game_mode).is_none() {
            self.game_mode = default_game_mode();
        }
        if self.dataset.trim().is_empty() {
            self.dataset = default_dataset();
        }
        if self.enrichment.trim().is_empty() {
            self.enrichment = default_dataset();
        }
        self.advance_delay_ms = self.advance_delay_ms.min(10_000);
    }

    pub fn cycle_question_count(&mut self, forward: bool) {
        let idx = QUESTION_COUNTS
            .iter()
            .position(|&c| c == self.question_count)
            .unwrap_or(0);
        let len = QUESTION_COUNTS.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.question_count = QUESTION_COUNTS[next];
    }

    pub fn cycle_game_mode(&mut self) {
        self.game_mode = self.game_mode().next().as_str().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.question_count, 10);
        assert_eq!(config.game_mode(), GameMode::Names);
        assert_eq!(config.dataset, "bundled");
        assert!(config.metadata_lookup);
        assert_eq!(config.advance_delay_ms, 1000);
        assert!(config.log_file.ends_with("globequiz.log"));
    }

    #[test]
    fn test_config_serde_partial_fields() {
        let toml_str = r#"
theme = "catppuccin-mocha"
question_count = 30
game_mode = "capitals"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.question_count, 30);
        assert_eq!(config.game_mode(), GameMode::Capitals);
        assert_eq!(config.enrichment, "bundled");
    }

    #[test]
    fn test_normalize_snaps_question_count_and_mode() {
        let mut config = Config {
            question_count: 23,
            game_mode: "flags".to_string(),
            dataset: "  ".to_string(),
            ..Config::default()
        };
        config.normalize();
        assert_eq!(config.question_count, 20);
        assert_eq!(config.game_mode, "names");
        assert_eq!(config.dataset, "bundled");
    }

    #[test]
    fn test_cycle_question_count_wraps() {
        let mut config = Config {
            question_count: 50,
            ..Config::default()
        };
        config.cycle_question_count(true);
        assert_eq!(config.question_count, 5);
        config.cycle_question_count(false);
        assert_eq!(config.question_count, 50);
        config.cycle_game_mode();
        assert_eq!(config.game_mode(), GameMode::Capitals);
    }

    #[test]
    fn test_save_and_load_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            question_count: 40,
            metadata_lookup: false,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.question_count, 40);
        assert!(!loaded.metadata_lookup);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.question_count, 10);
    }

    #[test]
    fn test_load_normalizes_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "question_count = 7\nadvance_delay_ms = 99999\n").unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.question_count, 5);
        assert_eq!(loaded.advance_delay_ms, 10_000);
    }
}
