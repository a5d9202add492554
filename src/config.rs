//! Configuration loading for Dopamine.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.dopamine/config.toml`)
//! 3. User config (`~/.dopamine/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. Tiers, odds and thresholds default to the
//! values the reward formula was tuned with.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DopamineError, FailOpen, Result};
use crate::reward::{RewardItem, RewardKind};

/// Main configuration struct for Dopamine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Edit tracking configuration.
    pub tracking: TrackingConfig,
    /// Reward gate and magnitude tiers.
    pub thresholds: ThresholdConfig,
    /// Jackpot odds and bonus reward catalog.
    pub reward: RewardConfig,
}

/// Edit tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    /// Non-whitespace characters above which a single hunk counts as bulk
    /// (pasted or generated). Also caps the hunk length eligible for WPM.
    pub bulk_threshold: usize,
    /// File extensions whose saves never pay out.
    pub ignore_extensions: Vec<String>,
}

/// Minimum valid bulk threshold.
pub const MIN_BULK_THRESHOLD: usize = 1;

impl TrackingConfig {
    /// Check if a bulk threshold is valid (must be >= 1).
    ///
    /// A threshold of 0 would classify every keystroke as bulk.
    pub fn is_valid_bulk_threshold(value: usize) -> bool {
        value >= MIN_BULK_THRESHOLD
    }

    /// Whether saves of `path` are excluded from rewards.
    ///
    /// Editor settings files are always excluded.
    pub fn is_ignored(&self, path: &Path) -> bool {
        if path.file_name().and_then(|n| n.to_str()) == Some("settings.json") {
            return true;
        }
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(".{}", ext),
            None => return false,
        };
        self.ignore_extensions.iter().any(|ignored| *ignored == ext)
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            bulk_threshold: 50,
            ignore_extensions: vec![".json".to_string()],
        }
    }
}

/// A (lines, chars) pair; a tier is reached when either is exceeded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierThreshold {
    /// Effective lines that must be exceeded.
    pub lines: u64,
    /// Effective non-whitespace characters that must be exceeded.
    pub chars: u64,
}

impl TierThreshold {
    /// Create a tier threshold.
    pub const fn new(lines: u64, chars: u64) -> Self {
        Self { lines, chars }
    }
}

/// Reward gate and magnitude tier thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Saves adding fewer non-whitespace characters than this earn nothing.
    pub min_chars: u64,
    /// Medium tier.
    pub medium: TierThreshold,
    /// Large tier.
    pub large: TierThreshold,
    /// Epic tier.
    pub epic: TierThreshold,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_chars: 20,
            medium: TierThreshold::new(5, 100),
            large: TierThreshold::new(20, 500),
            epic: TierThreshold::new(50, 2000),
        }
    }
}

/// Jackpot odds and bonus reward catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewardConfig {
    /// Probability of a jackpot on a qualifying save.
    pub win_odds: f64,
    /// Bonus rewards drawn on a jackpot or a respin.
    pub catalog: Vec<RewardItem>,
}

impl RewardConfig {
    /// Check if a win_odds value is valid (must be in [0.0, 1.0] and finite).
    pub fn is_valid_win_odds(value: f64) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            win_odds: 0.1,
            catalog: vec![
                RewardItem::new(
                    RewardKind::Message,
                    "Stretch break",
                    "Stand up and stretch for two minutes.",
                ),
                RewardItem::new(RewardKind::Quote, "Programming quote", "programming"),
                RewardItem::new(RewardKind::Quote, "Motivation quote", "motivation"),
            ],
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.dopamine/config.toml` in cwd or an ancestor)
    /// 3. User config (`~/.dopamine/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.dopamine/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = dopamine_home()?;
        let config_path = home.join("config.toml");
        if !config_path.exists() {
            return None;
        }
        Self::load_from_file(&config_path)
            .map(Some)
            .fail_open_default("loading user config")
    }

    /// Load project config from `.dopamine/config.toml`.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let config_path = project_dopamine_dir(cwd).join("config.toml");
        if !config_path.exists() {
            return None;
        }
        Self::load_from_file(&config_path)
            .map(Some)
            .fail_open_default("loading project config")
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| DopamineError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| DopamineError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // DOPAMINE_BULK_THRESHOLD
        if let Ok(val) = env::var("DOPAMINE_BULK_THRESHOLD") {
            match val.parse::<usize>() {
                Ok(n) if TrackingConfig::is_valid_bulk_threshold(n) => {
                    self.tracking.bulk_threshold = n;
                }
                Ok(n) => tracing::warn!(
                    value = n,
                    minimum = MIN_BULK_THRESHOLD,
                    current = self.tracking.bulk_threshold,
                    "ignoring DOPAMINE_BULK_THRESHOLD below minimum"
                ),
                Err(_) => tracing::warn!(
                    value = %val,
                    current = self.tracking.bulk_threshold,
                    "ignoring DOPAMINE_BULK_THRESHOLD: expected a positive integer"
                ),
            }
        }

        // DOPAMINE_MIN_CHARS
        if let Ok(val) = env::var("DOPAMINE_MIN_CHARS") {
            match val.parse::<u64>() {
                Ok(n) => self.thresholds.min_chars = n,
                Err(_) => tracing::warn!(
                    value = %val,
                    current = self.thresholds.min_chars,
                    "ignoring DOPAMINE_MIN_CHARS: expected a non-negative integer"
                ),
            }
        }

        // DOPAMINE_WIN_ODDS
        if let Ok(val) = env::var("DOPAMINE_WIN_ODDS") {
            match val.parse::<f64>() {
                Ok(n) if RewardConfig::is_valid_win_odds(n) => self.reward.win_odds = n,
                Ok(n) => tracing::warn!(
                    value = n,
                    current = self.reward.win_odds,
                    "ignoring DOPAMINE_WIN_ODDS outside [0.0, 1.0]"
                ),
                Err(_) => tracing::warn!(
                    value = %val,
                    current = self.reward.win_odds,
                    "ignoring DOPAMINE_WIN_ODDS: expected a decimal number"
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field: every value in
    /// `other` that differs from the default replaces the value in `self`.
    ///
    /// # Limitation
    ///
    /// A higher layer cannot set a value back to its default to undo a
    /// lower layer's customization, because an explicit default is
    /// indistinguishable from an omitted field.
    fn merge(mut self, other: Config) -> Self {
        let default_tracking = TrackingConfig::default();
        if other.tracking.bulk_threshold != default_tracking.bulk_threshold {
            self.tracking.bulk_threshold = other.tracking.bulk_threshold;
        }
        if other.tracking.ignore_extensions != default_tracking.ignore_extensions {
            self.tracking.ignore_extensions = other.tracking.ignore_extensions;
        }

        let default_thresholds = ThresholdConfig::default();
        if other.thresholds.min_chars != default_thresholds.min_chars {
            self.thresholds.min_chars = other.thresholds.min_chars;
        }
        if other.thresholds.medium != default_thresholds.medium {
            self.thresholds.medium = other.thresholds.medium;
        }
        if other.thresholds.large != default_thresholds.large {
            self.thresholds.large = other.thresholds.large;
        }
        if other.thresholds.epic != default_thresholds.epic {
            self.thresholds.epic = other.thresholds.epic;
        }

        let default_reward = RewardConfig::default();
        if other.reward.win_odds != default_reward.win_odds {
            self.reward.win_odds = other.reward.win_odds;
        }
        if other.reward.catalog != default_reward.catalog {
            self.reward.catalog = other.reward.catalog;
        }

        self
    }
}

/// Get the Dopamine home directory.
///
/// Checks `DOPAMINE_HOME` first, then falls back to `~/.dopamine`.
/// An empty `DOPAMINE_HOME` is ignored.
pub fn dopamine_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("DOPAMINE_HOME") {
        if home.is_empty() {
            tracing::warn!("DOPAMINE_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("DOPAMINE_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".dopamine"));
    }

    let fallback_path = env::temp_dir().join("dopamine");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Find the project root for a given working directory.
///
/// The nearest ancestor (including `cwd`) holding a `.dopamine/` directory
/// wins; otherwise `cwd` itself.
pub fn find_project_root(cwd: &Path) -> PathBuf {
    for ancestor in cwd.ancestors() {
        if ancestor.join(".dopamine").is_dir() {
            return ancestor.to_path_buf();
        }
    }
    cwd.to_path_buf()
}

/// Get the project `.dopamine/` directory for a working directory.
pub fn project_dopamine_dir(cwd: &Path) -> PathBuf {
    find_project_root(cwd).join(".dopamine")
}

/// Directory holding the monthly transaction journals.
///
/// Returns `<dopamine_home>/ledger/`.
pub fn ledger_dir() -> Option<PathBuf> {
    dopamine_home().map(|h| h.join("ledger"))
}

/// Path of the durable wallet state.
///
/// Returns `<dopamine_home>/wallet.json`.
pub fn wallet_path() -> Option<PathBuf> {
    dopamine_home().map(|h| h.join("wallet.json"))
}

/// Path of the crash log written by the CLI panic hook.
pub fn crash_log_path() -> Option<PathBuf> {
    dopamine_home().map(|h| h.join("crash.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.tracking.bulk_threshold, 50);
        assert_eq!(config.tracking.ignore_extensions, vec![".json"]);

        assert_eq!(config.thresholds.min_chars, 20);
        assert_eq!(config.thresholds.medium, TierThreshold::new(5, 100));
        assert_eq!(config.thresholds.large, TierThreshold::new(20, 500));
        assert_eq!(config.thresholds.epic, TierThreshold::new(50, 2000));

        assert!((config.reward.win_odds - 0.1).abs() < f64::EPSILON);
        assert!(!config.reward.catalog.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[thresholds]
min_chars = 40

[thresholds.medium]
lines = 8
chars = 150

[reward]
win_odds = 0.25
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.thresholds.min_chars, 40);
        assert_eq!(config.thresholds.medium, TierThreshold::new(8, 150));
        assert!((config.reward.win_odds - 0.25).abs() < f64::EPSILON);

        // Unspecified fields keep defaults
        assert_eq!(config.thresholds.large, TierThreshold::new(20, 500));
        assert_eq!(config.tracking.bulk_threshold, 50);
    }

    #[test]
    fn test_load_catalog_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[[reward.catalog]]
type = "url"
label = "Coffee"
content = "https://example.com/coffee"
weight = 3.0

[[reward.catalog]]
type = "message"
label = "Walk"
content = "Take a walk."
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.reward.catalog.len(), 2);
        assert_eq!(config.reward.catalog[0].kind, RewardKind::Url);
        assert_eq!(config.reward.catalog[0].weight, Some(3.0));
        assert_eq!(config.reward.catalog[1].weight, None);
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(DopamineError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        let home = TempDir::new().unwrap();
        env::set_var("DOPAMINE_HOME", home.path());
        fs::write(
            home.path().join("config.toml"),
            "[thresholds]\nmin_chars = 30\n\n[tracking]\nbulk_threshold = 80\n",
        )
        .unwrap();

        let project = TempDir::new().unwrap();
        let dot_dir = project.path().join(".dopamine");
        fs::create_dir_all(&dot_dir).unwrap();
        fs::write(dot_dir.join("config.toml"), "[thresholds]\nmin_chars = 10\n").unwrap();

        let config = Config::load_from_cwd(project.path());

        // Project beats user
        assert_eq!(config.thresholds.min_chars, 10);
        // User value survives where the project is silent
        assert_eq!(config.tracking.bulk_threshold, 80);

        env::remove_var("DOPAMINE_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        let project = TempDir::new().unwrap();
        let dot_dir = project.path().join(".dopamine");
        fs::create_dir_all(&dot_dir).unwrap();
        fs::write(dot_dir.join("config.toml"), "[reward]\nwin_odds = 0.5\n").unwrap();

        env::set_var("DOPAMINE_WIN_ODDS", "0.75");
        let config = Config::load_from_cwd(project.path());
        assert!((config.reward.win_odds - 0.75).abs() < f64::EPSILON);
        env::remove_var("DOPAMINE_WIN_ODDS");
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        env::set_var("DOPAMINE_BULK_THRESHOLD", "120");
        env::set_var("DOPAMINE_MIN_CHARS", "5");
        env::set_var("DOPAMINE_WIN_ODDS", "0.02");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.tracking.bulk_threshold, 120);
        assert_eq!(config.thresholds.min_chars, 5);
        assert!((config.reward.win_odds - 0.02).abs() < f64::EPSILON);

        env::remove_var("DOPAMINE_BULK_THRESHOLD");
        env::remove_var("DOPAMINE_MIN_CHARS");
        env::remove_var("DOPAMINE_WIN_ODDS");
    }

    #[test]
    #[serial]
    fn test_env_var_invalid_values_ignored() {
        env::set_var("DOPAMINE_BULK_THRESHOLD", "0");
        env::set_var("DOPAMINE_MIN_CHARS", "lots");
        env::set_var("DOPAMINE_WIN_ODDS", "1.5");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.tracking.bulk_threshold, 50);
        assert_eq!(config.thresholds.min_chars, 20);
        assert!((config.reward.win_odds - 0.1).abs() < f64::EPSILON);

        env::remove_var("DOPAMINE_BULK_THRESHOLD");
        env::remove_var("DOPAMINE_MIN_CHARS");
        env::remove_var("DOPAMINE_WIN_ODDS");
    }

    #[test]
    #[serial]
    fn test_env_var_nan_win_odds_ignored() {
        env::set_var("DOPAMINE_WIN_ODDS", "NaN");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert!((config.reward.win_odds - 0.1).abs() < f64::EPSILON);
        env::remove_var("DOPAMINE_WIN_ODDS");
    }

    #[test]
    fn test_is_valid_win_odds() {
        assert!(RewardConfig::is_valid_win_odds(0.0));
        assert!(RewardConfig::is_valid_win_odds(1.0));
        assert!(RewardConfig::is_valid_win_odds(0.1));
        assert!(!RewardConfig::is_valid_win_odds(-0.1));
        assert!(!RewardConfig::is_valid_win_odds(1.01));
        assert!(!RewardConfig::is_valid_win_odds(f64::INFINITY));
    }

    #[test]
    fn test_is_valid_bulk_threshold() {
        assert!(!TrackingConfig::is_valid_bulk_threshold(0));
        assert!(TrackingConfig::is_valid_bulk_threshold(1));
        assert!(TrackingConfig::is_valid_bulk_threshold(50));
    }

    #[test]
    fn test_is_ignored() {
        let tracking = TrackingConfig::default();
        assert!(tracking.is_ignored(Path::new("/project/package.json")));
        assert!(!tracking.is_ignored(Path::new("/project/DATA.JSON")));
        assert!(tracking.is_ignored(Path::new("/home/u/.config/Code/User/settings.json")));
        assert!(!tracking.is_ignored(Path::new("/project/src/main.rs")));
        assert!(!tracking.is_ignored(Path::new("/project/Makefile")));
    }

    #[test]
    fn test_is_ignored_custom_extensions() {
        let tracking = TrackingConfig {
            ignore_extensions: vec![".md".to_string(), ".lock".to_string()],
            ..TrackingConfig::default()
        };
        assert!(tracking.is_ignored(Path::new("README.md")));
        assert!(tracking.is_ignored(Path::new("Cargo.lock")));
        assert!(!tracking.is_ignored(Path::new("package.json")));
        // settings.json stays excluded regardless
        assert!(tracking.is_ignored(Path::new("settings.json")));
    }

    #[test]
    fn test_merge_field_by_field_preserves_non_default_values() {
        let base = Config {
            thresholds: ThresholdConfig {
                min_chars: 35,
                ..ThresholdConfig::default()
            },
            ..Config::default()
        };

        let override_config = Config {
            thresholds: ThresholdConfig {
                epic: TierThreshold::new(100, 5000),
                ..ThresholdConfig::default()
            },
            reward: RewardConfig {
                win_odds: 0.3,
                ..RewardConfig::default()
            },
            ..Config::default()
        };

        let merged = base.merge(override_config);

        assert_eq!(merged.thresholds.min_chars, 35);
        assert_eq!(merged.thresholds.epic, TierThreshold::new(100, 5000));
        assert!((merged.reward.win_odds - 0.3).abs() < f64::EPSILON);
        assert_eq!(merged.reward.catalog, RewardConfig::default().catalog);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[tracking]\nbulk_threshold = 10\n").unwrap();
        assert_eq!(config.tracking.bulk_threshold, 10);
        assert_eq!(config.tracking.ignore_extensions, vec![".json"]);
        assert_eq!(config.thresholds, ThresholdConfig::default());
    }

    #[test]
    fn test_full_toml_roundtrip() {
        let config = Config {
            tracking: TrackingConfig {
                bulk_threshold: 30,
                ignore_extensions: vec![".lock".to_string()],
            },
            thresholds: ThresholdConfig {
                min_chars: 15,
                medium: TierThreshold::new(3, 60),
                large: TierThreshold::new(10, 300),
                epic: TierThreshold::new(40, 1200),
            },
            reward: RewardConfig {
                win_odds: 0.05,
                catalog: vec![RewardItem::new(RewardKind::Image, "Cat", "https://example.com/cat.png")
                    .with_weight(2.0)],
            },
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    #[serial]
    fn test_dopamine_home_with_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("DOPAMINE_HOME", dir.path().to_str().unwrap());

        assert_eq!(dopamine_home().unwrap(), dir.path());
        assert_eq!(ledger_dir().unwrap(), dir.path().join("ledger"));
        assert_eq!(wallet_path().unwrap(), dir.path().join("wallet.json"));
        assert_eq!(crash_log_path().unwrap(), dir.path().join("crash.log"));

        env::remove_var("DOPAMINE_HOME");
    }

    #[test]
    #[serial]
    fn test_dopamine_home_empty_env() {
        env::set_var("DOPAMINE_HOME", "");
        let home = dopamine_home();
        assert!(home.is_some());
        assert!(home.unwrap().ends_with("dopamine") || dirs::home_dir().is_some());
        env::remove_var("DOPAMINE_HOME");
    }

    #[test]
    fn test_find_project_root_in_parent() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".dopamine")).unwrap();
        let nested = dir.path().join("src").join("module");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), dir.path());
        assert_eq!(project_dopamine_dir(&nested), dir.path().join(".dopamine"));
    }

    #[test]
    fn test_find_project_root_fallback_to_cwd() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("plain");
        fs::create_dir_all(&nested).unwrap();

        // TempDir ancestors (e.g. /tmp) do not normally hold .dopamine
        if !nested.ancestors().any(|a| a.join(".dopamine").is_dir()) {
            assert_eq!(find_project_root(&nested), nested);
        }
    }
}
