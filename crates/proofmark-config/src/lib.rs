use proofmark_engine::scanning::{FindingPattern, LexicalOptions, builtin_patterns};
use proofmark_engine::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid pattern file glob {pattern:?}: {source}")]
    PatternGlobError {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to list pattern files: {0}")]
    PatternListError(#[from] glob::GlobError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub case_insensitive: bool,
    /// Bytes of surrounding text shown with each finding
    pub context_radius: usize,
    pub rescan_on_edit: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        let lexical = LexicalOptions::default();
        Self {
            case_insensitive: lexical.case_insensitive,
            context_radius: lexical.context_radius,
            rescan_on_edit: true,
        }
    }
}

/// Contents of a file listed in `extra_patterns`
#[derive(Debug, Default, Serialize, Deserialize)]
struct PatternFile {
    #[serde(default)]
    patterns: Vec<FindingPattern>,
}

/// A missing `patterns` key means the built-in list; `patterns = []` means none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Globs naming more TOML files with `[[patterns]]` tables.
    /// `~` and `$VARS` are expanded, relative globs start at the config file's directory.
    pub extra_patterns: Vec<String>,
    pub scan: ScanSettings,
    pub patterns: Vec<FindingPattern>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extra_patterns: Vec::new(),
            scan: ScanSettings::default(),
            patterns: builtin_patterns(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let mut config: Config = read_toml(config_path)?;

        let base_dir = config_path.parent().unwrap_or(Path::new("."));
        for pattern in &config.extra_patterns {
            let files = Self::expand_glob(base_dir, pattern)?;
            for file in files {
                let extra: PatternFile = read_toml(&file)?;
                log::debug!(
                    "loaded {} pattern(s) from {}",
                    extra.patterns.len(),
                    file.display()
                );
                config.patterns.extend(extra.patterns);
            }
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/proofmark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Settings for a new editing session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            patterns: self.patterns.clone(),
            lexical: LexicalOptions {
                case_insensitive: self.scan.case_insensitive,
                context_radius: self.scan.context_radius,
            },
            rescan_on_edit: self.scan.rescan_on_edit,
        }
    }

    fn expand_path(path: &str) -> Option<String> {
        match shellexpand::full(path) {
            Ok(expanded) => Some(expanded.into_owned()),
            Err(_) => None,
        }
    }

    /// Files matching `pattern`, sorted so load order is stable
    fn expand_glob(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
        let expanded = Self::expand_path(pattern).unwrap_or_else(|| pattern.to_string());
        let full = if Path::new(&expanded).is_absolute() {
            expanded
        } else {
            base_dir.join(&expanded).to_string_lossy().into_owned()
        };

        let paths = glob::glob(&full).map_err(|source| ConfigError::PatternGlobError {
            pattern: pattern.to_string(),
            source,
        })?;
        let mut files = paths.collect::<Result<Vec<_>, _>>()?;
        files.sort();
        Ok(files)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigReadError {
        config_path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
        config_path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proofmark_engine::AnnotationKind;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/proofmark/config.toml"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.patterns.is_empty());
    }

    #[test]
    fn test_patterns_and_settings_from_toml() {
        let config: Config = toml::from_str(
            r#"
[scan]
case_insensitive = true

[[patterns]]
phrase = "irregardless"
kind = "grammar"
suggestion = "regardless"
explanation = "not a standard word"

[[patterns]]
phrase = "wierd"
kind = "spelling"
suggestion = "weird"
"#,
        )
        .unwrap();

        assert!(config.scan.case_insensitive);
        assert_eq!(config.scan.context_radius, 24);
        assert!(config.scan.rescan_on_edit);
        assert_eq!(
            config.patterns,
            vec![
                FindingPattern::grammar("irregardless", "regardless")
                    .with_explanation("not a standard word"),
                FindingPattern::spelling("wierd", "weird"),
            ]
        );
    }

    #[test]
    fn test_explicitly_empty_patterns() {
        let config: Config = toml::from_str("patterns = []").unwrap();
        assert!(config.patterns.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "[[patterns]]\nphrase = \"x\"\nkind = \"style\"\nsuggestion = \"y\"\n",
        )
        .unwrap();

        let result = Config::load_from_path(&config_file);
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            extra_patterns: Vec::new(),
            scan: ScanSettings {
                case_insensitive: true,
                context_radius: 10,
                rescan_on_edit: false,
            },
            patterns: vec![FindingPattern::spelling("teh", "the")],
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_extra_pattern_files_are_appended() {
        let temp_dir = TempDir::new().unwrap();
        let extra_dir = temp_dir.path().join("patterns");
        std::fs::create_dir_all(&extra_dir).unwrap();
        std::fs::write(
            extra_dir.join("b.toml"),
            "[[patterns]]\nphrase = \"wierd\"\nkind = \"spelling\"\nsuggestion = \"weird\"\n",
        )
        .unwrap();
        std::fs::write(
            extra_dir.join("a.toml"),
            "[[patterns]]\nphrase = \"alright\"\nkind = \"grammar\"\nsuggestion = \"all right\"\n",
        )
        .unwrap();
        std::fs::write(extra_dir.join("notes.txt"), "ignored").unwrap();

        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "extra_patterns = [\"patterns/*.toml\"]\npatterns = []\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let phrases: Vec<_> = config.patterns.iter().map(|p| p.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["alright", "wierd"]);
        assert_eq!(config.patterns[0].kind, AnnotationKind::Grammar);
    }

    #[test]
    fn test_extra_patterns_with_env_var() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("extra.toml"),
            "[[patterns]]\nphrase = \"wierd\"\nkind = \"spelling\"\nsuggestion = \"weird\"\n",
        )
        .unwrap();
        unsafe {
            env::set_var("PROOFMARK_TEST_PATTERNS", temp_dir.path());
        }

        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "extra_patterns = [\"$PROOFMARK_TEST_PATTERNS/extra.toml\"]\npatterns = []\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(config.patterns.len(), 1);

        unsafe {
            env::remove_var("PROOFMARK_TEST_PATTERNS");
        }
    }

    #[test]
    fn test_bad_glob_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "extra_patterns = [\"[\"]\n").unwrap();

        let result = Config::load_from_path(&config_file);
        assert!(matches!(result, Err(ConfigError::PatternGlobError { .. })));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path("~/test/path").unwrap();

        assert!(!expanded.starts_with('~'));
        assert!(expanded.contains("test/path"));
    }

    #[test]
    fn test_session_config_carries_settings() {
        let config = Config {
            scan: ScanSettings {
                case_insensitive: true,
                context_radius: 8,
                rescan_on_edit: false,
            },
            ..Config::default()
        };

        let session_config = config.session_config();
        assert!(session_config.lexical.case_insensitive);
        assert_eq!(session_config.lexical.context_radius, 8);
        assert!(!session_config.rescan_on_edit);
        assert_eq!(session_config.patterns, config.patterns);
    }
}
