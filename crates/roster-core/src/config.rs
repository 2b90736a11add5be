use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-level settings from `.roster/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Rows per page; 0 is treated as 1.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_subscriptions_path")]
    pub subscriptions: PathBuf,
    #[serde(default = "default_users_path")]
    pub users: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            subscriptions: default_subscriptions_path(),
            users: default_users_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// File holding the persisted query fragment.
    #[serde(default = "default_state_file")]
    pub file: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            file: default_state_file(),
        }
    }
}

/// Per-user settings from `<config_dir>/roster/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    /// `pretty`, `text` or `json`; `None` leaves the choice to TTY detection.
    pub resolved_output: Option<String>,
}

impl EffectiveConfig {
    /// Resolve a project-relative path against `project_root`.
    #[must_use]
    pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_root.join(path)
        }
    }
}

const fn default_page_size() -> usize {
    10
}

const fn default_debounce_ms() -> u64 {
    500
}

fn default_subscriptions_path() -> PathBuf {
    PathBuf::from("data/subscriptions.json")
}

fn default_users_path() -> PathBuf {
    PathBuf::from("data/users.json")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".roster/view")
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".roster/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("roster/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// `FORMAT` wins over the user preference; unknown values are ignored.
fn resolve_output(user_output: Option<&str>, env_format: Option<&str>) -> Option<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    env_format
        .and_then(normalize_output_mode)
        .or_else(|| user_output.and_then(normalize_output_mode))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = load_project_config(dir.path()).expect("load");
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.list.page_size, 10);
        assert_eq!(config.search.debounce(), Duration::from_millis(500));
        assert_eq!(config.state.file, PathBuf::from(".roster/view"));
    }

    #[test]
    fn partial_project_config_fills_defaults() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".roster")).expect("mkdir");
        std::fs::write(
            dir.path().join(".roster/config.toml"),
            "[list]\npage_size = 25\n\n[data]\nusers = \"fixtures/u.json\"\n",
        )
        .expect("write");

        let config = load_project_config(dir.path()).expect("load");
        assert_eq!(config.list.page_size, 25);
        assert_eq!(config.search.debounce_ms, 500);
        assert_eq!(config.data.users, PathBuf::from("fixtures/u.json"));
        assert_eq!(config.data.subscriptions, PathBuf::from("data/subscriptions.json"));
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".roster")).expect("mkdir");
        std::fs::write(dir.path().join(".roster/config.toml"), "[list\npage_size = ").expect("write");
        let err = load_project_config(dir.path()).expect_err("should fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn env_format_beats_user_preference() {
        assert_eq!(resolve_output(Some("text"), Some("JSON")), Some("json".to_string()));
        assert_eq!(resolve_output(Some("human"), None), Some("pretty".to_string()));
        assert_eq!(resolve_output(Some("text"), Some("yaml")), Some("text".to_string()));
        assert_eq!(resolve_output(None, None), None);
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let root = Path::new("/srv/dash");
        assert_eq!(
            EffectiveConfig::resolve_path(root, Path::new("data/u.json")),
            PathBuf::from("/srv/dash/data/u.json")
        );
        assert_eq!(
            EffectiveConfig::resolve_path(root, Path::new("/abs/u.json")),
            PathBuf::from("/abs/u.json")
        );
    }
}
