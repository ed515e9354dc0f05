use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::session::SortMode;

const CONFIG_ENV: &str = "CCS_CONFIG";
const CLAUDE_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub projects_dir: Option<String>,
    pub state_dir: Option<String>,
    pub assistant: String,
    pub poll_interval_ms: u64,
    pub status_frames: u16,
    pub sort: SortMode,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_dir: None,
            state_dir: None,
            assistant: String::from("claude"),
            poll_interval_ms: 100,
            status_frames: 30,
            sort: SortMode::Date,
            log_file: None,
        }
    }
}

impl Config {
    /// Reads `$CCS_CONFIG`, or `<config dir>/ccs/config.toml`. A missing file
    /// means defaults.
    pub fn load() -> Result<Self> {
        let path = match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => expand_tilde(path.trim()),
            _ => match dirs::config_dir() {
                Some(dir) => dir.join("ccs").join("config.toml"),
                None => return Ok(Self::default()),
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("invalid config file: {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read config: {}", path.display()))
            }
        }
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.resolve_projects_dir(env::var(CLAUDE_DIR_ENV).ok(), dirs::home_dir())
    }

    fn resolve_projects_dir(&self, claude_dir: Option<String>, home: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = self.projects_dir.as_deref() {
            return expand_tilde(dir);
        }
        if let Some(dir) = claude_dir.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            return expand_tilde(dir).join("projects");
        }
        home.unwrap_or_default().join(".claude").join("projects")
    }

    pub fn state_dir(&self) -> PathBuf {
        match self.state_dir.as_deref() {
            Some(dir) => expand_tilde(dir),
            None => dirs::home_dir()
                .unwrap_or_default()
                .join(".config")
                .join("ccs"),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        match self.log_file.as_deref() {
            Some(path) => expand_tilde(path),
            None => self.state_dir().join("ccs.log"),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

pub fn expand_tilde(input: &str) -> PathBuf {
    if input.is_empty() {
        return PathBuf::new();
    }

    if input == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }

    if let Some(rest) = input.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config::load_from(&dir.path().join("none.toml")).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "assistant = \"claude-dev\"\nsort = \"messages\"\nstatus_frames = 12\n",
        )
        .expect("write");
        let config = Config::load_from(&path).expect("config");
        assert_eq!(config.assistant, "claude-dev");
        assert_eq!(config.sort, SortMode::Messages);
        assert_eq!(config.status_frames, 12);
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "sort = \"sideways\"").expect("write");
        let err = Config::load_from(&path).expect_err("bad sort");
        assert!(format!("{err:#}").contains("invalid config file"));
    }

    #[test]
    fn projects_dir_precedence() {
        let home = Some(PathBuf::from("/home/me"));
        let config = Config::default();
        assert_eq!(
            config.resolve_projects_dir(None, home.clone()),
            PathBuf::from("/home/me/.claude/projects")
        );
        assert_eq!(
            config.resolve_projects_dir(Some(String::from("/opt/claude")), home.clone()),
            PathBuf::from("/opt/claude/projects")
        );
        let explicit = Config {
            projects_dir: Some(String::from("/data/logs")),
            ..Config::default()
        };
        assert_eq!(
            explicit.resolve_projects_dir(Some(String::from("/opt/claude")), home),
            PathBuf::from("/data/logs")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        assert_eq!(expand_tilde(""), PathBuf::new());
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/x/y"), home.join("x/y"));
        }
    }
}
