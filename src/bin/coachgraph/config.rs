use super::ThemeArg;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub max_search_steps: Option<u64>,
    pub log_level: Option<String>,
    pub theme: Option<ThemeArg>,
}

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
    profiles: BTreeMap<String, Profile>,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        let profiles = parse_profiles(&data)?;
        Ok(Self {
            path,
            data,
            profiles,
        })
    }

    pub fn default_profile_name(&self) -> Option<&str> {
        self.data
            .default_profile
            .as_deref()
            .filter(|name| self.profiles.contains_key(*name))
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Resolves `--profile`, falling back to the configured default.
    pub fn active_profile(&self, requested: Option<&str>) -> Result<Option<&Profile>, ConfigError> {
        match requested {
            Some(name) => self
                .profile(name)
                .map(Some)
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                }),
            None => Ok(self.default_profile_name().and_then(|n| self.profile(n))),
        }
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn set_default_profile(&mut self, name: Option<&str>) -> Result<(), ConfigError> {
        if let Some(name) = name {
            if !self.profiles.contains_key(name) {
                return Err(ConfigError::ProfileNotFound {
                    name: name.to_string(),
                });
            }
        }
        self.data.default_profile = name.map(str::to_string);
        Ok(())
    }

    pub fn upsert_profile(&mut self, name: &str, update: ProfileUpdate) -> Result<(), ConfigError> {
        let entry = self.data.profiles.entry(name.to_string()).or_default();
        if let Some(steps) = update.max_search_steps {
            entry.max_search_steps = Some(steps);
        }
        if let Some(level) = update.log_level {
            entry.log_level = Some(level);
        }
        if let Some(theme) = update.theme {
            entry.theme = Some(theme_to_string(theme));
        }
        self.profiles = parse_profiles(&self.data)?;
        Ok(())
    }

    pub fn delete_profile(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.data.profiles.remove(name).is_none() {
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
            });
        }
        if self.data.default_profile.as_deref() == Some(name) {
            self.data.default_profile = None;
        }
        self.profiles = parse_profiles(&self.data)?;
        Ok(())
    }

    pub fn persist(&self) -> Result<PathBuf, ConfigError> {
        let target = match self.path.clone().or_else(default_config_path) {
            Some(path) => path,
            None => return Err(ConfigError::NoConfigPath),
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::io("create config directory", parent, source))?;
        }
        let serialized = toml::to_string_pretty(&self.data).map_err(ConfigError::Encode)?;
        fs::write(&target, serialized)
            .map_err(|source| ConfigError::io("write CLI config", &target, source))?;
        Ok(target)
    }
}

fn theme_to_string(value: ThemeArg) -> String {
    match value {
        ThemeArg::Auto => "auto",
        ThemeArg::Light => "light",
        ThemeArg::Dark => "dark",
        ThemeArg::Plain => "plain",
    }
    .to_string()
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| ConfigError::io("read CLI config", path, source))?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_profiles(data: &RawConfig) -> Result<BTreeMap<String, Profile>, ConfigError> {
    let mut profiles = BTreeMap::new();
    for (name, raw) in &data.profiles {
        profiles.insert(name.clone(), convert_profile(name, raw)?);
    }
    if let Some(default_name) = data.default_profile.as_ref() {
        if !profiles.contains_key(default_name) {
            return Err(ConfigError::ProfileNotFound {
                name: default_name.clone(),
            });
        }
    }
    Ok(profiles)
}

fn convert_profile(name: &str, raw: &RawProfile) -> Result<Profile, ConfigError> {
    let theme = match raw.theme.as_deref() {
        Some(value) => Some(ThemeArg::from_str(value, true).map_err(|_| {
            ConfigError::InvalidTheme {
                profile: name.to_string(),
                value: value.to_string(),
            }
        })?),
        None => None,
    };
    Ok(Profile {
        name: name.to_string(),
        max_search_steps: raw.max_search_steps,
        log_level: raw.log_level.clone(),
        theme,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_profile: Option<String>,
    #[serde(default)]
    profiles: BTreeMap<String, RawProfile>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_search_steps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
}

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub max_search_steps: Option<u64>,
    pub log_level: Option<String>,
    pub theme: Option<ThemeArg>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to encode CLI config: {0}")]
    Encode(#[source] toml::ser::Error),
    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },
    #[error("profile '{profile}' has unknown theme '{value}'")]
    InvalidTheme { profile: String, value: String },
    #[error("no config directory found; pass --config or set COACHGRAPH_CONFIG")]
    NoConfigPath,
}

impl ConfigError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("coachgraph").join("cli.toml"))
}
