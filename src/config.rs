use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::calendar::Granularity;
use crate::domain::generate_id;
use crate::workspaces::state_dir;

const CONFIG_FILE: &str = "config.toml";
pub const USER_ENV: &str = "TASKCATION_USER";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to access settings at {path}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("failed to parse settings at {path}: {source}")]
	Decode {
		path: PathBuf,
		source: toml::de::Error,
	},
	#[error("failed to encode settings: {0}")]
	Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	/// Owner id stamped on every document this user creates.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<String>,
	#[serde(default)]
	pub default_view: Granularity,
}

impl Settings {
	pub fn path() -> PathBuf {
		state_dir().join(CONFIG_FILE)
	}

	/// Returns the defaults when the file does not exist yet.
	pub fn load() -> Result<Self, ConfigError> {
		Self::load_from(&Self::path())
	}

	pub fn save(&self) -> Result<(), ConfigError> {
		self.save_to(&Self::path())
	}

	fn load_from(path: &Path) -> Result<Self, ConfigError> {
		let raw = match fs::read_to_string(path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => {
				return Err(ConfigError::Io {
					path: path.to_path_buf(),
					source,
				});
			}
		};
		toml::from_str(&raw).map_err(|source| ConfigError::Decode {
			path: path.to_path_buf(),
			source,
		})
	}

	fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
		let io_error = |source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		};
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).map_err(io_error)?;
		}
		let raw = toml::to_string_pretty(self)?;
		fs::write(path, raw).map_err(io_error)
	}
}

/// Owner id from `--user`, then `TASKCATION_USER`, then the settings file.
/// A fresh `user_<id>` is generated and stored when none of them has one.
pub fn resolve_owner(cli_user: Option<String>, settings: &mut Settings) -> Result<String, ConfigError> {
	let (owner, generated) = pick_owner(cli_user, env::var(USER_ENV).ok(), settings);
	if generated {
		settings.owner_id = Some(owner.clone());
		settings.save()?;
		info!(owner = %owner, "generated owner id");
	}
	Ok(owner)
}

fn pick_owner(
	cli_user: Option<String>,
	env_user: Option<String>,
	settings: &Settings,
) -> (String, bool) {
	let explicit = [cli_user, env_user, settings.owner_id.clone()]
		.into_iter()
		.flatten()
		.map(|user| user.trim().to_string())
		.find(|user| !user.is_empty());

	match explicit {
		Some(owner) => (owner, false),
		None => (format!("user_{}", generate_id()), true),
	}
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::PathBuf;

	use super::*;

	fn temp_file(name: &str) -> PathBuf {
		let mut path = std::env::temp_dir();
		path.push(format!("{}_{}", name, std::process::id()));
		path
	}

	#[test]
	fn missing_file_gives_defaults() {
		let path = temp_file("taskcation_config_missing.toml");
		let _ = fs::remove_file(&path);
		let settings = Settings::load_from(&path).expect("load should work");
		assert_eq!(settings, Settings::default());
		assert_eq!(settings.default_view, Granularity::Month);
	}

	#[test]
	fn round_trips_through_toml() {
		let path = temp_file("taskcation_config_roundtrip.toml");
		let settings = Settings {
			owner_id: Some("user_abc".to_string()),
			default_view: Granularity::Week,
		};
		settings.save_to(&path).expect("save should work");
		assert_eq!(Settings::load_from(&path).expect("load should work"), settings);

		fs::write(&path, "default_view = 7").expect("write should work");
		assert!(matches!(
			Settings::load_from(&path),
			Err(ConfigError::Decode { .. })
		));
		let _ = fs::remove_file(path);
	}

	#[test]
	fn owner_precedence_is_cli_then_env_then_settings() {
		let settings = Settings {
			owner_id: Some("from-settings".to_string()),
			default_view: Granularity::Month,
		};

		let picked = pick_owner(Some("cli".to_string()), Some("env".to_string()), &settings);
		assert_eq!(picked, ("cli".to_string(), false));
		let picked = pick_owner(Some("  ".to_string()), Some("env".to_string()), &settings);
		assert_eq!(picked, ("env".to_string(), false));
		let picked = pick_owner(None, None, &settings);
		assert_eq!(picked, ("from-settings".to_string(), false));

		let (owner, generated) = pick_owner(None, None, &Settings::default());
		assert!(generated);
		assert!(owner.starts_with("user_"));
		assert_eq!(owner.len(), "user_".len() + 8);
	}
}
