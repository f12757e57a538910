use std::env;
use std::fs;
use std::io::{Error, ErrorKind, Write};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "taskcation";
const RECENT_STORES_FILE: &str = "recent_stores.txt";
const MAX_RECENT_STORES: usize = 50;

pub const STORE_ENV: &str = "TASKCATION_STORE";
pub const STATE_DIR_ENV: &str = "TASKCATION_STATE_DIR";

/// Picks the store file: CLI flag, then `TASKCATION_STORE`, then the most recently used one.
pub fn resolve_store_path(cli_path: Option<PathBuf>) -> Result<PathBuf, Error> {
	resolve_with(cli_path, env::var_os(STORE_ENV).map(PathBuf::from), &state_dir())
}

fn resolve_with(
	cli_path: Option<PathBuf>,
	env_path: Option<PathBuf>,
	state_dir: &Path,
) -> Result<PathBuf, Error> {
	if let Some(path) = cli_path {
		return Ok(absolutize(path));
	}

	if let Some(path) = env_path.filter(|path| !path.as_os_str().is_empty()) {
		return Ok(absolutize(path));
	}

	if let Ok(recent) = read_recent(&state_dir.join(RECENT_STORES_FILE), 1) {
		if let Some(path) = recent.into_iter().next() {
			return Ok(path);
		}
	}

	Err(Error::new(
		ErrorKind::NotFound,
		"no store selected: pass --store <path>, set TASKCATION_STORE, or pick one from `stores`",
	))
}

pub fn remember_store(path: &Path) -> Result<(), Error> {
	remember_in(&state_dir(), path)
}

fn remember_in(state_dir: &Path, path: &Path) -> Result<(), Error> {
	let list = state_dir.join(RECENT_STORES_FILE);
	let path = absolutize(path.to_path_buf());
	let mut entries = read_recent(&list, MAX_RECENT_STORES)?;
	entries.retain(|entry| entry != &path);
	entries.insert(0, path);
	entries.truncate(MAX_RECENT_STORES);

	fs::create_dir_all(state_dir)?;
	let mut file = fs::File::create(list)?;
	for entry in &entries {
		writeln!(file, "{}", entry.display())?;
	}
	Ok(())
}

pub fn recent_stores(limit: usize) -> Result<Vec<PathBuf>, Error> {
	read_recent(&state_dir().join(RECENT_STORES_FILE), limit)
}

fn read_recent(list: &Path, limit: usize) -> Result<Vec<PathBuf>, Error> {
	let raw = match fs::read_to_string(list) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
		Err(err) => return Err(err),
	};

	Ok(raw
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.take(limit)
		.map(PathBuf::from)
		.collect())
}

/// Per-user directory for the recent list, settings and the log file.
pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os(STATE_DIR_ENV) {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(".taskcation")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::PathBuf;

	use super::*;

	fn temp_dir(name: &str) -> PathBuf {
		let mut path = std::env::temp_dir();
		path.push(format!("{}_{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&path);
		path
	}

	#[test]
	fn cli_path_wins_over_environment() {
		let state = temp_dir("taskcation_resolve_cli");
		let resolved = resolve_with(
			Some(PathBuf::from("/tmp/from-cli.store")),
			Some(PathBuf::from("/tmp/from-env.store")),
			&state,
		)
		.expect("should resolve");
		assert!(resolved.ends_with("from-cli.store"));

		let resolved = resolve_with(None, Some(PathBuf::from("/tmp/from-env.store")), &state)
			.expect("should resolve");
		assert!(resolved.ends_with("from-env.store"));
	}

	#[test]
	fn falls_back_to_the_most_recent_store() {
		let state = temp_dir("taskcation_resolve_recent");
		assert_eq!(
			resolve_with(None, Some(PathBuf::new()), &state)
				.expect_err("nothing to resolve")
				.kind(),
			ErrorKind::NotFound
		);

		remember_in(&state, Path::new("/tmp/first.store")).expect("remember should work");
		remember_in(&state, Path::new("/tmp/second.store")).expect("remember should work");
		remember_in(&state, Path::new("/tmp/first.store")).expect("remember should work");

		let recent = read_recent(&state.join(RECENT_STORES_FILE), 10).expect("read should work");
		assert_eq!(recent.len(), 2);
		assert!(recent[0].ends_with("first.store"));

		let resolved = resolve_with(None, None, &state).expect("should resolve");
		assert!(resolved.ends_with("first.store"));
		let _ = fs::remove_dir_all(state);
	}
}
