use include_dir::{Dir, include_dir};
use std::fs;
use std::path::Path;

use crate::config::CONFIG_FILE;

static CONFIG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/config");

/// Copies the bundled config into the user config dir, leaving existing files
/// alone.
pub fn ensure_config() {
	let Some(user_config) = dirs::config_dir() else {
		return;
	};
	let dest = user_config.join("set-arbiter");

	extract_dir(&CONFIG_DIR, &dest);
}

fn extract_dir(dir: &Dir, dest: &Path) {
	for file in dir.files() {
		let file_dest = dest.join(file.path());
		if !file_dest.exists() {
			if let Some(parent) = file_dest.parent() {
				let _ = fs::create_dir_all(parent);
			}
			let _ = fs::write(&file_dest, file.contents());
		}
	}

	for subdir in dir.dirs() {
		extract_dir(subdir, dest);
	}
}

pub fn bundled_config() -> Option<&'static str> {
	CONFIG_DIR.get_file(CONFIG_FILE).and_then(|f| f.contents_utf8())
}
