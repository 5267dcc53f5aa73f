//! Shared utilities: logging, weapon hash keys, output writing.

use std::fs;
use std::io;
use std::path::Path;
use tracing::Level;

/// Initialize tracing with env filter. Safe to call once at startup.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Weapon entries are the all-digit keys of a family block.
pub fn is_weapon_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

pub fn parse_weapon_hash(key: &str) -> Option<u32> {
    if !is_weapon_key(key) {
        return None;
    }
    key.parse().ok()
}

/// Write `contents` next to `path` and rename it into place, so a failed run
/// never leaves a half-written artifact.
pub fn write_output(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".partial");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_keys_are_all_digits() {
        assert!(is_weapon_key("1294026524"));
        assert!(!is_weapon_key("cat"));
        assert!(!is_weapon_key("12a"));
        assert!(!is_weapon_key(""));
        assert!(!is_weapon_key("-12"));
    }

    #[test]
    fn hash_must_fit_u32() {
        assert_eq!(parse_weapon_hash("4294967295"), Some(u32::MAX));
        assert_eq!(parse_weapon_hash("4294967296"), None);
    }

    #[test]
    fn write_output_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.rs");
        write_output(&path, "first").unwrap();
        write_output(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join("nested").join("out.rs.partial").exists());
    }
}
