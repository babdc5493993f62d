use anyhow::{Context, Result};
use paneview_runtime_config::{CONFIG_FILE_NAME, PaneviewConfig};
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/paneview/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("paneview"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve `--config`, falling back to the canonical path.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => config_path(),
    }
}

/// Load config from `path`, returning defaults if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<PaneviewConfig> {
    if !path.exists() {
        return Ok(PaneviewConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    PaneviewConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))
}

pub fn load_config(explicit: Option<&Path>) -> Result<PaneviewConfig> {
    load_config_from(&resolve_path(explicit)?)
}

/// Print the effective configuration as TOML.
pub fn show_config(explicit: Option<&Path>, config: &PaneviewConfig) -> Result<()> {
    let path = resolve_path(explicit)?;
    let source = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("# {}{source}", path.display());
    print!("{}", config.to_toml().context("Failed to serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config_from(&dir.path().join(CONFIG_FILE_NAME)).expect("load");
        assert_eq!(cfg, PaneviewConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[poll]\ninterval_ms = 400\n\n[tmux]\ndefault_session = \"work\"").expect("write");
        let cfg = load_config_from(file.path()).expect("load");
        assert_eq!(cfg.poll.interval_ms, 400);
        assert_eq!(cfg.tmux.default_session, "work");
        assert_eq!(cfg.tmux.history_lines, 200);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[poll\ninterval_ms = 400").expect("write");
        let err = load_config_from(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config at"));
    }

    #[test]
    fn explicit_path_wins() {
        let path = PathBuf::from("/tmp/elsewhere.toml");
        assert_eq!(resolve_path(Some(path.as_path())).expect("path"), path);
    }
}
