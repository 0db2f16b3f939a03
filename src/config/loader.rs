//! Finding and reading `romsprite.toml`
//!
//! The file is looked up in the working directory and then in each parent.
//! Relative paths inside it are anchored to the directory holding it as soon
//! as it is read, so that command-line paths (taken as given) can replace
//! them without further resolution.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::schema::{ConfigValidationError, RomspriteConfig};

/// Name of the configuration file
pub const CONFIG_FILE: &str = "romsprite.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid TOML: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<ConfigValidationError>),
}

/// Command-line values that replace the ones from `romsprite.toml`
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub sheet: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub scale: Option<u32>,
    pub weapon: Option<String>,
}

impl CliOverrides {
    pub fn apply_to(self, config: &mut RomspriteConfig) {
        if let Some(sheet) = self.sheet {
            config.sheet.path = Some(sheet);
        }
        if let Some(dir) = self.dir {
            config.output.dir = dir;
        }
        if let Some(scale) = self.scale {
            config.output.scale = scale;
        }
        if let Some(weapon) = self.weapon {
            config.import.weapon = weapon;
        }
    }
}

/// The nearest `romsprite.toml` in `start` or one of its ancestors.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Load an explicit config file, or the one found from the working directory.
///
/// Returns the configuration and the file it came from; with no file the
/// defaults are used and the path is `None`.
pub fn load_config(path: Option<&Path>) -> Result<(RomspriteConfig, Option<PathBuf>), ConfigError> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => env::current_dir().ok().and_then(|cwd| find_config(&cwd)),
    };

    match path {
        Some(path) => Ok((load_config_file(&path)?, Some(path))),
        None => {
            debug!("No {} found, using defaults", CONFIG_FILE);
            Ok((RomspriteConfig::default(), None))
        }
    }
}

/// Read, validate and anchor one config file.
pub fn load_config_file(path: &Path) -> Result<RomspriteConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let mut config: RomspriteConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    if let Some(root) = path.parent() {
        config.sheet.path = config.sheet.path.map(|sheet| anchor(root, sheet));
        config.output.dir = anchor(root, config.output.dir);
    }
    Ok(config)
}

fn anchor(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
