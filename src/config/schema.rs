//! Configuration schema types for `romsprite.toml`
//!
//! Defines the structure and validation rules for extraction settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::color::parse_hex_color;
use crate::metroid3::SpriteKind;
use crate::sheet::MAX_BORDER_SIZE;

/// Largest supported output scale factor
pub const MAX_SCALE: u32 = 16;

/// Sprite sheet section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Sheet metadata JSON, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Border width, overrides the sheet's own value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_size: Option<u32>,
    /// Border color as hex, overrides the sheet's own value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

/// Import settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Equipped beam whose tiles sit in VRAM row 0x30
    #[serde(default = "default_weapon")]
    pub weapon: String,
    /// Sprite to extract
    #[serde(default = "default_sprite")]
    pub sprite: String,
}

fn default_weapon() -> String {
    "standard".to_string()
}

fn default_sprite() -> String {
    "Samus".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { weapon: default_weapon(), sprite: default_sprite() }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Nearest-neighbor upscale of the whole sheet
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Directory PNG files are written to
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

fn default_scale() -> u32 {
    1
}

fn default_dir() -> PathBuf {
    PathBuf::from("build")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { scale: default_scale(), dir: default_dir() }
    }
}

/// Complete `romsprite.toml` contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomspriteConfig {
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// A single problem found while validating a config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "output.scale")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "romsprite.toml: '{}' {}", self.field, self.message)
    }
}

impl RomspriteConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.output.scale == 0 || self.output.scale > MAX_SCALE {
            errors.push(ConfigValidationError {
                field: "output.scale".to_string(),
                message: format!("must be between 1 and {}", MAX_SCALE),
            });
        }

        if self.sheet.border_size.is_some_and(|size| size > MAX_BORDER_SIZE) {
            errors.push(ConfigValidationError {
                field: "sheet.border_size".to_string(),
                message: format!("must be at most {}", MAX_BORDER_SIZE),
            });
        }

        if let Some(color) = &self.sheet.border_color {
            if let Err(e) = parse_hex_color(color) {
                errors.push(ConfigValidationError {
                    field: "sheet.border_color".to_string(),
                    message: format!("is not a valid color: {}", e),
                });
            }
        }

        if SpriteKind::from_name(&self.import.sprite).is_err() {
            errors.push(ConfigValidationError {
                field: "import.sprite".to_string(),
                message: format!("names unknown sprite '{}'", self.import.sprite),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: RomspriteConfig = toml::from_str("").unwrap();
        assert_eq!(config, RomspriteConfig::default());
        assert_eq!(config.import.weapon, "standard");
        assert_eq!(config.import.sprite, "Samus");
        assert_eq!(config.output.scale, 1);
        assert_eq!(config.output.dir, PathBuf::from("build"));
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config() {
        let toml = r##"
[sheet]
path = "samus.json"
border_size = 2
border_color = "#404040"

[import]
weapon = "plasma"

[output]
scale = 4
dir = "out"
"##;
        let config: RomspriteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sheet.path, Some(PathBuf::from("samus.json")));
        assert_eq!(config.sheet.border_size, Some(2));
        assert_eq!(config.import.weapon, "plasma");
        assert_eq!(config.output.scale, 4);
        assert!(config.is_valid());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = RomspriteConfig::default();
        config.output.scale = 17;
        config.sheet.border_size = Some(65);
        config.sheet.border_color = Some("gray".to_string());
        config.import.sprite = "Ridley".to_string();

        let errors = config.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["output.scale", "sheet.border_size", "sheet.border_color", "import.sprite"]);
        assert_eq!(errors[0].to_string(), "romsprite.toml: 'output.scale' must be between 1 and 16");
    }

    #[test]
    fn test_zero_scale_invalid() {
        let mut config = RomspriteConfig::default();
        config.output.scale = 0;
        assert!(!config.is_valid());
    }
}
