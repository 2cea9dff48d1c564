//! Bridge configuration.
//!
//! Everything a program needs to stand a bridge up without code: screen
//! geometry, plane count, which host to use and how that host wants its
//! palette. Stored as TOML.
//!
//! ```toml
//! width = 320
//! height = 200
//! planes = 1
//! host = "terminal"
//! palette_layout = "rgb"
//! event_capacity = 0
//!
//! [terminal]
//! poll_timeout_ms = 10
//! synthesize_key_up = true
//! alternate_screen = true
//! ```

use crate::error::{BridgeError, Result};
use crate::video::PaletteLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which host implementation a bridge drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKind {
    /// Headless host that discards everything.
    #[default]
    Null,
    /// Native shell registering C callbacks.
    Callback,
    /// The controlling terminal.
    Terminal,
}

/// Terminal host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Input poll timeout in milliseconds.
    pub poll_timeout_ms: u64,

    /// Post a key-up right after each key-down when the terminal cannot
    /// report releases.
    pub synthesize_key_up: bool,

    /// Draw on the alternate screen.
    pub alternate_screen: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 10,
            synthesize_key_up: true,
            alternate_screen: true,
        }
    }
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Screen width in pixels.
    pub width: u32,

    /// Screen height in pixels.
    pub height: u32,

    /// Number of screen planes to allocate.
    pub planes: usize,

    /// Host implementation.
    pub host: HostKind,

    /// Palette layout handed to the host.
    pub palette_layout: PaletteLayout,

    /// Event queue capacity; 0 means unbounded.
    pub event_capacity: usize,

    /// Terminal host settings.
    pub terminal: TerminalConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 200,
            planes: 1,
            host: HostKind::Null,
            palette_layout: PaletteLayout::Rgb,
            event_capacity: 0,
            terminal: TerminalConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Reject geometry no bridge could allocate.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BridgeError::Config(format!(
                "screen must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.planes == 0 {
            return Err(BridgeError::Config("at least one plane is required".into()));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Write to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 200);
        assert_eq!(config.planes, 1);
        assert_eq!(config.host, HostKind::Null);
        assert_eq!(config.event_capacity, 0);
        assert_eq!(config.terminal.poll_timeout_ms, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_takes_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            host = "callback"
            palette_layout = "bgra"

            [terminal]
            alternate_screen = false
            "#,
        )
        .unwrap();

        assert_eq!(config.host, HostKind::Callback);
        assert_eq!(config.palette_layout, PaletteLayout::Bgra);
        assert_eq!(config.width, 320);
        assert!(!config.terminal.alternate_screen);
        assert!(config.terminal.synthesize_key_up);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        assert!(matches!(
            BridgeConfig::from_toml_str("width = 0"),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_toml_str("planes = 0"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_host_rejected() {
        assert!(matches!(
            BridgeConfig::from_toml_str(r#"host = "opengl""#),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = BridgeConfig {
            host: HostKind::Terminal,
            planes: 4,
            ..BridgeConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains(r#"host = "terminal""#));
        assert_eq!(BridgeConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "framebridge-config-{}.toml",
            std::process::id()
        ));
        let config = BridgeConfig {
            width: 640,
            height: 400,
            ..BridgeConfig::default()
        };

        config.save(&path).unwrap();
        let loaded = BridgeConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            BridgeConfig::load("/nonexistent/framebridge.toml"),
            Err(BridgeError::Io(_))
        ));
    }
}
