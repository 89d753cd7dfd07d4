#![forbid(unsafe_code)]

//! Overlay configuration surface.
//!
//! [`OverlayConfig`] groups the boolean switches every overlay exposes.
//! Every field defaults to `false`, which is the behavior of a plain
//! dismissable overlay: no backdrop, auto-focus on open, Escape and outside
//! clicks cancel, focus is not restored on close.
//!
//! # Loading
//!
//! With the `config` feature the configuration can be read from TOML or JSON;
//! missing keys keep their defaults.
//!
//! ```toml
//! with_backdrop = true
//! restore_focus_on_close = true
//! no_cancel_on_outside_click = true
//! ```
//!
//! ```rust,ignore
//! let config = OverlayConfig::from_toml_file("dialog.toml")?;
//! let dialog = OverlayController::new(&manager, host).with_config(config);
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Switches controlling one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OverlayConfig {
    /// Initial `opened` state, honored once the overlay is attached.
    pub opened: bool,
    /// Show the shared backdrop and trap focus inside the overlay.
    pub with_backdrop: bool,
    /// Leave focus where it is when the overlay opens.
    pub no_auto_focus: bool,
    /// Escape does not cancel the overlay.
    pub no_cancel_on_esc_key: bool,
    /// Clicking outside does not cancel the overlay.
    pub no_cancel_on_outside_click: bool,
    /// Return focus to the previously focused node on close.
    pub restore_focus_on_close: bool,
    /// Keep the overlay above overlays without this flag.
    pub always_on_top: bool,
    /// Let outside clicks also reach the overlay below this one.
    pub allow_click_through: bool,
}

impl OverlayConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn opened(mut self, opened: bool) -> Self {
        self.opened = opened;
        self
    }

    #[must_use]
    pub fn with_backdrop(mut self, enabled: bool) -> Self {
        self.with_backdrop = enabled;
        self
    }

    #[must_use]
    pub fn no_auto_focus(mut self, enabled: bool) -> Self {
        self.no_auto_focus = enabled;
        self
    }

    #[must_use]
    pub fn no_cancel_on_esc_key(mut self, enabled: bool) -> Self {
        self.no_cancel_on_esc_key = enabled;
        self
    }

    #[must_use]
    pub fn no_cancel_on_outside_click(mut self, enabled: bool) -> Self {
        self.no_cancel_on_outside_click = enabled;
        self
    }

    #[must_use]
    pub fn restore_focus_on_close(mut self, enabled: bool) -> Self {
        self.restore_focus_on_close = enabled;
        self
    }

    #[must_use]
    pub fn always_on_top(mut self, enabled: bool) -> Self {
        self.always_on_top = enabled;
        self
    }

    #[must_use]
    pub fn allow_click_through(mut self, enabled: bool) -> Self {
        self.allow_click_through = enabled;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty TOML.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSerialize)
    }
}

/// Errors from loading an [`OverlayConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// TOML serialization error.
    #[cfg(feature = "config")]
    TomlSerialize(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::TomlSerialize(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
        }
    }
}
