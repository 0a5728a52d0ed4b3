//! Dispatch configuration: global hotkeys and selection keys.
//!
//! Designed to be deserialized from TOML. Hotkeys are chord strings (see
//! [`crate::hotkey`]); an entry that fails to parse is kept as an empty
//! hotkey that never matches.
//!
//! ```
//! # use imdispatch_core::DispatchConfig;
//! let config = DispatchConfig::from_toml_str(r#"
//!     trigger_key = "CTRL_SPACE SHIFT_SPACE"
//!     select_keys = "asdfghjkl"
//! "#).unwrap();
//! assert_eq!(config.select_keys, "asdfghjkl");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hotkey::HotkeyEntry;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Turns the input method on and off for a context.
    pub trigger_key: HotkeyEntry,

    /// Tapped alone, switches between the input method and direct input.
    pub switch_key: HotkeyEntry,

    /// Toggles full-width punctuation.
    pub punctuation_key: HotkeyEntry,

    /// Previous candidate page, while candidates are shown.
    pub prev_page_key: HotkeyEntry,

    /// Next candidate page, while candidates are shown.
    pub next_page_key: HotkeyEntry,

    /// Tapped alone, selects the second candidate of the page.
    pub second_select_key: HotkeyEntry,

    /// Tapped alone, selects the third candidate of the page.
    pub third_select_key: HotkeyEntry,

    /// Keys selecting candidates by position (first char selects slot 0).
    pub select_keys: String,

    /// Keep the composition when switching input methods.
    pub keep_state_on_switch: bool,

    /// Ask backends for phrase tips after commits that request them.
    pub phrase_tips: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            trigger_key: HotkeyEntry::parse_lenient("CTRL_SPACE"),
            switch_key: HotkeyEntry::parse_lenient("L_CTRL"),
            punctuation_key: HotkeyEntry::parse_lenient("CTRL_PERIOD"),
            prev_page_key: HotkeyEntry::parse_lenient("MINUS UP"),
            next_page_key: HotkeyEntry::parse_lenient("EQUAL DOWN"),
            second_select_key: HotkeyEntry::none(),
            third_select_key: HotkeyEntry::none(),
            select_keys: "1234567890".to_string(),
            keep_state_on_switch: false,
            phrase_tips: true,
        }
    }
}

impl DispatchConfig {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeySym, Modifiers};

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert!(config.trigger_key.matches(KeySym::SPACE, Modifiers::CTRL));
        assert!(config.switch_key.matches(KeySym::CONTROL_L, Modifiers::empty()));
        assert!(config.second_select_key.is_empty());
        assert_eq!(config.select_keys, "1234567890");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DispatchConfig::from_toml_str("keep_state_on_switch = true").unwrap();
        assert!(config.keep_state_on_switch);
        assert_eq!(config.trigger_key, DispatchConfig::default().trigger_key);
    }

    #[test]
    fn test_malformed_hotkey_never_matches() {
        let config = DispatchConfig::from_toml_str(r#"trigger_key = "CTRL_WHAT""#).unwrap();
        assert!(config.trigger_key.is_empty());
        assert!(!config.trigger_key.matches(KeySym::SPACE, Modifiers::CTRL));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = DispatchConfig::default();
        config.second_select_key = HotkeyEntry::parse("SEMICOLON").unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(DispatchConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_and_save_file() {
        let path = std::env::temp_dir().join(format!("imdispatch_config_{}.toml", std::process::id()));
        let mut config = DispatchConfig::default();
        config.select_keys = "asdf".to_string();
        config.save_toml(&path).unwrap();
        let loaded = DispatchConfig::load_toml(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.select_keys, "asdf");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DispatchConfig::load_toml("/nonexistent/imdispatch.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
