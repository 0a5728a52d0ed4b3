//! Error types for the dispatch core.
//!
//! None of these are fatal to key processing. Buffer and registry errors are
//! returned at the call site that caused them; the key path itself degrades to
//! forwarding the raw key.

use crate::ContextId;

/// A write that would push a bounded buffer past its limit.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("write of {attempted} bytes exceeds the {limit}-byte limit")]
    Overflow { limit: usize, attempted: usize },

    #[error("cursor position {0} is not on a character boundary")]
    BadCursor(usize),
}

/// Failures while registering or switching input methods.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("addon {addon:?} already registered an input method named {name:?}")]
    DuplicateName { addon: String, name: String },

    #[error("input method name {0:?} is empty or longer than the display limit")]
    BadName(String),

    #[error("icon name {0:?} is longer than the display limit")]
    BadIconName(String),

    #[error("no input method at index {0}")]
    IndexOutOfRange(usize),

    #[error("unknown input context {0:?}")]
    UnknownContext(ContextId),
}

/// A chord string that could not be understood.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HotkeyParseError {
    #[error("empty chord")]
    Empty,

    #[error("unknown key name {0:?}")]
    UnknownKey(String),

    #[error("at most {max} chords per hotkey, got {got}")]
    TooManyChords { max: usize, got: usize },
}

/// Failures loading the dispatch configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("writing config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
