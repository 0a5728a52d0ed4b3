//! imdispatch-core
//!
//! Key-event dispatch core of an input-method framework. Raw key events from
//! a host are routed through exactly one active input-method backend per
//! input context, and the backend's structured result is turned into commits,
//! forwarded keys and input-window redraws.
//!
//! Public API:
//! - `KeyEventProcessor` - Entry point: owns contexts, registry and config
//! - `InputMethod` - The trait every backend implements
//! - `InputMethodRegistry` - Registered backends and per-context switching
//! - `ReturnValue` - Flag set a backend answers with
//! - `ReturnValueInterpreter` - Turns a `ReturnValue` into side effects
//! - `InputState` - Per-context composition buffers and message streams
//! - `HotkeyEntry` / `check_choose_key` - Hotkey and selection-key matching
//! - `Transport` / `InputWindow` - Collaborators a host implements
//! - `DispatchConfig` - Hotkeys and selection keys loaded from TOML

pub mod keys;
pub use keys::{KeyEvent, KeyEventType, KeyReleased, KeySym, Modifiers};

pub mod error;
pub use error::{BufferError, ConfigError, HotkeyParseError, RegistryError};

pub mod hotkey;
pub use hotkey::{check_choose_key, is_hotkey, Chord, HotkeyEntry};

pub mod candidate;
pub use candidate::{Candidate, CandidateList};

pub mod messages;
pub use messages::{Message, MessageKind, Messages};

pub mod input_state;
pub use input_state::{InputBuffer, InputState};

pub mod return_value;
pub use return_value::ReturnValue;

pub mod backend;
pub use backend::{InputMethod, InputMethodInfo};

pub mod context;
pub use context::{ContextId, InitStatus, InputContext};

pub mod registry;
pub use registry::{InputMethodRegistry, MethodId, RegisteredMethod};

pub mod frontend;
pub use frontend::{InputWindow, Transport};

pub mod interpreter;
pub use interpreter::{KeyResult, ReturnValueInterpreter};

pub mod config;
pub use config::DispatchConfig;

pub mod processor;
pub use processor::KeyEventProcessor;

/// Longest encoding of one character in UTF-8 as the UI layer budgets it.
pub const UTF8_MAX_LENGTH: usize = 6;

/// Longest code a table-style backend is expected to accept.
pub const MAX_CODE_LEN: usize = 63;

/// Byte limit of an input method's display and icon names.
pub const MAX_IM_NAME: usize = 8 * UTF8_MAX_LENGTH;

/// Byte limit of one candidate's text.
pub const MAX_CAND_LEN: usize = 127;

/// Byte limit of a candidate's tip label.
pub const MAX_TIPS_LEN: usize = 9;

/// Most candidates shown at once.
pub const MAX_CAND_WORD: usize = 10;

/// Byte limit of the raw input and output buffers.
pub const MAX_USER_INPUT: usize = 300;

/// Chords per hotkey entry.
pub const HOT_KEY_COUNT: usize = 2;
