//! The contract every input-method backend implements.
//!
//! A backend converts key sequences into composed text. The dispatcher owns
//! each backend behind `Box<dyn InputMethod>` and calls it synchronously on
//! the processing path of the context that is using it; all per-event data
//! flows through the `InputState` handed to each call.
//!
//! # Example
//!
//! ```
//! use imdispatch_core::{InputMethod, InputState, KeySym, Modifiers, ReturnValue};
//!
//! struct Echo;
//!
//! impl InputMethod for Echo {
//!     fn reset(&mut self) {}
//!
//!     fn handle_key(&mut self, sym: KeySym, _mods: Modifiers, state: &mut InputState) -> ReturnValue {
//!         match sym.to_char() {
//!             Some(ch) if state.set_output(&ch.to_string()).is_ok() => ReturnValue::COMMIT_STRING,
//!             _ => ReturnValue::TO_PROCESS,
//!         }
//!     }
//!
//!     fn fetch_candidates(&mut self, _state: &mut InputState) -> ReturnValue {
//!         ReturnValue::DO_NOTHING
//!     }
//! }
//! ```

use crate::error::RegistryError;
use crate::input_state::InputState;
use crate::keys::{KeySym, Modifiers};
use crate::return_value::ReturnValue;
use crate::MAX_IM_NAME;

/// A pluggable input-method backend.
///
/// `reset`, `handle_key` and `fetch_candidates` are required. The remaining
/// hooks have defaults suitable for a backend without persistent state.
pub trait InputMethod {
    /// Called lazily the first time a context activates this backend.
    /// Returning false disables the backend for that context.
    fn init(&mut self) -> bool {
        true
    }

    /// Drop any in-progress composition kept inside the backend.
    fn reset(&mut self);

    /// Interpret one key press against the context's input state.
    fn handle_key(&mut self, sym: KeySym, modifiers: Modifiers, state: &mut InputState) -> ReturnValue;

    /// Fill `state.candidates` (and usually the message streams) for the
    /// current raw input.
    fn fetch_candidates(&mut self, state: &mut InputState) -> ReturnValue;

    /// Choose a candidate by its slot on the current page.
    ///
    /// The default commits the candidate's text and discards the composition.
    fn select_candidate(&mut self, index: usize, state: &mut InputState) -> ReturnValue {
        let Some(text) = state.candidates.select_by_index(index).map(|c| c.text().to_string()) else {
            return ReturnValue::DO_NOTHING;
        };
        match state.set_output(&text) {
            Ok(()) => ReturnValue::COMMIT_STRING | ReturnValue::RESET_INPUT,
            Err(_) => ReturnValue::DO_NOTHING,
        }
    }

    /// Offer follow-up suggestions for what was just committed.
    /// Returns true if tips were placed in `state.candidates`.
    fn phrase_tips(&mut self, _state: &mut InputState) -> bool {
        false
    }

    /// Write learned data to storage.
    fn persist(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Re-read backend specific configuration.
    fn reload_config(&mut self) {}

    /// Release resources at shutdown.
    fn destroy(&mut self) {}
}

/// Display metadata of a registered input method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMethodInfo {
    name: String,
    icon_name: String,
    priority: i32,
}

impl InputMethodInfo {
    /// Validate the display strings against the UI's `MAX_IM_NAME` byte limit.
    pub fn new<N: Into<String>, I: Into<String>>(
        name: N,
        icon_name: I,
        priority: i32,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let icon_name = icon_name.into();
        if name.is_empty() || name.len() > MAX_IM_NAME {
            return Err(RegistryError::BadName(name));
        }
        if icon_name.len() > MAX_IM_NAME {
            return Err(RegistryError::BadIconName(icon_name));
        }
        Ok(Self {
            name,
            icon_name,
            priority,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon_name(&self) -> &str {
        &self.icon_name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;

    struct Nop;

    impl InputMethod for Nop {
        fn reset(&mut self) {}

        fn handle_key(&mut self, _: KeySym, _: Modifiers, _: &mut InputState) -> ReturnValue {
            ReturnValue::TO_PROCESS
        }

        fn fetch_candidates(&mut self, _: &mut InputState) -> ReturnValue {
            ReturnValue::DO_NOTHING
        }
    }

    #[test]
    fn test_info_limits() {
        assert!(InputMethodInfo::new("拼音", "pinyin", 1).is_ok());
        assert!(matches!(InputMethodInfo::new("", "x", 0), Err(RegistryError::BadName(_))));
        let long = "名".repeat(MAX_IM_NAME / 3 + 1);
        assert!(matches!(InputMethodInfo::new(long, "x", 0), Err(RegistryError::BadName(_))));
        assert!(matches!(
            InputMethodInfo::new("ok", "i".repeat(MAX_IM_NAME + 1), 0),
            Err(RegistryError::BadIconName(_))
        ));
    }

    #[test]
    fn test_default_select_candidate_commits_text() {
        let mut state = InputState::new();
        state.candidates.push(Candidate::new("你").unwrap());
        state.candidates.push(Candidate::new("尼").unwrap());

        let rv = Nop.select_candidate(1, &mut state);
        assert_eq!(rv, ReturnValue::COMMIT_STRING | ReturnValue::RESET_INPUT);
        assert_eq!(state.output_string(), "尼");

        assert_eq!(Nop.select_candidate(7, &mut state), ReturnValue::DO_NOTHING);
    }

    #[test]
    fn test_default_hooks() {
        let mut nop = Nop;
        assert!(nop.init());
        assert!(nop.persist().is_ok());
        assert!(!nop.phrase_tips(&mut InputState::new()));
    }
}
