//! Per input-context state owned by the dispatcher.
//!
//! Each client text field gets one `InputContext`. Nothing in here is shared
//! between contexts: the active input method, which backends were initialized
//! for this context and the composition state all live per context.

use ahash::AHashMap;

use crate::input_state::InputState;
use crate::registry::MethodId;
use crate::return_value::ReturnValue;

/// Host-assigned identifier of an input context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

/// Result of lazily initializing a backend for one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Ready,
    Failed,
}

/// One client's isolated composition session.
#[derive(Debug, Clone)]
pub struct InputContext {
    id: ContextId,
    pub state: InputState,
    pub(crate) current: Option<MethodId>,
    pub(crate) init: AHashMap<MethodId, InitStatus>,
    /// Input method on; when off every key except the trigger is forwarded.
    pub enabled: bool,
    /// Full-width punctuation toggle driven by the punctuation hotkey.
    pub full_width_punctuation: bool,
    /// Mode bits (`ENG`/`PUNC`) of the last interpreted return value.
    pub modes: ReturnValue,
}

impl InputContext {
    pub fn new(id: ContextId) -> Self {
        Self {
            id,
            state: InputState::new(),
            current: None,
            init: AHashMap::new(),
            enabled: true,
            full_width_punctuation: true,
            modes: ReturnValue::empty(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The active input method, or `None` before the first switch.
    pub fn current_method(&self) -> Option<MethodId> {
        self.current
    }

    pub fn init_status(&self, method: MethodId) -> Option<InitStatus> {
        self.init.get(&method).copied()
    }
}
