//! The structured result of a backend call.
//!
//! Every flag is independent. Backends may return any subset and the
//! interpreter handles every one of them; the named composites below are just
//! the combinations backends commonly reach for.

use bitflags::bitflags;

bitflags! {
    /// Side effects a backend asks the dispatcher to perform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReturnValue: u16 {
        /// Nothing else to do; suppresses the default forward of a declined key.
        const BLOCK_FOLLOWING_PROCESS = 1 << 0;
        /// Hand the original key to the client unmodified.
        const FORWARD_KEY = 1 << 1;
        /// Discard the composition and reset the backend.
        const RESET_INPUT = 1 << 2;
        /// The output buffer holds text to commit.
        const PENDING_COMMIT_STRING = 1 << 3;
        /// The preedit or auxiliary messages changed.
        const UPDATE_INPUT_WINDOW = 1 << 4;
        /// Ask the backend for a fresh candidate list.
        const UPDATE_CANDIDATE_WORDS = 1 << 5;
        /// The committed text was typed in English mode.
        const ENG = 1 << 6;
        /// The committed text was a punctuation conversion.
        const PUNC = 1 << 7;
        /// Redraw the previous candidate page instead of recomputing it.
        /// Suppresses the fetch `UPDATE_CANDIDATE_WORDS` would otherwise trigger.
        const DISPLAY_LAST = 1 << 8;
        /// Offer phrase tips after committing.
        const DO_PHRASE_TIPS = 1 << 9;

        const DONOT_PROCESS = Self::FORWARD_KEY.bits();
        const COMMIT_STRING = Self::PENDING_COMMIT_STRING.bits() | Self::DO_PHRASE_TIPS.bits();
        const DO_NOTHING = Self::BLOCK_FOLLOWING_PROCESS.bits();
        const CLEAN = Self::RESET_INPUT.bits();
        const COMMIT_STRING_REMIND = Self::PENDING_COMMIT_STRING.bits() | Self::UPDATE_INPUT_WINDOW.bits();
        const DISPLAY_CANDWORDS = Self::UPDATE_INPUT_WINDOW.bits() | Self::UPDATE_CANDIDATE_WORDS.bits();
        const DONOT_PROCESS_CLEAN = Self::FORWARD_KEY.bits() | Self::RESET_INPUT.bits();
        const COMMIT_STRING_NEXT = Self::PENDING_COMMIT_STRING.bits() | Self::UPDATE_INPUT_WINDOW.bits();
        const DISPLAY_MESSAGE = Self::UPDATE_INPUT_WINDOW.bits();
        const ENG_COMMIT = Self::PENDING_COMMIT_STRING.bits() | Self::ENG.bits() | Self::RESET_INPUT.bits();
        const PUNC_COMMIT = Self::PENDING_COMMIT_STRING.bits() | Self::PUNC.bits() | Self::RESET_INPUT.bits();
        const DISPLAY_LAST_PAGE = Self::UPDATE_INPUT_WINDOW.bits() | Self::DISPLAY_LAST.bits();
    }
}

impl ReturnValue {
    /// The backend declined the key; the caller falls back to forwarding it.
    pub const TO_PROCESS: ReturnValue = ReturnValue::empty();

    /// True when no flag asks for anything, so the default action applies.
    pub fn is_declined(self) -> bool {
        self.is_empty()
    }

    /// The mode indicator bits a UI may read after interpretation.
    pub fn modes(self) -> ReturnValue {
        self & (ReturnValue::ENG | ReturnValue::PUNC)
    }
}
