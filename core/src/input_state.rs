//! Per-context input state.
//!
//! One `InputState` exists per input context and is mutated in place by the
//! processor, the interpreter and the active backend. It holds:
//! - the raw code input typed so far, with its cursor
//! - the output buffer waiting to be committed
//! - the candidate list and the three message streams the UI draws from
//! - timing and release-classification bookkeeping for the key path
//!
//! Both text buffers are bounded by `MAX_USER_INPUT` bytes. A write that would
//! overflow is rejected and leaves the buffer as it was.

use tracing::debug;

use crate::candidate::CandidateList;
use crate::error::BufferError;
use crate::keys::{KeyReleased, KeySym, Modifiers};
use crate::messages::Messages;
use crate::MAX_USER_INPUT;

/// Text buffer with a byte-offset cursor and a hard size limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize, // Byte offset, not char offset
    limit: usize,
}

impl InputBuffer {
    /// Create an empty buffer holding at most `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            limit,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clear the buffer and reset cursor.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn check_room(&self, extra: usize) -> Result<(), BufferError> {
        let attempted = self.text.len() + extra;
        if attempted > self.limit {
            debug!(limit = self.limit, attempted, "rejecting buffer overflow");
            return Err(BufferError::Overflow {
                limit: self.limit,
                attempted,
            });
        }
        Ok(())
    }

    /// Replace the whole content and put the cursor at the end.
    pub fn set_text(&mut self, s: &str) -> Result<(), BufferError> {
        if s.len() > self.limit {
            debug!(limit = self.limit, attempted = s.len(), "rejecting buffer overflow");
            return Err(BufferError::Overflow {
                limit: self.limit,
                attempted: s.len(),
            });
        }
        self.text.clear();
        self.text.push_str(s);
        self.cursor = self.text.len();
        Ok(())
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) -> Result<(), BufferError> {
        self.check_room(ch.len_utf8())?;
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        Ok(())
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) -> Result<(), BufferError> {
        self.check_room(s.len())?;
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
        Ok(())
    }

    /// Delete the character before the cursor (backspace).
    /// Returns true if a character was deleted.
    pub fn delete_before(&mut self) -> bool {
        match self.text[..self.cursor].chars().next_back() {
            Some(ch) => {
                self.cursor -= ch.len_utf8();
                self.text.remove(self.cursor);
                true
            }
            None => false,
        }
    }

    /// Delete the character after the cursor (delete key).
    /// Returns true if a character was deleted.
    pub fn delete_after(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        self.text.remove(self.cursor);
        true
    }

    /// Move cursor to the left by one character.
    pub fn move_left(&mut self) -> bool {
        match self.text[..self.cursor].chars().next_back() {
            Some(ch) => {
                self.cursor -= ch.len_utf8();
                true
            }
            None => false,
        }
    }

    /// Move cursor to the right by one character.
    pub fn move_right(&mut self) -> bool {
        match self.text[self.cursor..].chars().next() {
            Some(ch) => {
                self.cursor += ch.len_utf8();
                true
            }
            None => false,
        }
    }

    /// Set the cursor position (must be at a character boundary).
    pub fn set_cursor(&mut self, pos: usize) -> Result<(), BufferError> {
        if pos <= self.text.len() && self.text.is_char_boundary(pos) {
            self.cursor = pos;
            Ok(())
        } else {
            Err(BufferError::BadCursor(pos))
        }
    }

    /// Take the content, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

/// Mutable composition state of one input context.
#[derive(Debug, Clone)]
pub struct InputState {
    raw_input: InputBuffer,
    output: InputBuffer,

    /// Whether the UI should draw the raw-input cursor.
    pub show_cursor: bool,

    /// The candidates are phrase tips rather than conversions.
    pub in_remind: bool,

    /// Timestamp (ms) of the most recent key event.
    pub last_key_pressed_time: u64,

    /// Release meaning armed by the most recent press.
    pub key_released: KeyReleased,

    /// The most recent press, used to pair it with its release.
    pub last_pressed: Option<(KeySym, Modifiers)>,

    /// Characters committed since statistics were last reset.
    pub accepted_count: usize,

    /// Timestamp of the first commit since statistics were last reset.
    pub typing_started_at: Option<u64>,

    pub candidates: CandidateList,
    pub preedit: Messages,
    pub aux_up: Messages,
    pub aux_down: Messages,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            raw_input: InputBuffer::with_limit(MAX_USER_INPUT),
            output: InputBuffer::with_limit(MAX_USER_INPUT),
            show_cursor: false,
            in_remind: false,
            last_key_pressed_time: 0,
            key_released: KeyReleased::Other,
            last_pressed: None,
            accepted_count: 0,
            typing_started_at: None,
            candidates: CandidateList::new(),
            preedit: Messages::new(),
            aux_up: Messages::new(),
            aux_down: Messages::new(),
        }
    }

    /// The raw code input typed so far.
    pub fn raw_input(&self) -> &InputBuffer {
        &self.raw_input
    }

    pub fn raw_input_mut(&mut self) -> &mut InputBuffer {
        &mut self.raw_input
    }

    pub fn cursor(&self) -> usize {
        self.raw_input.cursor()
    }

    /// Text waiting to be committed.
    pub fn output_string(&self) -> &str {
        self.output.text()
    }

    pub fn set_output(&mut self, text: &str) -> Result<(), BufferError> {
        self.output.set_text(text)
    }

    pub fn append_output(&mut self, text: &str) -> Result<(), BufferError> {
        self.output.insert_str(text)
    }

    pub(crate) fn take_output(&mut self) -> String {
        self.output.take()
    }

    /// Discard the composition: raw input, cursor, candidates and remind mode.
    pub fn reset_input(&mut self) {
        self.raw_input.clear();
        self.candidates.clear();
        self.in_remind = false;
        self.show_cursor = false;
    }

    /// Clear the preedit and both auxiliary streams.
    pub fn clean_input_window(&mut self) {
        self.clean_input_window_up();
        self.clean_input_window_down();
    }

    /// Clear the preedit and the upper auxiliary stream.
    pub fn clean_input_window_up(&mut self) {
        self.preedit.clear();
        self.aux_up.clear();
    }

    /// Clear the candidates and the lower auxiliary stream.
    pub fn clean_input_window_down(&mut self) {
        self.candidates.clear();
        self.aux_down.clear();
    }

    pub(crate) fn record_commit(&mut self, text: &str) {
        if self.typing_started_at.is_none() {
            self.typing_started_at = Some(self.last_key_pressed_time);
        }
        self.accepted_count += text.chars().count();
    }

    pub fn reset_statistics(&mut self) {
        self.accepted_count = 0;
        self.typing_started_at = None;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
