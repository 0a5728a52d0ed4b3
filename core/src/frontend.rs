//! Collaborators that receive the side effects of key processing.
//!
//! The core never talks to a client connection or draws anything. Hosts
//! implement these two traits and hand them to the interpreter.

use crate::context::ContextId;
use crate::input_state::InputState;
use crate::keys::KeyEvent;

/// The channel to the client application.
pub trait Transport {
    /// Deliver finalized text to the client.
    fn commit_string(&mut self, ctx: ContextId, text: &str);

    /// Hand a key the input method did not consume back to the client.
    fn forward_key(&mut self, ctx: ContextId, event: KeyEvent);
}

/// The candidate/preedit window.
pub trait InputWindow {
    /// Redraw preedit, auxiliary messages and the current candidate page.
    fn update_input_window(&mut self, ctx: ContextId, state: &InputState);

    /// Redraw from the page already held in `state.candidates` without asking
    /// the backend for a new list.
    fn display_last_page(&mut self, ctx: ContextId, state: &InputState) {
        self.update_input_window(ctx, state);
    }
}
