//! Turning a [`ReturnValue`] into side effects.
//!
//! Flags are applied in a fixed order so that any combination interleaves
//! deterministically:
//!
//! 1. `RESET_INPUT`: clear the composition, reset the active backend
//! 2. `PENDING_COMMIT_STRING`: commit the output buffer (no-op when empty)
//! 3. `FORWARD_KEY`: forward the original key
//! 4. `UPDATE_CANDIDATE_WORDS`: fetch candidates (skipped under `DISPLAY_LAST`)
//! 5. `DO_PHRASE_TIPS`: after a commit, let the backend offer phrase tips
//! 6. `UPDATE_INPUT_WINDOW` / `DISPLAY_LAST`: one redraw request
//! 7. `ENG` / `PUNC`: recorded on the context for indicator display
//!
//! The value a fetch returns is folded into the same pass: its reset and
//! commit run right after the fetch, its mode bits join the context's, and
//! its redraw bits join the single redraw at the end. Its `FORWARD_KEY` and
//! `UPDATE_CANDIDATE_WORDS` are ignored.
//!
//! Backend hooks (reset, fetch, phrase tips) only reach a method that has
//! initialized successfully for the context.
//!
//! An empty value means the backend declined the key, which is forwarded
//! unless `BLOCK_FOLLOWING_PROCESS` is set.

use tracing::trace;

use crate::context::InputContext;
use crate::frontend::{InputWindow, Transport};
use crate::keys::KeyEvent;
use crate::registry::InputMethodRegistry;
use crate::return_value::ReturnValue;

/// Whether the key ended up consumed by the input method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled by the input method
    Handled,
    /// Key was forwarded to the application
    NotHandled,
}

/// Applies return values against one context, delivering effects to the
/// host's collaborators.
pub struct ReturnValueInterpreter<'a> {
    transport: &'a mut dyn Transport,
    window: &'a mut dyn InputWindow,
    phrase_tips: bool,
}

impl<'a> ReturnValueInterpreter<'a> {
    pub fn new(transport: &'a mut dyn Transport, window: &'a mut dyn InputWindow) -> Self {
        Self {
            transport,
            window,
            phrase_tips: true,
        }
    }

    /// Enable or disable the phrase-tips step.
    pub fn with_phrase_tips(mut self, enabled: bool) -> Self {
        self.phrase_tips = enabled;
        self
    }

    /// Perform every action implied by `rv` for the key `event`.
    pub fn apply(
        &mut self,
        registry: &mut InputMethodRegistry,
        ctx: &mut InputContext,
        event: KeyEvent,
        rv: ReturnValue,
    ) -> KeyResult {
        trace!(context = ?ctx.id(), ?rv, "applying return value");
        ctx.modes = rv.modes();

        if rv.is_declined() {
            self.transport.forward_key(ctx.id(), event);
            return KeyResult::NotHandled;
        }

        self.apply_flags(registry, ctx, Some(event), rv);

        if rv.contains(ReturnValue::FORWARD_KEY) {
            KeyResult::NotHandled
        } else {
            KeyResult::Handled
        }
    }

    /// Apply a value that did not come from a key, e.g. one produced by a
    /// hotkey action or a host-side command. Nothing is ever forwarded.
    pub fn apply_without_key(
        &mut self,
        registry: &mut InputMethodRegistry,
        ctx: &mut InputContext,
        rv: ReturnValue,
    ) {
        ctx.modes = rv.modes();
        self.apply_flags(registry, ctx, None, rv);
    }

    fn apply_flags(
        &mut self,
        registry: &mut InputMethodRegistry,
        ctx: &mut InputContext,
        event: Option<KeyEvent>,
        rv: ReturnValue,
    ) {
        let id = ctx.id();

        let reset = rv.contains(ReturnValue::RESET_INPUT);
        if reset {
            reset_composition(registry, ctx, true);
        }

        let mut committed = rv.contains(ReturnValue::PENDING_COMMIT_STRING) && self.commit(ctx);

        if rv.contains(ReturnValue::FORWARD_KEY) {
            if let Some(event) = event {
                self.transport.forward_key(id, event);
            }
        }

        let redraw_flags = ReturnValue::UPDATE_INPUT_WINDOW | ReturnValue::DISPLAY_LAST | ReturnValue::DO_PHRASE_TIPS;
        let mut redraw = rv & redraw_flags;

        if rv.contains(ReturnValue::UPDATE_CANDIDATE_WORDS) && !rv.contains(ReturnValue::DISPLAY_LAST) {
            if let Some(method) = registry.ready_mut(ctx) {
                ctx.state.in_remind = false;
                let fetched = method.backend().fetch_candidates(&mut ctx.state);
                trace!(context = ?id, ?fetched, "fetched candidates");
                // Folded into this pass: a fetch never fetches again or
                // forwards, and the window is drawn once below.
                ctx.modes |= fetched.modes();
                if fetched.contains(ReturnValue::RESET_INPUT) {
                    reset_composition(registry, ctx, !reset);
                }
                if fetched.contains(ReturnValue::PENDING_COMMIT_STRING) && self.commit(ctx) {
                    committed = true;
                }
                redraw |= fetched & redraw_flags;
            }
        }

        let mut tips_shown = false;
        if committed && self.phrase_tips && redraw.contains(ReturnValue::DO_PHRASE_TIPS) {
            if let Some(method) = registry.ready_mut(ctx) {
                if method.backend().phrase_tips(&mut ctx.state) {
                    ctx.state.in_remind = true;
                    tips_shown = true;
                }
            }
        }

        if redraw.contains(ReturnValue::DISPLAY_LAST) {
            self.window.display_last_page(id, &ctx.state);
        } else if redraw.contains(ReturnValue::UPDATE_INPUT_WINDOW) || tips_shown {
            self.window.update_input_window(id, &ctx.state);
        }
    }

    /// Hand the output buffer to the transport. False when it was empty.
    fn commit(&mut self, ctx: &mut InputContext) -> bool {
        let text = ctx.state.take_output();
        if text.is_empty() {
            return false;
        }
        ctx.state.record_commit(&text);
        self.transport.commit_string(ctx.id(), &text);
        true
    }
}

fn reset_composition(registry: &mut InputMethodRegistry, ctx: &mut InputContext, notify_backend: bool) {
    ctx.state.reset_input();
    ctx.state.clean_input_window();
    if notify_backend {
        if let Some(method) = registry.ready_mut(ctx) {
            method.backend().reset();
        }
    }
}
