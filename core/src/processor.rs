//! Top-level key event processing.
//!
//! `KeyEventProcessor` owns the registry, every input context and the
//! configuration snapshot. For each key event it:
//!
//! 1. records timing and arms a release meaning on press
//! 2. resolves a paired release (switch-key tap, Ctrl+Shift tap, select-key tap)
//! 3. matches global hotkeys on press, which never reach the backend
//! 4. otherwise hands the key to the context's active backend, initializing
//!    it on first use
//!
//! `process_key` returns the raw [`ReturnValue`]; interpreting it is the job
//! of [`ReturnValueInterpreter`], reachable through `apply` or the combined
//! `handle_key_event`.

use ahash::AHashMap;
use tracing::{debug, trace, warn};

use crate::backend::{InputMethod, InputMethodInfo};
use crate::config::DispatchConfig;
use crate::context::{ContextId, InputContext};
use crate::error::RegistryError;
use crate::frontend::{InputWindow, Transport};
use crate::hotkey::{check_choose_key, is_hotkey};
use crate::interpreter::{KeyResult, ReturnValueInterpreter};
use crate::keys::{KeyEvent, KeyEventType, KeyReleased, KeySym, Modifiers};
use crate::registry::{InputMethodRegistry, MethodId};
use crate::return_value::ReturnValue;

/// Dispatches key events for every input context of one host.
pub struct KeyEventProcessor {
    registry: InputMethodRegistry,
    contexts: AHashMap<ContextId, InputContext>,
    config: DispatchConfig,
}

impl KeyEventProcessor {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            registry: InputMethodRegistry::new(),
            contexts: AHashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn registry(&self) -> &InputMethodRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut InputMethodRegistry {
        &mut self.registry
    }

    /// Register a backend. See [`InputMethodRegistry::register`].
    pub fn register<A: Into<String>>(
        &mut self,
        addon: A,
        info: InputMethodInfo,
        backend: Box<dyn InputMethod>,
    ) -> Result<MethodId, RegistryError> {
        self.registry.register(addon, info, backend)
    }

    /// Get or create the context for `id`.
    pub fn create_context(&mut self, id: ContextId) -> &mut InputContext {
        self.contexts.entry(id).or_insert_with(|| InputContext::new(id))
    }

    /// Drop a context, resetting its backend's in-progress composition.
    pub fn remove_context(&mut self, id: ContextId) -> Option<InputContext> {
        let ctx = self.contexts.remove(&id)?;
        if let Some(method) = self.registry.ready_mut(&ctx) {
            method.backend().reset();
        }
        Some(ctx)
    }

    pub fn context(&self, id: ContextId) -> Option<&InputContext> {
        self.contexts.get(&id)
    }

    pub fn context_mut(&mut self, id: ContextId) -> Option<&mut InputContext> {
        self.contexts.get_mut(&id)
    }

    /// Display metadata of the context's active input method.
    pub fn current_input_method(&self, id: ContextId) -> Option<&InputMethodInfo> {
        let ctx = self.contexts.get(&id)?;
        self.registry.current(ctx).map(|m| m.info())
    }

    /// Switch the context to the method at `index`, keeping the composition
    /// only if the configuration says so.
    pub fn switch_input_method(&mut self, id: ContextId, index: usize) -> Result<MethodId, RegistryError> {
        let keep_state = self.config.keep_state_on_switch;
        self.switch_input_method_with(id, index, keep_state)
    }

    pub fn switch_input_method_with(
        &mut self,
        id: ContextId,
        index: usize,
        keep_state: bool,
    ) -> Result<MethodId, RegistryError> {
        let ctx = self
            .contexts
            .get_mut(&id)
            .ok_or(RegistryError::UnknownContext(id))?;
        self.registry.switch(ctx, index, keep_state)
    }

    /// Discard the context's composition and reset its active backend.
    pub fn reset_input(&mut self, id: ContextId) {
        if let Some(ctx) = self.contexts.get_mut(&id) {
            ctx.state.reset_input();
            ctx.state.clean_input_window();
            if let Some(method) = self.registry.ready_mut(ctx) {
                method.backend().reset();
            }
        }
    }

    /// Run one key event through hotkeys and the active backend.
    ///
    /// Unknown contexts are created on first use. The returned value is
    /// exactly what the hotkey action or backend produced.
    pub fn process_key(
        &mut self,
        id: ContextId,
        kind: KeyEventType,
        timestamp: u64,
        sym: KeySym,
        modifiers: Modifiers,
    ) -> ReturnValue {
        let config = &self.config;
        let registry = &mut self.registry;
        let ctx = self.contexts.entry(id).or_insert_with(|| InputContext::new(id));
        ctx.state.last_key_pressed_time = timestamp;

        let rv = match kind {
            KeyEventType::Release => process_release(config, registry, ctx, sym),
            KeyEventType::Press => process_press(config, registry, ctx, sym, modifiers),
        };
        trace!(context = ?id, ?kind, ?sym, ?rv, "processed key");
        rv
    }

    /// Interpret `rv` for `event` against the context, delivering effects to
    /// the collaborators.
    pub fn apply(
        &mut self,
        id: ContextId,
        event: KeyEvent,
        rv: ReturnValue,
        transport: &mut dyn Transport,
        window: &mut dyn InputWindow,
    ) -> KeyResult {
        let ctx = self.contexts.entry(id).or_insert_with(|| InputContext::new(id));
        ReturnValueInterpreter::new(transport, window)
            .with_phrase_tips(self.config.phrase_tips)
            .apply(&mut self.registry, ctx, event, rv)
    }

    /// `process_key` followed by `apply`.
    pub fn handle_key_event(
        &mut self,
        id: ContextId,
        event: KeyEvent,
        transport: &mut dyn Transport,
        window: &mut dyn InputWindow,
    ) -> KeyResult {
        let rv = self.process_key(id, event.kind, event.timestamp, event.sym, event.modifiers);
        self.apply(id, event, rv, transport, window)
    }

    /// Ask every backend to persist its learned state.
    pub fn save_all(&mut self) {
        self.registry.save_all();
    }

    /// Install a new configuration snapshot and let backends reload theirs.
    pub fn reload_config(&mut self, config: DispatchConfig) {
        self.config = config;
        self.registry.reload_config_all();
    }

    /// Persist and destroy every backend. Contexts fall back to forwarding.
    pub fn shutdown(&mut self) {
        self.registry.save_all();
        self.registry.shutdown();
    }
}

fn classify_press(config: &DispatchConfig, sym: KeySym, modifiers: Modifiers) -> KeyReleased {
    let mods = modifiers.normalized();
    if (sym.is_shift() && mods == Modifiers::CTRL) || (sym.is_control() && mods == Modifiers::SHIFT) {
        KeyReleased::CtrlShift
    } else if is_hotkey(sym, mods, &config.switch_key) {
        KeyReleased::Ctrl
    } else if is_hotkey(sym, mods, &config.second_select_key) {
        KeyReleased::SecondSelectKey
    } else if is_hotkey(sym, mods, &config.third_select_key) {
        KeyReleased::ThirdSelectKey
    } else {
        KeyReleased::Other
    }
}

fn process_press(
    config: &DispatchConfig,
    registry: &mut InputMethodRegistry,
    ctx: &mut InputContext,
    sym: KeySym,
    modifiers: Modifiers,
) -> ReturnValue {
    ctx.state.key_released = classify_press(config, sym, modifiers);
    ctx.state.last_pressed = Some((sym, modifiers));

    if is_hotkey(sym, modifiers, &config.trigger_key) {
        ctx.state.key_released = KeyReleased::Other;
        return toggle_enabled(config, registry, ctx);
    }

    if !ctx.enabled {
        if ctx.state.key_released != KeyReleased::Ctrl {
            ctx.state.key_released = KeyReleased::Other;
        }
        return ReturnValue::DONOT_PROCESS;
    }

    if sym.is_modifier() {
        return ReturnValue::DONOT_PROCESS;
    }

    if is_hotkey(sym, modifiers, &config.punctuation_key) {
        ctx.full_width_punctuation = !ctx.full_width_punctuation;
        debug!(context = ?ctx.id(), full_width = ctx.full_width_punctuation, "toggled punctuation mode");
        return ReturnValue::DISPLAY_MESSAGE;
    }

    if !ctx.state.candidates.is_empty() {
        if matches!(
            ctx.state.key_released,
            KeyReleased::SecondSelectKey | KeyReleased::ThirdSelectKey
        ) {
            // Wait for the release to decide between selection and typing
            return ReturnValue::DO_NOTHING;
        }
        if is_hotkey(sym, modifiers, &config.prev_page_key) {
            return if ctx.state.candidates.page_up() {
                ReturnValue::DISPLAY_LAST_PAGE
            } else {
                ReturnValue::DO_NOTHING
            };
        }
        if is_hotkey(sym, modifiers, &config.next_page_key) {
            return if ctx.state.candidates.page_down() {
                ReturnValue::DISPLAY_MESSAGE
            } else {
                ReturnValue::DO_NOTHING
            };
        }
        if let Some(index) = check_choose_key(sym, modifiers, &config.select_keys) {
            return select_candidate(registry, ctx, index);
        }
    } else if matches!(
        ctx.state.key_released,
        KeyReleased::SecondSelectKey | KeyReleased::ThirdSelectKey
    ) {
        // Nothing to select: the key is ordinary input
        ctx.state.key_released = KeyReleased::Other;
    }

    match registry.active_backend(ctx) {
        Some(method) => method.backend().handle_key(sym, modifiers, &mut ctx.state),
        None => ReturnValue::DONOT_PROCESS,
    }
}

fn process_release(
    config: &DispatchConfig,
    registry: &mut InputMethodRegistry,
    ctx: &mut InputContext,
    sym: KeySym,
) -> ReturnValue {
    let armed = std::mem::take(&mut ctx.state.key_released);
    let paired = matches!(ctx.state.last_pressed, Some((pressed, _)) if pressed == sym);
    if !paired {
        return ReturnValue::DONOT_PROCESS;
    }

    match armed {
        KeyReleased::Other => ReturnValue::DONOT_PROCESS,
        KeyReleased::Ctrl => toggle_enabled(config, registry, ctx),
        KeyReleased::CtrlShift => {
            let next = registry.next_index(ctx).filter(|_| ctx.enabled);
            match next {
                Some(index) => match registry.switch(ctx, index, config.keep_state_on_switch) {
                    Ok(_) => ReturnValue::DISPLAY_MESSAGE,
                    Err(_) => ReturnValue::DONOT_PROCESS,
                },
                None => ReturnValue::DONOT_PROCESS,
            }
        }
        KeyReleased::SecondSelectKey => select_candidate(registry, ctx, 1),
        KeyReleased::ThirdSelectKey => select_candidate(registry, ctx, 2),
    }
}

fn toggle_enabled(
    config: &DispatchConfig,
    registry: &mut InputMethodRegistry,
    ctx: &mut InputContext,
) -> ReturnValue {
    ctx.enabled = !ctx.enabled;
    debug!(context = ?ctx.id(), enabled = ctx.enabled, "toggled input method");
    if ctx.enabled && ctx.current_method().is_none() {
        // Nothing active yet: start with the default method
        if let Err(e) = registry.switch(ctx, 0, config.keep_state_on_switch) {
            warn!(context = ?ctx.id(), error = %e, "could not activate the default input method");
        }
    }
    ReturnValue::CLEAN | ReturnValue::UPDATE_INPUT_WINDOW
}

fn select_candidate(registry: &mut InputMethodRegistry, ctx: &mut InputContext, index: usize) -> ReturnValue {
    match registry.active_backend(ctx) {
        Some(method) => method.backend().select_candidate(index, &mut ctx.state),
        None => ReturnValue::DONOT_PROCESS,
    }
}
