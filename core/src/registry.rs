//! Input-method registry and switching.
//!
//! The registry owns every backend together with its display metadata, kept
//! in default selection order: ascending priority, ties broken by
//! registration order. Contexts refer to methods by [`MethodId`], which stays
//! valid when later registrations reorder the list.

use tracing::{debug, info, warn};

use crate::backend::{InputMethod, InputMethodInfo};
use crate::context::{InitStatus, InputContext};
use crate::error::RegistryError;

/// Stable handle of a registered input method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u32);

/// A backend plus everything the registry knows about it.
pub struct RegisteredMethod {
    id: MethodId,
    addon: String,
    info: InputMethodInfo,
    backend: Box<dyn InputMethod>,
}

impl RegisteredMethod {
    pub fn id(&self) -> MethodId {
        self.id
    }

    /// The addon that registered this method.
    pub fn addon(&self) -> &str {
        &self.addon
    }

    pub fn info(&self) -> &InputMethodInfo {
        &self.info
    }

    pub fn backend(&mut self) -> &mut dyn InputMethod {
        self.backend.as_mut()
    }
}

impl std::fmt::Debug for RegisteredMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredMethod")
            .field("id", &self.id)
            .field("addon", &self.addon)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of registered input methods.
#[derive(Debug, Default)]
pub struct InputMethodRegistry {
    methods: Vec<RegisteredMethod>,
    next_id: u32,
}

impl InputMethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend on behalf of `addon`.
    ///
    /// Fails if that addon already registered a method with the same name.
    pub fn register<A: Into<String>>(
        &mut self,
        addon: A,
        info: InputMethodInfo,
        backend: Box<dyn InputMethod>,
    ) -> Result<MethodId, RegistryError> {
        let addon = addon.into();
        if self
            .methods
            .iter()
            .any(|m| m.addon == addon && m.info.name() == info.name())
        {
            return Err(RegistryError::DuplicateName {
                addon,
                name: info.name().to_string(),
            });
        }

        let id = MethodId(self.next_id);
        self.next_id += 1;
        info!(addon = %addon, name = info.name(), priority = info.priority(), "registered input method");
        self.methods.push(RegisteredMethod {
            id,
            addon,
            info,
            backend,
        });
        // Stable sort: ids grow with registration, so ties keep that order.
        self.methods.sort_by_key(|m| m.info.priority());
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Methods in default selection order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredMethod> {
        self.methods.iter()
    }

    pub fn index_of(&self, id: MethodId) -> Option<usize> {
        self.methods.iter().position(|m| m.id == id)
    }

    pub fn method(&self, id: MethodId) -> Option<&RegisteredMethod> {
        self.methods.iter().find(|m| m.id == id)
    }

    pub fn method_mut(&mut self, id: MethodId) -> Option<&mut RegisteredMethod> {
        self.methods.iter_mut().find(|m| m.id == id)
    }

    /// The context's active method; `None` means no backend is active.
    pub fn current(&self, ctx: &InputContext) -> Option<&RegisteredMethod> {
        ctx.current.and_then(|id| self.method(id))
    }

    /// The context's active method, but only once it initialized successfully
    /// for this context. Hooks that follow `init` go through here.
    pub fn ready_mut(&mut self, ctx: &InputContext) -> Option<&mut RegisteredMethod> {
        let id = ctx.current?;
        if ctx.init_status(id) != Some(InitStatus::Ready) {
            return None;
        }
        self.method_mut(id)
    }

    /// Make the method at `index` the context's active one.
    ///
    /// Resets the previously active backend if it was initialized. Unless `keep_state` is set the
    /// composition and the input window are cleared as well.
    pub fn switch(
        &mut self,
        ctx: &mut InputContext,
        index: usize,
        keep_state: bool,
    ) -> Result<MethodId, RegistryError> {
        let target = self
            .methods
            .get(index)
            .map(|m| m.id)
            .ok_or(RegistryError::IndexOutOfRange(index))?;

        if let Some(previous) = self.ready_mut(ctx) {
            previous.backend.reset();
        }
        ctx.current = Some(target);
        if !keep_state {
            ctx.state.reset_input();
            ctx.state.clean_input_window();
        }
        debug!(context = ?ctx.id(), index, keep_state, "switched input method");
        Ok(target)
    }

    /// Index of the method after the context's current one, wrapping around.
    pub fn next_index(&self, ctx: &InputContext) -> Option<usize> {
        if self.methods.is_empty() {
            return None;
        }
        match ctx.current.and_then(|id| self.index_of(id)) {
            Some(i) => Some((i + 1) % self.methods.len()),
            None => Some(0),
        }
    }

    /// The context's active backend, initializing it on first use.
    ///
    /// Returns `None` when nothing is active or the backend failed to
    /// initialize for this context; callers then forward keys unmodified.
    pub fn active_backend(&mut self, ctx: &mut InputContext) -> Option<&mut RegisteredMethod> {
        let id = ctx.current?;
        let method = self.methods.iter_mut().find(|m| m.id == id)?;
        match ctx.init.get(&id) {
            Some(InitStatus::Ready) => Some(method),
            Some(InitStatus::Failed) => None,
            None => {
                if method.backend.init() {
                    ctx.init.insert(id, InitStatus::Ready);
                    Some(method)
                } else {
                    warn!(context = ?ctx.id(), name = method.info.name(), "input method failed to initialize; forwarding keys");
                    ctx.init.insert(id, InitStatus::Failed);
                    None
                }
            }
        }
    }

    /// Ask every backend to persist its state. Failures are logged.
    pub fn save_all(&mut self) {
        for m in &mut self.methods {
            if let Err(e) = m.backend.persist() {
                warn!(name = m.info.name(), error = %e, "failed to persist input method state");
            }
        }
    }

    /// Ask every backend to reload its configuration.
    pub fn reload_config_all(&mut self) {
        for m in &mut self.methods {
            m.backend.reload_config();
        }
    }

    /// Destroy every backend exactly once and empty the registry.
    pub fn shutdown(&mut self) {
        for mut m in self.methods.drain(..) {
            debug!(name = m.info.name(), "destroying input method");
            m.backend.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextId;
    use crate::input_state::InputState;
    use crate::keys::{KeySym, Modifiers};
    use crate::return_value::ReturnValue;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        resets: Cell<u32>,
        inits: Cell<u32>,
        destroys: Cell<u32>,
    }

    struct Counting {
        counters: Rc<Counters>,
        init_ok: bool,
    }

    impl InputMethod for Counting {
        fn init(&mut self) -> bool {
            self.counters.inits.set(self.counters.inits.get() + 1);
            self.init_ok
        }

        fn reset(&mut self) {
            self.counters.resets.set(self.counters.resets.get() + 1);
        }

        fn handle_key(&mut self, _: KeySym, _: Modifiers, _: &mut InputState) -> ReturnValue {
            ReturnValue::DO_NOTHING
        }

        fn fetch_candidates(&mut self, _: &mut InputState) -> ReturnValue {
            ReturnValue::DO_NOTHING
        }

        fn destroy(&mut self) {
            self.counters.destroys.set(self.counters.destroys.get() + 1);
        }
    }

    fn counting(counters: &Rc<Counters>, init_ok: bool) -> Box<dyn InputMethod> {
        Box::new(Counting {
            counters: counters.clone(),
            init_ok,
        })
    }

    fn info(name: &str, priority: i32) -> InputMethodInfo {
        InputMethodInfo::new(name, name, priority).unwrap()
    }

    #[test]
    fn test_duplicate_name_per_addon() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        reg.register("table", info("wubi", 1), counting(&c, true)).unwrap();
        let err = reg.register("table", info("wubi", 2), counting(&c, true)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
        // Another addon may reuse the name
        assert!(reg.register("other", info("wubi", 2), counting(&c, true)).is_ok());
    }

    #[test]
    fn test_order_by_priority_then_registration() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        reg.register("a", info("late", 5), counting(&c, true)).unwrap();
        reg.register("a", info("first", 1), counting(&c, true)).unwrap();
        reg.register("a", info("tie-1", 3), counting(&c, true)).unwrap();
        reg.register("a", info("tie-2", 3), counting(&c, true)).unwrap();
        let names: Vec<&str> = reg.iter().map(|m| m.info().name()).collect();
        assert_eq!(names, vec!["first", "tie-1", "tie-2", "late"]);
    }

    #[test]
    fn test_switch_resets_previous_and_clears_input() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        reg.register("a", info("one", 1), counting(&c, true)).unwrap();
        reg.register("a", info("two", 2), counting(&c, true)).unwrap();
        let mut ctx = InputContext::new(ContextId(1));

        reg.switch(&mut ctx, 0, false).unwrap();
        assert_eq!(c.resets.get(), 0);
        assert!(reg.active_backend(&mut ctx).is_some());

        ctx.state.raw_input_mut().set_text("nihao").unwrap();
        let id = reg.switch(&mut ctx, 1, false).unwrap();
        assert_eq!(c.resets.get(), 1);
        assert_eq!(ctx.current_method(), Some(id));
        assert!(ctx.state.raw_input().is_empty());
        assert_eq!(reg.current(&ctx).map(|m| m.info().name()), Some("two"));
    }

    #[test]
    fn test_switch_skips_reset_of_uninitialized_or_failed() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        reg.register("a", info("broken", 1), counting(&c, false)).unwrap();
        reg.register("a", info("two", 2), counting(&c, true)).unwrap();
        let mut ctx = InputContext::new(ContextId(1));

        // Never initialized
        reg.switch(&mut ctx, 1, false).unwrap();
        reg.switch(&mut ctx, 0, false).unwrap();
        assert_eq!(c.resets.get(), 0);

        // Initialization failed
        assert!(reg.active_backend(&mut ctx).is_none());
        assert!(reg.ready_mut(&ctx).is_none());
        reg.switch(&mut ctx, 1, false).unwrap();
        assert_eq!(c.resets.get(), 0);
        assert!(reg.current(&ctx).is_some());
    }

    #[test]
    fn test_switch_keep_state() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        reg.register("a", info("one", 1), counting(&c, true)).unwrap();
        let mut ctx = InputContext::new(ContextId(1));
        ctx.state.raw_input_mut().set_text("zhong").unwrap();
        reg.switch(&mut ctx, 0, true).unwrap();
        assert_eq!(ctx.state.raw_input().text(), "zhong");
    }

    #[test]
    fn test_switch_out_of_range() {
        let mut reg = InputMethodRegistry::new();
        let mut ctx = InputContext::new(ContextId(1));
        assert_eq!(reg.switch(&mut ctx, 0, false), Err(RegistryError::IndexOutOfRange(0)));
        assert!(reg.current(&ctx).is_none());
    }

    #[test]
    fn test_lazy_init_once_per_context() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        reg.register("a", info("one", 1), counting(&c, true)).unwrap();
        let mut ctx = InputContext::new(ContextId(1));
        reg.switch(&mut ctx, 0, false).unwrap();

        assert!(reg.active_backend(&mut ctx).is_some());
        assert!(reg.active_backend(&mut ctx).is_some());
        assert_eq!(c.inits.get(), 1);

        let mut other = InputContext::new(ContextId(2));
        reg.switch(&mut other, 0, false).unwrap();
        assert!(reg.active_backend(&mut other).is_some());
        assert_eq!(c.inits.get(), 2);
    }

    #[test]
    fn test_failed_init_disables_backend_for_context() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        let id = reg.register("a", info("broken", 1), counting(&c, false)).unwrap();
        let mut ctx = InputContext::new(ContextId(1));
        reg.switch(&mut ctx, 0, false).unwrap();

        assert!(reg.active_backend(&mut ctx).is_none());
        assert!(reg.active_backend(&mut ctx).is_none());
        assert_eq!(c.inits.get(), 1);
        assert_eq!(ctx.init_status(id), Some(InitStatus::Failed));
    }

    #[test]
    fn test_next_index_wraps() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        let mut ctx = InputContext::new(ContextId(1));
        assert_eq!(reg.next_index(&ctx), None);
        reg.register("a", info("one", 1), counting(&c, true)).unwrap();
        reg.register("a", info("two", 2), counting(&c, true)).unwrap();
        assert_eq!(reg.next_index(&ctx), Some(0));
        reg.switch(&mut ctx, 1, false).unwrap();
        assert_eq!(reg.next_index(&ctx), Some(0));
    }

    #[test]
    fn test_shutdown_destroys_each_once() {
        let c = Rc::new(Counters::default());
        let mut reg = InputMethodRegistry::new();
        reg.register("a", info("one", 1), counting(&c, true)).unwrap();
        reg.register("a", info("two", 2), counting(&c, true)).unwrap();
        reg.shutdown();
        reg.shutdown();
        assert_eq!(c.destroys.get(), 2);
        assert!(reg.is_empty());
    }
}
