//! Routing of key presses to component key functions.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use form_tree_pointer::{is_component_id, DEFAULT_ROOT_ID};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::owners::owners_of;
use crate::shortcut::{resolve_target, KeyEvent, ShortcutTable, ShortcutTarget};
use crate::Propagation;

/// Default id of the region whose keys are still dispatched while the form
/// is blocked.
pub const DEFAULT_ESCAPE_REGION: &str = "form-tree-escape";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// First segment of every component id of the form.
    pub root_id: String,
    /// Element id of the region exempt from blocking.
    pub escape_region: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            root_id: DEFAULT_ROOT_ID.to_string(),
            escape_region: DEFAULT_ESCAPE_REGION.to_string(),
        }
    }
}

/// Keyed values shared by the components of one form.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Rc<RefCell<HashMap<String, Value>>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.borrow_mut().insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.borrow_mut().remove(key)
    }

    pub fn resolve(&self, template: &str) -> Option<String> {
        resolve_target(template, &self.inner.borrow())
    }
}

/// Count of pending blocking operations.
#[derive(Debug, Clone, Default)]
pub struct Blocker {
    pending: Rc<Cell<usize>>,
}

impl Blocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self) {
        self.pending.set(self.pending.get().saturating_add(1));
    }

    pub fn pop(&self) {
        self.pending.set(self.pending.get().saturating_sub(1));
    }

    pub fn is_blocked(&self) -> bool {
        self.pending.get() > 0
    }

    /// Block until the returned guard is dropped.
    pub fn guard(&self) -> BlockerGuard {
        self.push();
        BlockerGuard {
            blocker: self.clone(),
        }
    }
}

#[must_use = "the form unblocks as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BlockerGuard {
    blocker: Blocker,
}

impl Drop for BlockerGuard {
    fn drop(&mut self) {
        self.blocker.pop();
    }
}

/// Result of dispatching one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A key function stopped propagation. The host should prevent the
    /// native default and stop native propagation.
    Handled,
    Unhandled,
    /// The form is blocked and the event came from outside the escape region.
    Blocked,
}

/// Named action of a component, run with the event and the shortcut's
/// extra descriptor fields.
pub type KeyHandler = Rc<dyn Fn(&KeyEvent, &Map<String, Value>) -> Propagation>;

#[derive(Default)]
struct Registry {
    shortcuts: ShortcutTable,
    // owner id -> function name -> handler
    key_functions: IndexMap<String, IndexMap<String, KeyHandler>>,
}

/// Per-form keyboard shortcut router.
///
/// Cloning yields another handle to the same registries.
#[derive(Clone)]
pub struct ShortcutDispatcher {
    config: Rc<DispatchConfig>,
    registry: Rc<RefCell<Registry>>,
    state: SharedState,
    blocker: Blocker,
}

impl ShortcutDispatcher {
    pub fn new(config: DispatchConfig, state: SharedState, blocker: Blocker) -> Self {
        Self {
            config: Rc::new(config),
            registry: Rc::default(),
            state,
            blocker,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn set_shortcuts(&self, shortcuts: ShortcutTable) {
        self.registry.borrow_mut().shortcuts = shortcuts;
    }

    /// Add `{combo: descriptor}` declarations. Returns how many compiled.
    pub fn add_shortcuts(&self, declarations: &Value) -> usize {
        self.registry.borrow_mut().shortcuts.extend_from_json(declarations)
    }

    pub fn shortcuts(&self) -> ShortcutTable {
        self.registry.borrow().shortcuts.clone()
    }

    /// Register the key function `name` of `owner_id`, replacing an earlier
    /// one with the same name.
    pub fn register_key_function<F>(&self, owner_id: &str, name: &str, handler: F)
    where
        F: Fn(&KeyEvent, &Map<String, Value>) -> Propagation + 'static,
    {
        let handler: KeyHandler = Rc::new(handler);
        self.insert_key_functions(owner_id, [(name.to_string(), handler)]);
    }

    /// Register several key functions of `owner_id` at once.
    pub fn register_key_functions<I, N>(&self, owner_id: &str, functions: I)
    where
        I: IntoIterator<Item = (N, KeyHandler)>,
        N: Into<String>,
    {
        self.insert_key_functions(
            owner_id,
            functions.into_iter().map(|(name, handler)| (name.into(), handler)),
        );
    }

    fn insert_key_functions<I>(&self, owner_id: &str, functions: I)
    where
        I: IntoIterator<Item = (String, KeyHandler)>,
    {
        self.registry
            .borrow_mut()
            .key_functions
            .entry(owner_id.to_string())
            .or_default()
            .extend(functions);
    }

    pub fn unregister_key_function(&self, owner_id: &str, name: &str) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(functions) = registry.key_functions.get_mut(owner_id) else {
            return false;
        };
        let removed = functions.shift_remove(name).is_some();
        if functions.is_empty() {
            registry.key_functions.shift_remove(owner_id);
        }
        removed
    }

    /// Drop all key functions of `owner_id`.
    pub fn unregister_key_functions(&self, owner_id: &str) -> bool {
        self.registry
            .borrow_mut()
            .key_functions
            .shift_remove(owner_id)
            .is_some()
    }

    /// Drop all shortcuts and key functions.
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.shortcuts = ShortcutTable::new();
        registry.key_functions.clear();
    }

    pub fn dispatch(&self, event: &KeyEvent) -> KeyOutcome {
        if self.blocker.is_blocked()
            && !event.target_ids.iter().any(|id| *id == self.config.escape_region)
        {
            tracing::debug!(key = event.key.as_str(), "form blocked; key press dropped");
            return KeyOutcome::Blocked;
        }

        for (handler, params) in self.candidates(event) {
            if handler(event, &params) == Propagation::Stop {
                return KeyOutcome::Handled;
            }
        }
        KeyOutcome::Unhandled
    }

    // Handlers in the order they get to see `event`: explicitly targeted
    // shortcuts first, then the owners of the focused component from the
    // innermost outwards.
    fn candidates(&self, event: &KeyEvent) -> Vec<(KeyHandler, Map<String, Value>)> {
        let registry = self.registry.borrow();
        let lookup = |owner: &str, action: &str| {
            registry
                .key_functions
                .get(owner)
                .and_then(|functions| functions.get(action))
                .map(Rc::clone)
        };

        let mut out = Vec::new();
        for shortcut in registry.shortcuts.matching(event) {
            let ShortcutTarget::Explicit(template) = &shortcut.target else {
                continue;
            };
            let Some(owner) = self.state.resolve(template) else {
                tracing::debug!(template = template.as_str(), "shortcut target unresolved");
                continue;
            };
            if let Some(handler) = lookup(owner.as_str(), shortcut.action.as_str()) {
                out.push((handler, shortcut.params.clone()));
            }
        }

        let current_id = event
            .target_ids
            .iter()
            .find(|id| is_component_id(id, &self.config.root_id));
        if let Some(current_id) = current_id {
            let owners = owners_of(registry.key_functions.keys(), current_id);
            tracing::trace!(current_id = current_id.as_str(), ?owners, "key dispatch order");
            for owner in owners {
                for shortcut in registry.shortcuts.matching(event) {
                    match &shortcut.target {
                        ShortcutTarget::Ancestry => {
                            if let Some(handler) = lookup(owner, shortcut.action.as_str()) {
                                out.push((handler, shortcut.params.clone()));
                            }
                        }
                        ShortcutTarget::Explicit(_) => {}
                    }
                }
            }
        }
        out
    }
}

impl fmt::Debug for ShortcutDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("ShortcutDispatcher")
            .field("config", &self.config)
            .field("shortcuts", &registry.shortcuts.len())
            .field("owners", &registry.key_functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatcher() -> ShortcutDispatcher {
        ShortcutDispatcher::new(DispatchConfig::default(), SharedState::new(), Blocker::new())
    }

    #[test]
    fn test_blocker_guard() {
        let blocker = Blocker::new();
        {
            let _guard = blocker.guard();
            assert!(blocker.is_blocked());
        }
        assert!(!blocker.is_blocked());
        blocker.pop();
        assert!(!blocker.is_blocked());
    }

    #[test]
    fn test_unregister_key_function() {
        let d = dispatcher();
        d.register_key_function("root", "a", |_, _| Propagation::Stop);
        assert!(d.unregister_key_function("root", "a"));
        assert!(!d.unregister_key_function("root", "a"));
        assert!(!d.unregister_key_functions("root"));
    }

    #[test]
    fn test_register_key_functions() {
        let d = dispatcher();
        d.add_shortcuts(&json!({"a": {"fn": "first"}, "b": {"fn": "second"}}));
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        let prefix = String::from("sec");
        d.register_key_functions(
            "root_a",
            [
                (
                    "first".to_string(),
                    Rc::new(move |_: &KeyEvent, _: &Map<String, Value>| {
                        first.borrow_mut().push("first".to_string());
                        Propagation::Stop
                    }) as KeyHandler,
                ),
                (
                    format!("{prefix}ond"),
                    Rc::new(move |event: &KeyEvent, _: &Map<String, Value>| {
                        second.borrow_mut().push(format!("second:{}", event.key));
                        Propagation::Stop
                    }) as KeyHandler,
                ),
            ],
        );
        for key in ["a", "b"] {
            let event = KeyEvent::new(key).with_targets(["root_a_0"]);
            assert_eq!(d.dispatch(&event), KeyOutcome::Handled);
        }
        assert_eq!(*log.borrow(), vec!["first", "second:b"]);
    }

    #[test]
    fn test_params_reach_handler() {
        let d = dispatcher();
        d.add_shortcuts(&json!({"alt+n": {"fn": "navigate", "reverse": true}}));
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        d.register_key_function("root", "navigate", move |_, params| {
            *sink.borrow_mut() = params.get("reverse").cloned();
            Propagation::Stop
        });
        let event = KeyEvent::from_combo("alt+n").unwrap().with_targets(["root_a"]);
        assert_eq!(d.dispatch(&event), KeyOutcome::Handled);
        assert_eq!(*seen.borrow(), Some(json!(true)));
    }

    #[test]
    fn test_events_outside_form_are_unhandled() {
        let d = dispatcher();
        d.add_shortcuts(&json!({"a": {"fn": "x"}}));
        d.register_key_function("root", "x", |_, _| Propagation::Stop);
        let event = KeyEvent::new("a").with_targets(["sidebar", "body"]);
        assert_eq!(d.dispatch(&event), KeyOutcome::Unhandled);
    }
}
