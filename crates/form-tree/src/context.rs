//! Per-form state.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;

use form_tree_core::{IdTree, Identity, IdentityInjector, PointerResolver, TokenGenerator};
use form_tree_dispatch::{Blocker, BlockerGuard, EventBus, SharedState, ShortcutDispatcher};
use form_tree_pointer::{component_id_to_pointer, pointer_to_component_id};
use serde_json::Value;
use uuid::Uuid;

use crate::config::FormConfig;

/// Opaque id of one form instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(Uuid);

impl InstanceId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Everything one form instance shares between its components: the
/// identity tree of the current schema, the identity token stream, the event
/// bus, the shortcut dispatcher, keyed state and the blocking counter.
///
/// Nothing in here is visible to other instances.
pub struct FormContext {
    instance_id: InstanceId,
    config: FormConfig,
    id_tree: IdTree,
    generator: RefCell<TokenGenerator>,
    bus: EventBus,
    shortcuts: ShortcutDispatcher,
    state: SharedState,
    blocker: Blocker,
}

impl FormContext {
    pub fn new(config: FormConfig) -> Self {
        let generator = match config.seed {
            Some(seed) => TokenGenerator::from_u64(seed),
            None => TokenGenerator::new(None),
        };
        let state = SharedState::new();
        let blocker = Blocker::new();
        let shortcuts = ShortcutDispatcher::new(config.dispatch.clone(), state.clone(), blocker.clone());
        let instance_id = InstanceId::new();
        tracing::debug!(%instance_id, "form context created");
        Self {
            instance_id,
            config,
            id_tree: IdTree::default(),
            generator: RefCell::new(generator),
            bus: EventBus::new(),
            shortcuts,
            state,
            blocker,
        }
    }

    /// Context with its identity tree already built from `schema`.
    pub fn with_schema(config: FormConfig, schema: &Value) -> Self {
        let mut ctx = Self::new(config);
        ctx.set_schema(schema);
        ctx
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Rebuild the identity tree. Call whenever the schema changes.
    pub fn set_schema(&mut self, schema: &Value) {
        self.id_tree = IdTree::from_schema(schema);
    }

    pub fn id_tree(&self) -> &IdTree {
        &self.id_tree
    }

    pub fn injector(&self) -> IdentityInjector<'_> {
        IdentityInjector::new(&self.id_tree, &self.config.identity)
    }

    pub fn resolver(&self) -> PointerResolver<'_> {
        PointerResolver::new(&self.id_tree, &self.config.identity)
            .with_root_id(&self.config.dispatch.root_id)
    }

    /// Inject identities into externally supplied data, in place.
    pub fn inject_in_place(&self, data: &mut Value) -> bool {
        self.injector()
            .inject_in_place(data, &mut self.generator.borrow_mut())
    }

    pub fn inject<'v>(&self, data: &'v Value) -> (Cow<'v, Value>, bool) {
        self.injector().inject(data, &mut self.generator.borrow_mut())
    }

    /// Inject identities into data created for `component_id`, such as new
    /// elements of the array it renders. `data` has the shape of the value
    /// at `component_id`; array positions in the id are ignored.
    pub fn inject_at(&self, component_id: &str, data: &mut Value) -> bool {
        let Some(subtree) = self.resolver().relative_id_tree(component_id) else {
            return false;
        };
        IdentityInjector::new(subtree, &self.config.identity)
            .inject_in_place(data, &mut self.generator.borrow_mut())
    }

    pub fn strip_in_place(&self, data: &mut Value) -> bool {
        self.injector().strip_in_place(data)
    }

    /// Data without injected identities, ready to leave the form.
    pub fn strip<'v>(&self, data: &'v Value) -> Cow<'v, Value> {
        self.injector().strip(data)
    }

    pub fn collect_identities(&self, data: &Value) -> HashSet<Identity> {
        self.injector().collect_all_identities(data)
    }

    pub fn find_pointer(&self, data: &Value, identity: &Identity) -> Option<String> {
        self.resolver().find_pointer(data, identity)
    }

    pub fn component_id(&self, pointer: &str) -> String {
        pointer_to_component_id(pointer, &self.config.dispatch.root_id)
    }

    /// JSON Pointer of `component_id`, or `None` when the id is not rooted
    /// at this form's root id.
    pub fn pointer(&self, component_id: &str) -> Option<String> {
        component_id_to_pointer(component_id, &self.config.dispatch.root_id)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn shortcuts(&self) -> &ShortcutDispatcher {
        &self.shortcuts
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn set_state(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.state.set(key, value)
    }

    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.state.get(key)
    }

    pub fn remove_state(&self, key: &str) -> Option<Value> {
        self.state.remove(key)
    }

    pub fn push_blocker(&self) {
        self.blocker.push();
    }

    pub fn pop_blocker(&self) {
        self.blocker.pop();
    }

    pub fn is_blocked(&self) -> bool {
        self.blocker.is_blocked()
    }

    /// Block key dispatch until the guard is dropped.
    pub fn block(&self) -> BlockerGuard {
        self.blocker.guard()
    }

    /// Unmount `owner_id`: drop its event listeners and key functions.
    /// Returns the number of event listeners removed.
    pub fn teardown_owner(&self, owner_id: &str) -> usize {
        self.shortcuts.unregister_key_functions(owner_id);
        self.bus.unsubscribe_owner(owner_id)
    }

    /// Drop every listener and key function. Listeners may hold handles to
    /// the bus or dispatcher they are registered on, so this also breaks
    /// those reference cycles.
    pub fn teardown(&self) {
        self.bus.clear();
        self.shortcuts.clear();
    }
}

impl fmt::Debug for FormContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormContext")
            .field("instance_id", &self.instance_id)
            .field("config", &self.config)
            .field("id_tree", &self.id_tree)
            .field("bus", &self.bus)
            .field("shortcuts", &self.shortcuts)
            .finish_non_exhaustive()
    }
}

/// Live form instances of one process.
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: HashMap<InstanceId, FormContext>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, config: FormConfig) -> InstanceId {
        let ctx = FormContext::new(config);
        let id = ctx.instance_id();
        self.forms.insert(id, ctx);
        id
    }

    pub fn get(&self, id: InstanceId) -> Option<&FormContext> {
        self.forms.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut FormContext> {
        self.forms.get_mut(&id)
    }

    /// Remove and tear down an instance.
    pub fn remove(&mut self, id: InstanceId) -> Option<FormContext> {
        let ctx = self.forms.remove(&id)?;
        ctx.teardown();
        tracing::debug!(instance_id = %id, "form context removed");
        Some(ctx)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
