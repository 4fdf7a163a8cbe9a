//! form-tree: identity addressing and hierarchical dispatch for
//! schema-driven forms.
//!
//! One [`FormContext`] per rendered form ties the pieces together:
//!
//! - `form_tree_pointer`: JSON Pointers and the component ids derived from
//!   them.
//! - `form_tree_core`: identity trees, identity injection and stripping,
//!   identity to pointer resolution.
//! - `form_tree_dispatch`: the event bus and the keyboard shortcut
//!   dispatcher.
//!
//! # Example
//!
//! ```
//! use form_tree::{FormConfig, FormContext, Propagation, SendOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"units": {"type": "array", "items": {"type": "object"}}}
//! });
//! let ctx = FormContext::with_schema(FormConfig::default(), &schema);
//!
//! let input = json!({"units": [{"taxon": "Parus major"}]});
//! let (data, changed) = ctx.inject(&input);
//! assert!(changed);
//! let identity = ctx.collect_identities(&data).into_iter().next().unwrap();
//! let pointer = ctx.find_pointer(&data, &identity).unwrap();
//! assert_eq!(ctx.component_id(&pointer), "root_units_0");
//!
//! ctx.bus().subscribe("root_units", "focus", |_| Propagation::Stop);
//! assert!(ctx.bus().send("root_units_0", "focus", None, SendOptions::default()));
//! ```

pub mod cli;
pub mod config;
pub mod context;

pub use config::{ConfigError, FormConfig};
pub use context::{FormContext, FormRegistry, InstanceId};

pub use form_tree_core::{
    IdTree, Identity, IdentityFields, IdentityInjector, PointerResolver, TokenGenerator,
};
pub use form_tree_dispatch::{
    Blocker, BlockerGuard, DispatchConfig, EventBus, KeyEvent, KeyOutcome, ListenerId, Modifier,
    Modifiers, Propagation, SendOptions, SharedState, Shortcut, ShortcutDispatcher, ShortcutTable,
    ShortcutTarget,
};
pub use form_tree_pointer::{
    component_id_to_pointer, is_owner_of, parse_json_pointer, pointer_to_component_id,
    JsonPointerError,
};
