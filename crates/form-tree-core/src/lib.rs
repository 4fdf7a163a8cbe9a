//! Stable identities for schema-driven form data.
//!
//! Form data is edited while it is being rendered: array elements are
//! inserted, deleted and moved, which invalidates every index-based address.
//! This crate keeps elements addressable across such edits:
//!
//! - [`IdTree`] marks, from the schema alone, which arrays hold objects that
//!   need an identity.
//! - [`IdentityInjector`] writes identity tokens into those elements and
//!   strips them again before the data leaves the form.
//! - [`PointerResolver`] turns an identity back into the element's current
//!   JSON Pointer.
//!
//! # Example
//!
//! ```
//! use form_tree_core::{IdTree, IdentityFields, IdentityInjector, PointerResolver, TokenGenerator};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"units": {"type": "array", "items": {"type": "object"}}}
//! });
//! let tree = IdTree::from_schema(&schema);
//! let fields = IdentityFields::default();
//! let mut data = json!({"units": [{}, {}]});
//!
//! IdentityInjector::new(&tree, &fields).inject_in_place(&mut data, &mut TokenGenerator::new(None));
//! let second = fields.identity_of(&data["units"][1]).unwrap();
//!
//! data["units"].as_array_mut().unwrap().swap(0, 1);
//! let resolver = PointerResolver::new(&tree, &fields);
//! assert_eq!(resolver.find_pointer(&data, &second).as_deref(), Some("/units/0"));
//! ```

pub mod id_tree;
pub mod identity;
pub mod inject;
pub mod resolve;

pub use id_tree::IdTree;
pub use identity::{
    Identity, IdentityFields, TokenGenerator, DEFAULT_PERSISTED_FIELD, DEFAULT_TOKEN_FIELD,
};
pub use inject::IdentityInjector;
pub use resolve::PointerResolver;
