//! JSON Pointer (RFC 6901) and component id addressing.
//!
//! Form data is addressed two ways: by JSON Pointer (`/gatherings/0/units`)
//! and by the render-time component id derived from it
//! (`root_gatherings_0_units`). This crate converts between the two and
//! provides the path helpers the identity and dispatch layers build on.
//!
//! # Example
//!
//! ```
//! use form_tree_pointer::{component_id_to_pointer, get, parse_json_pointer};
//!
//! let pointer = component_id_to_pointer("root_foo_0", "root").unwrap();
//! assert_eq!(pointer, "/foo/0");
//!
//! let doc = serde_json::json!({"foo": [42]});
//! let path = parse_json_pointer(&pointer).unwrap();
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!(42)));
//! ```

use thiserror::Error;

pub mod component_id;
pub mod get;
pub mod util;

pub use component_id::{
    component_id_to_path, component_id_to_pointer, is_component_id, is_owner_of,
    pointer_to_component_id, DEFAULT_ROOT_ID, ID_SEPARATOR,
};
pub use get::{get, get_mut};
pub use util::{
    count_numeric_steps, escape_component, format_json_pointer, is_integer,
    is_valid_index, parse_json_pointer, parse_json_pointer_relaxed, strip_leading_numeric_steps,
    strip_numeric_steps, unescape_component,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("json pointer must be absolute or empty")]
    NotAbsolute,
}
