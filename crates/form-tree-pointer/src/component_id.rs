//! Render-time component ids.
//!
//! A component id is the root name followed by the JSON Pointer steps of the
//! component's data, joined with `_`:
//!
//! ```text
//! /gatherings/0/units/2/taxon  <=>  root_gatherings_0_units_2_taxon
//! ```
//!
//! Ids are only valid for one render pass: reordering an ancestor array
//! changes them. Keys that themselves contain `_` cannot be told apart from
//! nested keys, so the conversion is purely lexical.

use crate::util::{format_json_pointer, parse_json_pointer_relaxed};

/// Default name of the first component id segment.
pub const DEFAULT_ROOT_ID: &str = "root";

/// Separator between component id segments.
pub const ID_SEPARATOR: char = '_';

/// Split a component id rooted at `root` into its data path.
///
/// Returns `None` when `id` is not `root` itself or a descendant of it. The
/// root may itself contain `_`.
///
/// ```
/// use form_tree_pointer::component_id_to_path;
///
/// assert_eq!(component_id_to_path("root_a_0_b", "root"), Some(vec!["a".into(), "0".into(), "b".into()]));
/// assert_eq!(component_id_to_path("my_form_a", "my_form"), Some(vec!["a".into()]));
/// assert_eq!(component_id_to_path("root", "root"), Some(vec![]));
/// assert_eq!(component_id_to_path("other_a", "root"), None);
/// ```
pub fn component_id_to_path(id: &str, root: &str) -> Option<Vec<String>> {
    let rest = id.strip_prefix(root)?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let rest = rest.strip_prefix(ID_SEPARATOR)?;
    Some(rest.split(ID_SEPARATOR).map(str::to_string).collect())
}

/// Convert a component id rooted at `root` into a JSON Pointer.
///
/// ```
/// use form_tree_pointer::component_id_to_pointer;
///
/// assert_eq!(
///     component_id_to_pointer("root_gatherings_0_units_2_taxon", "root").as_deref(),
///     Some("/gatherings/0/units/2/taxon")
/// );
/// assert_eq!(component_id_to_pointer("root", "root").as_deref(), Some(""));
/// assert_eq!(component_id_to_pointer("rooted_a", "root"), None);
/// ```
pub fn component_id_to_pointer(id: &str, root: &str) -> Option<String> {
    component_id_to_path(id, root).map(|path| format_json_pointer(&path))
}

/// Convert a JSON Pointer into a component id under `root`.
///
/// ```
/// use form_tree_pointer::pointer_to_component_id;
///
/// assert_eq!(
///     pointer_to_component_id("/gatherings/0/units/2/taxon", "root"),
///     "root_gatherings_0_units_2_taxon"
/// );
/// assert_eq!(pointer_to_component_id("", "root"), "root");
/// ```
pub fn pointer_to_component_id(pointer: &str, root: &str) -> String {
    let mut id = String::from(root);
    for step in parse_json_pointer_relaxed(pointer) {
        id.push(ID_SEPARATOR);
        id.push_str(&step);
    }
    id
}

/// Check whether `id` is a component id rooted at `root`.
pub fn is_component_id(id: &str, root: &str) -> bool {
    is_owner_of(root, id)
}

/// Check whether `owner` addresses `target` itself or one of its ancestors.
///
/// Matching is segment-aware: `root_a_1` owns `root_a_1` and `root_a_1_b`
/// but not `root_a_10`.
///
/// ```
/// use form_tree_pointer::is_owner_of;
///
/// assert!(is_owner_of("root_a", "root_a_0_b"));
/// assert!(is_owner_of("root_a", "root_a"));
/// assert!(!is_owner_of("root_a_1", "root_a_10"));
/// ```
pub fn is_owner_of(owner: &str, target: &str) -> bool {
    match target.strip_prefix(owner) {
        Some(rest) => rest.is_empty() || rest.starts_with(ID_SEPARATOR),
        None => false,
    }
}
