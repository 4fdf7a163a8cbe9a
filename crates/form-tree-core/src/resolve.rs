//! Locating elements by stable identity.
//!
//! Every lookup walks the live data from the top. The data changes between
//! calls (elements get added, removed and moved), so nothing is cached.

use form_tree_pointer::{
    component_id_to_path, count_numeric_steps, format_json_pointer, get, get_mut,
    strip_leading_numeric_steps, strip_numeric_steps, DEFAULT_ROOT_ID,
};
use serde_json::Value;

use crate::id_tree::IdTree;
use crate::identity::{Identity, IdentityFields};

#[derive(Debug, Clone, Copy)]
pub struct PointerResolver<'a> {
    tree: &'a IdTree,
    fields: &'a IdentityFields,
    root_id: &'a str,
}

impl<'a> PointerResolver<'a> {
    pub fn new(tree: &'a IdTree, fields: &'a IdentityFields) -> Self {
        Self {
            tree,
            fields,
            root_id: DEFAULT_ROOT_ID,
        }
    }

    /// Read component ids as rooted at `root_id` instead of `root`.
    pub fn with_root_id(mut self, root_id: &'a str) -> Self {
        self.root_id = root_id;
        self
    }

    /// Current path of the element carrying `identity`, or `None` when no
    /// element carries it any more.
    pub fn find_path(&self, data: &Value, identity: &Identity) -> Option<Vec<String>> {
        let mut path = self.find_in(self.tree, data, identity)?;
        path.reverse();
        Some(path)
    }

    /// [`find_path`](Self::find_path) formatted as a JSON Pointer.
    ///
    /// ```
    /// use form_tree_core::{Identity, IdentityFields, IdTree, PointerResolver};
    /// use serde_json::json;
    ///
    /// let tree = IdTree::from_schema(&json!({
    ///     "type": "object",
    ///     "properties": {"units": {"type": "array", "items": {"type": "object"}}}
    /// }));
    /// let fields = IdentityFields::default();
    /// let data = json!({"units": [{"id": "a"}, {"id": "b"}]});
    ///
    /// let resolver = PointerResolver::new(&tree, &fields);
    /// assert_eq!(resolver.find_pointer(&data, &Identity::from("b")), Some("/units/1".to_string()));
    /// assert_eq!(resolver.find_pointer(&data, &Identity::from("c")), None);
    /// ```
    pub fn find_pointer(&self, data: &Value, identity: &Identity) -> Option<String> {
        self.find_path(data, identity)
            .map(|path| format_json_pointer(&path))
    }

    /// Path of `component_id` relative to the element carrying `identity`.
    ///
    /// The element's current pointer decides how many array positions of the
    /// component id belong to the element; those are dropped together with
    /// the element's own keys. The result stays valid when the element moves.
    pub fn relative_pointer(
        &self,
        data: &Value,
        component_id: &str,
        identity: &Identity,
    ) -> Option<String> {
        let container = self.find_path(data, identity)?;
        self.relative_steps(&container, component_id)
            .map(|steps| format_json_pointer(&steps))
    }

    /// Current absolute pointer of `component_id`, re-anchored on the
    /// element carrying `identity`.
    pub fn absolute_pointer(
        &self,
        data: &Value,
        component_id: &str,
        identity: &Identity,
    ) -> Option<String> {
        let mut container = self.find_path(data, identity)?;
        let relative = self.relative_steps(&container, component_id)?;
        container.extend(relative);
        Some(format_json_pointer(&container))
    }

    /// Identity subtree at the position of `component_id`.
    pub fn relative_id_tree(&self, component_id: &str) -> Option<&'a IdTree> {
        let keys = strip_numeric_steps(&component_id_to_path(component_id, self.root_id)?);
        self.tree.descend(&keys)
    }

    pub fn value_by_identity<'v>(&self, data: &'v Value, identity: &Identity) -> Option<&'v Value> {
        let path = self.find_path(data, identity)?;
        get(data, &path)
    }

    pub fn value_by_identity_mut<'v>(
        &self,
        data: &'v mut Value,
        identity: &Identity,
    ) -> Option<&'v mut Value> {
        let path = self.find_path(data, identity)?;
        get_mut(data, &path)
    }

    fn relative_steps(&self, container: &[String], component_id: &str) -> Option<Vec<String>> {
        let consumed = count_numeric_steps(container);
        let component = component_id_to_path(component_id, self.root_id)?;
        let component = strip_leading_numeric_steps(&component, consumed);
        let container_keys = strip_numeric_steps(container);
        component
            .strip_prefix(container_keys.as_slice())
            .map(<[String]>::to_vec)
    }

    // Paths are built leaf-first and reversed once by the caller.
    fn find_in(&self, node: &IdTree, value: &Value, identity: &Identity) -> Option<Vec<String>> {
        if !node.has_id() {
            return self.find_in_children(node, value, identity);
        }
        let Value::Array(items) = value else {
            return None;
        };
        if let Some(idx) = items.iter().position(|item| self.fields.matches(item, identity)) {
            return Some(vec![idx.to_string()]);
        }
        items.iter().enumerate().find_map(|(idx, item)| {
            let mut path = self.find_in_children(node, item, identity)?;
            path.push(idx.to_string());
            Some(path)
        })
    }

    fn find_in_children(&self, node: &IdTree, value: &Value, identity: &Identity) -> Option<Vec<String>> {
        let Value::Object(map) = value else {
            return None;
        };
        node.children().find_map(|(key, child)| {
            let mut path = self.find_in(child, map.get(key)?, identity)?;
            path.push(key.to_string());
            Some(path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> IdTree {
        IdTree::from_schema(&json!({
            "type": "object",
            "properties": {
                "gatherings": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "units": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "images": {"type": "array", "items": {"type": "object"}}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    fn data() -> Value {
        json!({
            "gatherings": [
                {"id": "g0", "units": [{"id": "u00"}]},
                {"id": "g1", "units": [{"id": "u10"}, {"id": "u11", "images": [{"id": "i0"}]}]}
            ]
        })
    }

    #[test]
    fn test_find_nested() {
        let tree = tree();
        let fields = IdentityFields::default();
        let resolver = PointerResolver::new(&tree, &fields);
        let data = data();
        assert_eq!(resolver.find_pointer(&data, &"g1".into()).as_deref(), Some("/gatherings/1"));
        assert_eq!(
            resolver.find_pointer(&data, &"u11".into()).as_deref(),
            Some("/gatherings/1/units/1")
        );
        assert_eq!(
            resolver.find_pointer(&data, &"i0".into()).as_deref(),
            Some("/gatherings/1/units/1/images/0")
        );
        assert_eq!(resolver.find_pointer(&data, &"nope".into()), None);
    }

    #[test]
    fn test_relative_and_absolute_pointer() {
        let tree = tree();
        let fields = IdentityFields::default();
        let resolver = PointerResolver::new(&tree, &fields);
        let mut data = data();
        let unit: Identity = "u11".into();
        let component = "root_gatherings_1_units_1_images_0_caption";

        assert_eq!(
            resolver.relative_pointer(&data, component, &unit).as_deref(),
            Some("/images/0/caption")
        );

        // move the unit to the front of the first gathering
        let moved = data["gatherings"][1]["units"].as_array_mut().unwrap().remove(1);
        data["gatherings"][0]["units"].as_array_mut().unwrap().insert(0, moved);

        assert_eq!(
            resolver.absolute_pointer(&data, component, &unit).as_deref(),
            Some("/gatherings/0/units/0/images/0/caption")
        );
    }

    #[test]
    fn test_relative_pointer_of_container_itself() {
        let tree = tree();
        let fields = IdentityFields::default();
        let resolver = PointerResolver::new(&tree, &fields);
        let data = data();
        assert_eq!(
            resolver.relative_pointer(&data, "root_gatherings_1", &"g1".into()).as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_relative_pointer_outside_container() {
        let tree = tree();
        let fields = IdentityFields::default();
        let resolver = PointerResolver::new(&tree, &fields);
        let data = data();
        assert_eq!(resolver.relative_pointer(&data, "root_other_0", &"u11".into()), None);
        assert_eq!(resolver.relative_pointer(&data, "root_gatherings_1", &"gone".into()), None);
    }

    #[test]
    fn test_relative_id_tree() {
        let tree = tree();
        let fields = IdentityFields::default();
        let resolver = PointerResolver::new(&tree, &fields);
        let units = resolver.relative_id_tree("root_gatherings_3_units").unwrap();
        assert!(units.has_id());
        assert!(units.get("images").is_some());
        assert_eq!(resolver.relative_id_tree("root"), Some(&tree));
        assert!(resolver.relative_id_tree("root_gatherings_0_place").is_none());
    }

    #[test]
    fn test_root_id_with_separator() {
        let tree = tree();
        let fields = IdentityFields::default();
        let resolver = PointerResolver::new(&tree, &fields).with_root_id("my_form");
        let data = data();
        assert!(resolver.relative_id_tree("my_form_gatherings_0_units").is_some_and(IdTree::has_id));
        assert_eq!(
            resolver
                .absolute_pointer(&data, "my_form_gatherings_1_units_1_images", &"u11".into())
                .as_deref(),
            Some("/gatherings/1/units/1/images")
        );
        assert!(resolver.relative_id_tree("root_gatherings").is_none());
    }

    #[test]
    fn test_value_by_identity_mut() {
        let tree = tree();
        let fields = IdentityFields::default();
        let resolver = PointerResolver::new(&tree, &fields);
        let mut data = data();
        if let Some(unit) = resolver.value_by_identity_mut(&mut data, &"u00".into()) {
            unit["taxon"] = json!("Parus major");
        }
        assert_eq!(
            resolver.value_by_identity(&data, &"u00".into()).map(|u| u["taxon"].clone()),
            Some(json!("Parus major"))
        );
    }
}
