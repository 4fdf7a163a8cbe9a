//! Identity trees derived from JSON Schema.
//!
//! An identity tree keeps only the parts of a schema that lead to an array of
//! objects. Those arrays are flagged with `has_id`: their elements must carry
//! a stable identity so they can be found again after the array is
//! reordered.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Shape-only projection of a schema.
///
/// For an object node, `children` mirrors the schema's `properties`. For a
/// `has_id` node, `children` mirrors the `items.properties` of the array, so
/// every element of the array is walked with the same node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdTree {
    has_id: bool,
    children: IndexMap<String, IdTree>,
}

impl IdTree {
    /// Walk a schema and build its identity tree.
    ///
    /// Schemas without any array of objects produce an empty tree.
    ///
    /// ```
    /// use form_tree_core::IdTree;
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "name": {"type": "string"},
    ///         "units": {"type": "array", "items": {"type": "object", "properties": {}}}
    ///     }
    /// });
    /// let tree = IdTree::from_schema(&schema);
    /// assert!(tree.get("units").is_some_and(IdTree::has_id));
    /// assert!(tree.get("name").is_none());
    /// ```
    pub fn from_schema(schema: &Value) -> Self {
        walk_schema(schema).unwrap_or_default()
    }

    pub fn has_id(&self) -> bool {
        self.has_id
    }

    pub fn is_empty(&self) -> bool {
        !self.has_id && self.children.is_empty()
    }

    /// Child nodes in schema declaration order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &IdTree)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&IdTree> {
        self.children.get(key)
    }

    /// Follow a sequence of object keys down the tree.
    pub fn descend<S: AsRef<str>>(&self, keys: &[S]) -> Option<&IdTree> {
        let mut node = self;
        for key in keys {
            node = node.children.get(key.as_ref())?;
        }
        Some(node)
    }

    /// Render as JSON, marking identity arrays with `"_hasId": true`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        if self.has_id {
            out.insert("_hasId".to_string(), Value::Bool(true));
        }
        for (key, child) in &self.children {
            out.insert(key.clone(), child.to_json());
        }
        Value::Object(out)
    }
}

fn schema_type(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

fn walk_properties(schema: &Value) -> IndexMap<String, IdTree> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return IndexMap::new();
    };
    properties
        .iter()
        .filter_map(|(key, prop)| walk_schema(prop).map(|tree| (key.clone(), tree)))
        .collect()
}

fn walk_schema(schema: &Value) -> Option<IdTree> {
    match schema_type(schema)? {
        "object" => {
            let children = walk_properties(schema);
            if children.is_empty() {
                None
            } else {
                Some(IdTree {
                    has_id: false,
                    children,
                })
            }
        }
        "array" => {
            let items = schema.get("items")?;
            if schema_type(items)? != "object" {
                return None;
            }
            Some(IdTree {
                has_id: true,
                children: walk_properties(items),
            })
        }
        _ => None,
    }
}
