//! Identity injection and stripping.
//!
//! Both walks follow the identity tree in lockstep with the data. Where the
//! data does not have the shape the tree expects (an object where an array
//! should be, a string where an object should be) the value is left alone.
//!
//! The copying variants return the input borrowed when nothing changes.
//! Otherwise the result is a new tree: containers on a changed path are
//! rebuilt and their untouched children are cloned into them, not shared.

use std::borrow::Cow;
use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::id_tree::IdTree;
use crate::identity::{Identity, IdentityFields, TokenGenerator};

/// What to do with each element of an identity array.
enum ItemEdit<'g> {
    Inject {
        generator: &'g mut TokenGenerator,
        taken: HashSet<Identity>,
    },
    Strip,
}

impl ItemEdit<'_> {
    // A reserved field holding something other than an identity belongs to
    // the data: inject does not overwrite it and strip does not remove it.
    fn needs(&self, fields: &IdentityFields, item: &Map<String, Value>) -> bool {
        let token = item.get(&fields.token_field);
        match self {
            ItemEdit::Inject { .. } => {
                if token.is_some_and(|v| Identity::from_value(v).is_none()) {
                    tracing::debug!(
                        field = fields.token_field.as_str(),
                        "reserved field occupied; element left without identity"
                    );
                    return false;
                }
                fields.identity_of_map(item).is_none()
            }
            ItemEdit::Strip => token.and_then(Identity::from_value).is_some(),
        }
    }

    fn apply(&mut self, fields: &IdentityFields, item: &mut Map<String, Value>) {
        match self {
            ItemEdit::Inject { generator, taken } => {
                let token = generator.fresh(taken);
                taken.insert(token.clone());
                item.insert(fields.token_field.clone(), Value::String(token.into_string()));
            }
            ItemEdit::Strip => {
                item.shift_remove(&fields.token_field);
            }
        }
    }
}

/// Assigns and removes identity tokens on the elements of identity arrays.
#[derive(Debug, Clone, Copy)]
pub struct IdentityInjector<'a> {
    tree: &'a IdTree,
    fields: &'a IdentityFields,
}

impl<'a> IdentityInjector<'a> {
    pub fn new(tree: &'a IdTree, fields: &'a IdentityFields) -> Self {
        Self { tree, fields }
    }

    /// Give every identity-less element a fresh token, mutating `data`.
    ///
    /// Returns whether anything was written. Running it again on the result
    /// writes nothing.
    pub fn inject_in_place(&self, data: &mut Value, generator: &mut TokenGenerator) -> bool {
        let mut edit = ItemEdit::Inject {
            generator,
            taken: self.collect_all_identities(data),
        };
        self.rewrite_in_place(self.tree, data, &mut edit)
    }

    /// Like [`inject_in_place`](Self::inject_in_place) but leaves `data`
    /// untouched.
    ///
    /// Returns the borrowed input when no element needed a token. Otherwise
    /// returns an owned copy with the tokens written.
    pub fn inject<'v>(
        &self,
        data: &'v Value,
        generator: &mut TokenGenerator,
    ) -> (Cow<'v, Value>, bool) {
        let mut edit = ItemEdit::Inject {
            generator,
            taken: self.collect_all_identities(data),
        };
        let out = self.rewrite(self.tree, data, &mut edit);
        let mutated = matches!(out, Cow::Owned(_));
        (out, mutated)
    }

    /// Remove injected tokens, mutating `data`. Persisted ids are kept.
    pub fn strip_in_place(&self, data: &mut Value) -> bool {
        self.rewrite_in_place(self.tree, data, &mut ItemEdit::Strip)
    }

    /// Remove injected tokens without touching `data`.
    pub fn strip<'v>(&self, data: &'v Value) -> Cow<'v, Value> {
        self.rewrite(self.tree, data, &mut ItemEdit::Strip)
    }

    /// Every identity present in `data`, tokens and persisted ids alike.
    pub fn collect_all_identities(&self, data: &Value) -> HashSet<Identity> {
        let mut out = HashSet::new();
        self.collect(self.tree, data, &mut out);
        out
    }

    fn collect(&self, node: &IdTree, value: &Value, out: &mut HashSet<Identity>) {
        if node.has_id() {
            let Value::Array(items) = value else {
                return;
            };
            for item in items {
                if let Value::Object(map) = item {
                    self.fields.collect_map(map, out);
                }
                self.collect_children(node, item, out);
            }
        } else {
            self.collect_children(node, value, out);
        }
    }

    fn collect_children(&self, node: &IdTree, value: &Value, out: &mut HashSet<Identity>) {
        let Value::Object(map) = value else {
            return;
        };
        for (key, child) in node.children() {
            if let Some(v) = map.get(key) {
                self.collect(child, v, out);
            }
        }
    }

    fn rewrite_in_place(&self, node: &IdTree, value: &mut Value, edit: &mut ItemEdit<'_>) -> bool {
        if !node.has_id() {
            return self.rewrite_children_in_place(node, value, edit);
        }
        let Value::Array(items) = value else {
            tracing::debug!("identity array expected, found other value; left as is");
            return false;
        };
        let mut changed = false;
        for item in items.iter_mut() {
            if let Value::Object(map) = item {
                if edit.needs(self.fields, map) {
                    edit.apply(self.fields, map);
                    changed = true;
                }
            }
            changed |= self.rewrite_children_in_place(node, item, edit);
        }
        changed
    }

    fn rewrite_children_in_place(
        &self,
        node: &IdTree,
        value: &mut Value,
        edit: &mut ItemEdit<'_>,
    ) -> bool {
        let Value::Object(map) = value else {
            return false;
        };
        let mut changed = false;
        for (key, child) in node.children() {
            if let Some(v) = map.get_mut(key) {
                changed |= self.rewrite_in_place(child, v, edit);
            }
        }
        changed
    }

    fn rewrite<'v>(&self, node: &IdTree, value: &'v Value, edit: &mut ItemEdit<'_>) -> Cow<'v, Value> {
        if !node.has_id() {
            return self.rewrite_children(node, value, edit);
        }
        let Value::Array(items) = value else {
            return Cow::Borrowed(value);
        };
        let mut out: Option<Vec<Value>> = None;
        for (i, item) in items.iter().enumerate() {
            let next = match item {
                Value::Object(map) if edit.needs(self.fields, map) => {
                    let mut map = map.clone();
                    edit.apply(self.fields, &mut map);
                    let mut owned = Value::Object(map);
                    self.rewrite_children_in_place(node, &mut owned, edit);
                    Cow::Owned(owned)
                }
                _ => self.rewrite_children(node, item, edit),
            };
            match next {
                Cow::Owned(v) => out.get_or_insert_with(|| items[..i].to_vec()).push(v),
                Cow::Borrowed(v) => {
                    if let Some(out) = out.as_mut() {
                        out.push(v.clone());
                    }
                }
            }
        }
        out.map_or(Cow::Borrowed(value), |items| Cow::Owned(Value::Array(items)))
    }

    fn rewrite_children<'v>(
        &self,
        node: &IdTree,
        value: &'v Value,
        edit: &mut ItemEdit<'_>,
    ) -> Cow<'v, Value> {
        let Value::Object(map) = value else {
            return Cow::Borrowed(value);
        };
        let mut out: Option<Map<String, Value>> = None;
        for (key, child) in node.children() {
            let Some(v) = map.get(key) else {
                continue;
            };
            if let Cow::Owned(next) = self.rewrite(child, v, edit) {
                out.get_or_insert_with(|| map.clone()).insert(key.to_string(), next);
            }
        }
        out.map_or(Cow::Borrowed(value), |map| Cow::Owned(Value::Object(map)))
    }
}
