//! Declarative keyboard shortcuts.
//!
//! Shortcuts are declared as a JSON object keyed by key combo:
//!
//! ```json
//! {
//!     "alt+n": {"fn": "navigate", "reverse": false},
//!     "ctrl+Enter": {"fn": "submit", "target": "root_%{active}"}
//! }
//! ```
//!
//! `fn` names the action a component registers under its id; every other
//! property is handed to the action as a parameter. A `target` binds the
//! shortcut to one component id regardless of where the key was pressed.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Alt,
    Ctrl,
    Shift,
    Meta,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [Modifier::Alt, Modifier::Ctrl, Modifier::Shift, Modifier::Meta];

    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "alt" => Some(Modifier::Alt),
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "shift" => Some(Modifier::Shift),
            "meta" | "cmd" => Some(Modifier::Meta),
            _ => None,
        }
    }
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn is_held(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Alt => self.alt,
            Modifier::Ctrl => self.ctrl,
            Modifier::Shift => self.shift,
            Modifier::Meta => self.meta,
        }
    }

    fn set(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Alt => self.alt = true,
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Shift => self.shift = true,
            Modifier::Meta => self.meta = true,
        }
    }
}

/// A key press as seen by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key value, e.g. `"a"`, `"Enter"`, `"ArrowUp"`.
    pub key: String,
    pub modifiers: Modifiers,
    /// Element ids from the event target outwards. The first one that is a
    /// component id decides which owners see the event.
    pub target_ids: Vec<String>,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Event for a combo written like a shortcut, e.g. `"ctrl+shift+a"`.
    pub fn from_combo(combo: &str) -> Option<Self> {
        let (modifiers, key) = split_combo(combo)?;
        Some(Self {
            key,
            modifiers,
            target_ids: Vec::new(),
        })
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_targets<I, S>(mut self, target_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_ids = target_ids.into_iter().map(Into::into).collect();
        self
    }
}

/// One compiled check of a key combo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Key(String),
    Modifier { modifier: Modifier, held: bool },
}

impl Condition {
    pub fn holds(&self, event: &KeyEvent) -> bool {
        match self {
            Condition::Key(key) => key.eq_ignore_ascii_case(&event.key),
            Condition::Modifier { modifier, held } => event.modifiers.is_held(*modifier) == *held,
        }
    }
}

/// A key combo compiled into conditions. Modifiers that the combo does not
/// name must not be held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    conditions: Vec<Condition>,
}

impl KeyCombo {
    pub fn parse(combo: &str) -> Option<Self> {
        let (modifiers, key) = split_combo(combo)?;
        let mut conditions = vec![Condition::Key(key)];
        conditions.extend(Modifier::ALL.into_iter().map(|modifier| Condition::Modifier {
            modifier,
            held: modifiers.is_held(modifier),
        }));
        Some(Self { conditions })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.conditions.iter().all(|condition| condition.holds(event))
    }
}

fn split_combo(combo: &str) -> Option<(Modifiers, String)> {
    let (head, key) = if combo == "+" {
        ("", "+")
    } else if let Some(head) = combo.strip_suffix("++") {
        (head, "+")
    } else {
        combo.rsplit_once('+').unwrap_or(("", combo))
    };
    if key.is_empty() || Modifier::parse(key).is_some() {
        return None;
    }
    let mut modifiers = Modifiers::default();
    for token in head.split('+').filter(|t| !t.is_empty()) {
        modifiers.set(Modifier::parse(token)?);
    }
    Some((modifiers, key.to_string()))
}

/// Where a shortcut is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutTarget {
    /// To the owners of the focused component, most specific first.
    Ancestry,
    /// To the component id produced by this template, before any ancestor.
    /// `%{name}` placeholders are filled from the form's shared state.
    Explicit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub combo: KeyCombo,
    /// Name of the key function to invoke.
    pub action: String,
    pub target: ShortcutTarget,
    pub params: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawShortcut {
    #[serde(rename = "fn")]
    action: String,
    target: Option<String>,
    #[serde(flatten)]
    params: Map<String, Value>,
}

impl Shortcut {
    pub fn new(combo: KeyCombo, action: impl Into<String>) -> Self {
        Self {
            combo,
            action: action.into(),
            target: ShortcutTarget::Ancestry,
            params: Map::new(),
        }
    }

    pub fn with_target(mut self, template: impl Into<String>) -> Self {
        self.target = ShortcutTarget::Explicit(template.into());
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Compile one descriptor. Returns `None` for anything malformed.
    pub fn from_descriptor(combo: &str, descriptor: &Value) -> Option<Self> {
        let combo = KeyCombo::parse(combo)?;
        let raw = RawShortcut::deserialize(descriptor).ok()?;
        let target = match raw.target {
            Some(template) => ShortcutTarget::Explicit(template),
            None => ShortcutTarget::Ancestry,
        };
        Some(Self {
            combo,
            action: raw.action,
            target,
            params: raw.params,
        })
    }
}

/// Shortcuts of one form, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutTable {
    shortcuts: IndexMap<String, Shortcut>,
}

impl ShortcutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a `{combo: descriptor}` object. Descriptors that cannot be
    /// compiled are skipped.
    pub fn from_json(value: &Value) -> Self {
        let mut table = Self::new();
        table.extend_from_json(value);
        table
    }

    /// Add the descriptors of a `{combo: descriptor}` object, replacing
    /// shortcuts with the same combo. Returns how many were added.
    pub fn extend_from_json(&mut self, value: &Value) -> usize {
        let Some(map) = value.as_object() else {
            tracing::debug!("shortcut declarations must be an object; ignored");
            return 0;
        };
        let mut added = 0;
        for (combo, descriptor) in map {
            match Shortcut::from_descriptor(combo, descriptor) {
                Some(shortcut) => {
                    self.shortcuts.insert(combo.clone(), shortcut);
                    added += 1;
                }
                None => tracing::debug!(combo = combo.as_str(), "malformed shortcut skipped"),
            }
        }
        added
    }

    pub fn insert(&mut self, combo: impl Into<String>, shortcut: Shortcut) -> Option<Shortcut> {
        self.shortcuts.insert(combo.into(), shortcut)
    }

    pub fn remove(&mut self, combo: &str) -> Option<Shortcut> {
        self.shortcuts.shift_remove(combo)
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    /// Shortcuts whose combo matches `event`, in declaration order.
    pub fn matching<'a>(&'a self, event: &'a KeyEvent) -> impl Iterator<Item = &'a Shortcut> + 'a {
        self.shortcuts.values().filter(move |s| s.combo.matches(event))
    }
}

/// Fill `%{name}` placeholders from `state`.
///
/// Strings are inserted verbatim and numbers as written; a missing or
/// structured value, or an unterminated placeholder, yields `None`.
pub fn resolve_target(template: &str, state: &HashMap<String, Value>) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}')?;
        match state.get(&after[..end])? {
            Value::String(s) => out.push_str(s),
            Value::Number(n) => out.push_str(&n.to_string()),
            _ => return None,
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Some(out)
}
