use std::collections::HashSet;
use std::fmt;

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Default field injected into array elements that have no identity.
pub const DEFAULT_TOKEN_FIELD: &str = "_formTreeId";

/// Default field holding an identity assigned by the data's owner.
pub const DEFAULT_PERSISTED_FIELD: &str = "id";

/// Stable identity of an array element.
///
/// String ids are kept verbatim, numeric persisted ids use their JSON number
/// text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Read an identity out of a field value. Empty strings, `null` and
    /// structured values are not identities.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Names of the element fields that carry identities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentityFields {
    /// Reserved field written by injection and removed by stripping.
    pub token_field: String,
    /// Field of identities owned by the data itself. Never written or
    /// removed.
    pub persisted_field: String,
}

impl Default for IdentityFields {
    fn default() -> Self {
        Self {
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            persisted_field: DEFAULT_PERSISTED_FIELD.to_string(),
        }
    }
}

impl IdentityFields {
    /// Identity of an element: the injected token if present, otherwise the
    /// persisted id.
    pub fn identity_of(&self, element: &Value) -> Option<Identity> {
        element.as_object().and_then(|map| self.identity_of_map(map))
    }

    pub(crate) fn identity_of_map(&self, map: &Map<String, Value>) -> Option<Identity> {
        map.get(&self.token_field)
            .and_then(Identity::from_value)
            .or_else(|| map.get(&self.persisted_field).and_then(Identity::from_value))
    }

    /// True when either identity field of `element` equals `identity`.
    pub fn matches(&self, element: &Value, identity: &Identity) -> bool {
        let Some(map) = element.as_object() else {
            return false;
        };
        [&self.token_field, &self.persisted_field]
            .into_iter()
            .filter_map(|field| map.get(field).and_then(Identity::from_value))
            .any(|found| &found == identity)
    }

    pub(crate) fn collect_map(&self, map: &Map<String, Value>, out: &mut HashSet<Identity>) {
        for field in [&self.token_field, &self.persisted_field] {
            if let Some(identity) = map.get(field).and_then(Identity::from_value) {
                out.insert(identity);
            }
        }
    }
}

/// Source of identity tokens for one form instance.
///
/// Tokens are UUIDv4 strings drawn from a xoshiro256** stream. The stream is
/// seeded from the OS unless a seed is given, which makes token sequences
/// reproducible in tests.
pub struct TokenGenerator {
    /// The seed used to initialize the PRNG.
    pub seed: [u8; 32],
    rng: Xoshiro256StarStar,
}

impl TokenGenerator {
    pub fn new(seed: Option<[u8; 32]>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            bytes
        });
        Self {
            seed,
            rng: Xoshiro256StarStar::from_seed(seed),
        }
    }

    /// Generator with a seed expanded from a single integer.
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        for (i, chunk) in bytes.chunks_mut(8).enumerate() {
            chunk.copy_from_slice(&seed.wrapping_add(i as u64).to_le_bytes());
        }
        Self::new(Some(bytes))
    }

    pub fn next_token(&mut self) -> Identity {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Identity(uuid.to_string())
    }

    /// Next token not contained in `taken`.
    pub fn fresh(&mut self, taken: &HashSet<Identity>) -> Identity {
        loop {
            let token = self.next_token();
            if !taken.contains(&token) {
                return token;
            }
        }
    }
}

impl fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator").finish_non_exhaustive()
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}
