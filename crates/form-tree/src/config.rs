use form_tree_core::IdentityFields;
use form_tree_dispatch::DispatchConfig;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings of one form instance. Every field has a default, so an empty
/// document is a valid config.
///
/// ```
/// use form_tree::FormConfig;
///
/// let config = FormConfig::from_toml_str(r#"
///     seed = 7
///
///     [identity]
///     persisted_field = "key"
///
///     [dispatch]
///     escape_region = "dialog"
/// "#).unwrap();
/// assert_eq!(config.identity.persisted_field, "key");
/// assert_eq!(config.identity.token_field, "_formTreeId");
/// assert_eq!(config.dispatch.root_id, "root");
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub identity: IdentityFields,
    pub dispatch: DispatchConfig,
    /// Seed of the identity token stream. Random when absent.
    pub seed: Option<u64>,
}

impl FormConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }
}
