//! Authorization rule overrides.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-operation role overrides for the authorization table.
///
/// Keys are operation names (`"delete-licence-type"`, `"read-tenant"`, ...),
/// values are the complete list of role names allowed to perform it. An
/// operation absent from the map keeps its built-in rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Operation name → allowed role names.
    #[serde(default)]
    pub overrides: HashMap<String, Vec<String>>,
}
