use std::fmt;

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Identifier namespacing every resource created by one run.
///
/// Rendered as `test_<12-hex>`; the token is deterministic for identical
/// input material and collision-resistant across runs. The identifier also
/// doubles as the name of the run's logical database, so it must stay a
/// valid unquoted SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        Self::from_material(&format!(
            "{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4()
        ))
    }

    pub fn from_material(material: &str) -> Self {
        RunId(format!("test_{}", short_digest(material)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Role-prefixed resource name, e.g. `postgres_test_ab12cd34ef56`.
    pub fn resource_name(&self, role: &str) -> String {
        format!("{}_{}", role, self.0)
    }

    pub fn network_name(&self) -> String {
        self.resource_name("network")
    }

    pub fn database_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First 12 hex characters of the sha-256 of `material`.
pub fn short_digest(material: &str) -> String {
    let digest = Sha256::digest(material.as_bytes());
    hex::encode(digest)[..12].to_string()
}
