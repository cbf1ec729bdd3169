//! Deployment target identity.

use serde::{Deserialize, Serialize};

/// The account/region pair every stack is synthesized against.
///
/// Constructed once at the entry point and handed down to every stack and
/// resource builder; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvContext {
    pub account: String,
    pub region: String,
}

impl EnvContext {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

impl std::fmt::Display for EnvContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.account, self.region)
    }
}
