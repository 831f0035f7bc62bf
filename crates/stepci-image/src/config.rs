use serde::{Deserialize, Serialize};

/// Registry client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Registries (host[:port], as written in references) contacted over plain HTTP.
    ///
    /// Intended for local development registries such as `localhost:5000`.
    pub plain_http: Vec<String>,
    /// `User-Agent` header sent with every registry request.
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            plain_http: Vec::new(),
            user_agent: concat!("stepci/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RegistryConfig {
    /// URL scheme used for `registry`.
    pub fn scheme_for(&self, registry: &str) -> &'static str {
        if self.plain_http.iter().any(|r| r == registry) {
            "http"
        } else {
            "https"
        }
    }
}
