use serde::{Deserialize, Serialize};

/// `modules.api_ingress` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiIngressConfig {
    pub bind_addr: String,
    pub enable_docs: bool,
    /// Per-request handler timeout.
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            enable_docs: false,
            request_timeout_secs: 30,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}
