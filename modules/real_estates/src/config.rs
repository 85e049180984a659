use serde::{Deserialize, Serialize};

/// Configuration for the real_estates module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealEstatesConfig {
    /// The single origin allowed to call the API from a browser.
    #[serde(default = "default_cors_allowed_origin")]
    pub cors_allowed_origin: String,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for RealEstatesConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origin: default_cors_allowed_origin(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_cors_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_name_length() -> usize {
    100
}
