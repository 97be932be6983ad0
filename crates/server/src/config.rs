use serde::Deserialize;
use std::path::{Path, PathBuf};

use tandem_match::MatchTuning;

/// Server configuration, loaded from a TOML file. Every field has a
/// default so a missing file or a partial one both work; the
/// `[matching]` table overrides individual tuning knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub matching: MatchTuning,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:8470".to_string(),
            db_path: PathBuf::from("tandem.db"),
            matching: MatchTuning::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
    }

    /// Missing config file is fine; a present-but-broken one is not.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
