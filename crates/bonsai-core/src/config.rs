//! Network settings injected into the session coordinator.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER: &str = "ws://127.0.0.1:8080";
pub const DEFAULT_GAME_ID: &str = "bonsai";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Relay WebSocket URL
    pub server_addr: String,
    /// Namespaces sessions on a shared relay
    pub game_id: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER.into(),
            game_id: DEFAULT_GAME_ID.into(),
        }
    }
}

impl NetworkConfig {
    pub fn new(server_addr: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            game_id: game_id.into(),
        }
    }

    /// Read `BONSAI_SERVER` and `BONSAI_GAME_ID` through `lookup`, falling back
    /// to the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            server_addr: lookup("BONSAI_SERVER").unwrap_or(defaults.server_addr),
            game_id: lookup("BONSAI_GAME_ID").unwrap_or(defaults.game_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = NetworkConfig::from_lookup(|key| {
            (key == "BONSAI_GAME_ID").then(|| "garden".to_string())
        });
        assert_eq!(config.server_addr, DEFAULT_SERVER);
        assert_eq!(config.game_id, "garden");
    }
}
