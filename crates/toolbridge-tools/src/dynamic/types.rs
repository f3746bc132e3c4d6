//! Read-only views over dynamic tool bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Published identifier for an operation of a server
pub fn proxy_identifier(server: &str, operation: &str) -> String {
    format!("{}_{}", server, operation)
}

/// Counts of published proxies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicToolStats {
    pub total_servers: usize,
    pub total_tools: usize,
    pub tools_by_server: BTreeMap<String, usize>,
}

/// Serializable snapshot of the bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicToolState {
    pub servers: BTreeMap<String, Vec<String>>,
    pub total_tools: usize,
    pub exported_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_are_scoped_by_server() {
        assert_eq!(proxy_identifier("fs", "read"), "fs_read");
        assert_ne!(proxy_identifier("a", "read"), proxy_identifier("b", "read"));
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let mut servers = BTreeMap::new();
        servers.insert("fs".to_string(), vec!["fs_read".to_string()]);
        let state = DynamicToolState {
            servers,
            total_tools: 1,
            exported_at: Utc::now(),
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["totalTools"], 1);
        assert_eq!(json["servers"]["fs"][0], "fs_read");
        assert!(json["exportedAt"].is_string());
    }
}
