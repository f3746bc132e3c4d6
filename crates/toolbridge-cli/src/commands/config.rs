//! Configuration display

use toolbridge_core::BridgeConfig;

/// Print the resolved configuration as TOML or JSON
pub fn show(config: &BridgeConfig, json: bool) -> anyhow::Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(config)?
    } else {
        toml::to_string_pretty(config)?
    };
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use toolbridge_core::config::ServerConfig;
    use toolbridge_core::{BridgeConfig, ServerKind};

    #[test]
    fn test_resolved_config_renders_as_toml() {
        let mut config = BridgeConfig::default();
        config.servers.insert(
            "fs".into(),
            ServerConfig::new(ServerKind::Process, vec!["node".into(), "fs.js".into()]),
        );

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[servers.fs]"));
        assert!(rendered.contains("call_timeout = \"1m\""));

        let parsed: BridgeConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
