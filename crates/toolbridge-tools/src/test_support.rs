//! In-memory driver and connections for proxy tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use toolbridge_core::mcp::McpContent;
use toolbridge_core::{
    DriverError, McpError, McpTool, McpToolResult, RuntimeDriver, ServerConnection, ServerKind,
    ServerRegistry, ServerSpec, UnitStatus,
};

/// Driver whose servers advertise whatever the test configured
#[derive(Clone, Default)]
pub(crate) struct FakeDriver {
    tools: Arc<Mutex<HashMap<String, Vec<String>>>>,
    alive: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl FakeDriver {
    pub(crate) fn advertise(&self, server: &str, tools: &[&str]) {
        self.tools.lock().insert(
            server.to_string(),
            tools.iter().map(|t| t.to_string()).collect(),
        );
    }

    /// Make the next listing wait until the returned handle is notified
    pub(crate) fn hold_listings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Drop the live connection of a server without telling the registry
    pub(crate) fn kill(&self, server: &str) {
        if let Some(flag) = self.alive.lock().get(server) {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl RuntimeDriver for FakeDriver {
    fn unit_name(&self, spec: &ServerSpec) -> String {
        format!("fake-{}", spec.name)
    }

    async fn launch(&self, spec: &ServerSpec) -> Result<Box<dyn ServerConnection>, DriverError> {
        let alive = Arc::new(AtomicBool::new(true));
        self.alive.lock().insert(spec.name.clone(), alive.clone());
        Ok(Box::new(FakeConnection {
            server: spec.name.clone(),
            tools: self.tools.clone(),
            alive,
            gate: self.gate.clone(),
        }))
    }

    async fn status(&self, _unit: &str) -> Result<UnitStatus, DriverError> {
        Ok(UnitStatus::Running)
    }

    async fn stop(&self, _unit: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn remove(&self, _unit: &str) -> Result<(), DriverError> {
        Ok(())
    }
}

struct FakeConnection {
    server: String,
    tools: Arc<Mutex<HashMap<String, Vec<String>>>>,
    alive: Arc<AtomicBool>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

#[async_trait]
impl ServerConnection for FakeConnection {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if !self.alive.load(Ordering::SeqCst) {
            return Err(McpError::connection("Connection closed"));
        }
        Ok(self
            .tools
            .lock()
            .get(&self.server)
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        McpTool::new(name.clone()).with_description(format!("{} files", name))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult, McpError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(McpError::connection("Connection closed"));
        }
        match name {
            "explode" => Err(McpError::server(-32000, "boom")),
            "deny" => Ok(McpToolResult {
                content: vec![McpContent::text("permission denied")],
                is_error: true,
            }),
            _ => Ok(McpToolResult::text(format!("{}/{}:{}", self.server, name, arguments))),
        }
    }

    async fn close(&self) -> Result<(), McpError> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Registry over a [`FakeDriver`] with the named process servers added
pub(crate) fn registry_with(driver: &FakeDriver, servers: &[&str]) -> Arc<ServerRegistry> {
    let registry = ServerRegistry::new(Arc::new(driver.clone()));
    for name in servers {
        registry
            .add(ServerSpec::new(
                *name,
                ServerKind::Process,
                vec!["node".into(), format!("{}.js", name)],
            ))
            .unwrap();
    }
    Arc::new(registry)
}
