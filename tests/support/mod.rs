//! Scriptable runtime driver shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use toolbridge::{
    DriverError, McpError, McpTool, McpToolResult, RuntimeDriver, ServerConnection,
    ServerRegistry, ServerSpec, SupervisorTimeouts, UnitStatus,
};

#[derive(Default)]
struct Script {
    tools: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    units: HashMap<String, UnitStatus>,
    stopped: Vec<String>,
    removed: Vec<String>,
}

/// Driver whose behaviour each test scripts per server
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDriver {
    pub fn advertise(&self, server: &str, tools: &[&str]) {
        self.script.lock().tools.insert(
            server.to_string(),
            tools.iter().map(|t| t.to_string()).collect(),
        );
    }

    /// Make launches of `server` fail (or succeed again)
    pub fn fail_launch(&self, server: &str, failing: bool) {
        let mut script = self.script.lock();
        if failing {
            script.failing.insert(server.to_string());
        } else {
            script.failing.remove(server);
        }
    }

    /// Status the runtime reports for the unit of `server`
    pub fn set_unit(&self, server: &str, status: UnitStatus) {
        self.script.lock().units.insert(unit_of(server), status);
    }

    pub fn stopped_units(&self) -> Vec<String> {
        self.script.lock().stopped.clone()
    }

    pub fn removed_units(&self) -> Vec<String> {
        self.script.lock().removed.clone()
    }

    pub fn registry(&self) -> Arc<ServerRegistry> {
        let timeouts = SupervisorTimeouts {
            startup: Duration::from_secs(2),
            shutdown: Duration::from_secs(2),
            driver: Duration::from_secs(2),
            call: Duration::from_secs(1),
        };
        Arc::new(ServerRegistry::with_timeouts(Arc::new(self.clone()), timeouts))
    }
}

pub fn unit_of(server: &str) -> String {
    format!("it-{}", server)
}

#[async_trait]
impl RuntimeDriver for ScriptedDriver {
    fn unit_name(&self, spec: &ServerSpec) -> String {
        unit_of(&spec.name)
    }

    async fn launch(&self, spec: &ServerSpec) -> Result<Box<dyn ServerConnection>, DriverError> {
        let mut script = self.script.lock();
        if script.failing.contains(&spec.name) {
            return Err(DriverError::launch(unit_of(&spec.name), "image pull failed"));
        }
        script.units.insert(unit_of(&spec.name), UnitStatus::Running);

        let tools = script.tools.get(&spec.name).cloned().unwrap_or_default();
        Ok(Box::new(ScriptedConnection {
            server: spec.name.clone(),
            tools,
            alive: AtomicBool::new(true),
        }))
    }

    async fn status(&self, unit: &str) -> Result<UnitStatus, DriverError> {
        Ok(self
            .script
            .lock()
            .units
            .get(unit)
            .copied()
            .unwrap_or(UnitStatus::NotFound))
    }

    async fn stop(&self, unit: &str) -> Result<(), DriverError> {
        let mut script = self.script.lock();
        script.stopped.push(unit.to_string());
        if let Some(status) = script.units.get_mut(unit) {
            *status = UnitStatus::Stopped;
        }
        Ok(())
    }

    async fn remove(&self, unit: &str) -> Result<(), DriverError> {
        let mut script = self.script.lock();
        script.removed.push(unit.to_string());
        script.units.remove(unit);
        Ok(())
    }
}

struct ScriptedConnection {
    server: String,
    tools: Vec<String>,
    alive: AtomicBool,
}

#[async_trait]
impl ServerConnection for ScriptedConnection {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        Ok(self.tools.iter().map(|name| McpTool::new(name.clone())).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult, McpError> {
        Ok(McpToolResult::text(format!("{}.{}({})", self.server, name, arguments)))
    }

    async fn close(&self) -> Result<(), McpError> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}
