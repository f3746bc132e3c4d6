//! In-memory connections and mock drivers for registry tests

use crate::mcp::{McpError, McpTool, McpToolResult};
use crate::registry::{ServerSpec, SupervisorTimeouts};
use crate::runtime::{DriverError, MockRuntimeDriver, ServerConnection};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Listing {
    Ok,
    Fail,
    Hang,
}

/// Test-side view into a fake connection
#[derive(Clone)]
pub(crate) struct Probe {
    closes: Arc<AtomicUsize>,
    alive: Arc<AtomicBool>,
    tools: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    pub(crate) fn new(tools: &[&str]) -> Self {
        Self {
            closes: Arc::new(AtomicUsize::new(0)),
            alive: Arc::new(AtomicBool::new(true)),
            tools: Arc::new(Mutex::new(tools.iter().map(|t| t.to_string()).collect())),
        }
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub(crate) fn advertise(&self, tools: &[&str]) {
        *self.tools.lock() = tools.iter().map(|t| t.to_string()).collect();
    }

    pub(crate) fn connection(&self) -> Box<dyn ServerConnection> {
        Box::new(FakeConnection {
            probe: self.clone(),
            listing: Listing::Ok,
        })
    }

    pub(crate) fn connection_with(&self, listing: Listing) -> Box<dyn ServerConnection> {
        Box::new(FakeConnection {
            probe: self.clone(),
            listing,
        })
    }
}

pub(crate) struct FakeConnection {
    probe: Probe,
    listing: Listing,
}

#[async_trait]
impl ServerConnection for FakeConnection {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        match self.listing {
            Listing::Ok => Ok(self
                .probe
                .tools
                .lock()
                .iter()
                .map(|name| McpTool::new(name.clone()).with_description(format!("{} tool", name)))
                .collect()),
            Listing::Fail => Err(McpError::server(-32601, "Method not found")),
            Listing::Hang => std::future::pending().await,
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult, McpError> {
        match name {
            "explode" => return Err(McpError::server(-32000, "boom")),
            "hang" => std::future::pending::<()>().await,
            _ => {}
        }
        Ok(McpToolResult::text(format!("{}:{}", name, arguments)))
    }

    async fn close(&self) -> Result<(), McpError> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        self.probe.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.probe.alive.load(Ordering::SeqCst)
    }
}

/// Mock driver with `tb-<name>` unit names and the given launch behaviour
pub(crate) fn driver_with<F>(launch: F) -> MockRuntimeDriver
where
    F: FnMut(&ServerSpec) -> Result<Box<dyn ServerConnection>, DriverError> + Send + 'static,
{
    let mut driver = MockRuntimeDriver::new();
    driver
        .expect_unit_name()
        .returning(|spec| format!("tb-{}", spec.name));
    driver.expect_launch().returning(launch);
    driver
}

pub(crate) fn fast_timeouts() -> SupervisorTimeouts {
    SupervisorTimeouts {
        startup: Duration::from_secs(2),
        shutdown: Duration::from_secs(2),
        driver: Duration::from_secs(2),
        call: Duration::from_millis(200),
    }
}

pub(crate) fn launch_failure(spec: &ServerSpec) -> DriverError {
    DriverError::launch(format!("tb-{}", spec.name), "exec format error")
}
