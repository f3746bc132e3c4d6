//! Runtime driver for managed units
//!
//! The driver is the only component that talks to the operating system or
//! the container runtime. It launches a server and hands back a connected
//! control channel, and it answers status/stop/remove for container units.
//! The runtime itself is the source of truth; the driver keeps no state.

mod command;
mod connection;
mod driver;
mod error;

pub use command::{CommandDriver, CommandDriverConfig};
pub use connection::ServerConnection;
pub use driver::{RuntimeDriver, UnitStatus, sanitize_unit_name};
pub use error::DriverError;

#[cfg(test)]
pub use driver::MockRuntimeDriver;
