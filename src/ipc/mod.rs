//! IPC module for daemon-UI communication

mod protocol;
mod server;

pub use protocol::{ControllerStatus, Request, Response};
pub use server::Server;
