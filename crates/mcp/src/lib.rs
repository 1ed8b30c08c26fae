//! # cdsync-mcp
//!
//! MCP (Model Context Protocol) surface for the CData Sync API: JSON-RPC
//! protocol types, the tool registry, the ~20 read/write/execute tools, and
//! the transport-agnostic dispatch service.
//!
//! Transports feed [`McpService::handle_request`] with parsed JSON-RPC
//! requests; the stdio loop lives in [`transport::stdio`], the
//! streamable-HTTP surface in the server crate.

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::PROTOCOL_VERSION;
pub use server::{LifecycleEvent, McpService};
