//! Transports feeding requests into the MCP service.

pub mod stdio;
