// Core types and shared plumbing for the cdsync MCP adapter

pub mod odata;
pub mod serde_util;
pub mod settings;
pub mod types;
pub mod validate;

pub use odata::{ODataList, ODataQuery};
pub use settings::{AuthCredentials, Settings, SettingsError, TransportMode};
pub use types::*;
pub use validate::ValidationError;
