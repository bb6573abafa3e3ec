//! MCP server integration module.
//!
//! Connects the MCP protocol to the schema catalog and the query tool
//! through the rmcp framework.

pub mod service;

pub use service::GatewayService;
