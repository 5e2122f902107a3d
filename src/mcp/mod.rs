// file: src/mcp/mod.rs
// description: MCP (Model Context Protocol) stdio server exposing the commit pipeline as tools
// reference: https://modelcontextprotocol.io/specification/2024-11-05

pub mod dispatch;
pub mod server;
pub mod tools;
pub mod types;

pub use dispatch::{Method, RequestDispatcher};
pub use server::McpServer;
pub use tools::{Tool, list_tools};
pub use types::{JsonRpcRequest, JsonRpcResponse, RpcError, ToolDefinition, ToolResult};
