// file: src/mcp/dispatch.rs
// description: routes JSON-RPC methods and tool calls to their handlers
// reference: https://modelcontextprotocol.io/specification/2024-11-05/server/tools

use crate::generation::MessageGenerator;
use crate::mcp::tools::{self, AutoCommitArgs, GetDiffArgs, Tool};
use crate::mcp::types::{JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, RpcError, ToolResult};
use crate::pipeline::ChangePipeline;
use crate::repository::VersionControl;
use futures::FutureExt;
use serde_json::{Map, Value, json};
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
    Unknown(String),
}

impl Method {
    pub fn parse(name: &str) -> Self {
        match name {
            "initialize" => Method::Initialize,
            "notifications/initialized" | "initialized" => Method::Initialized,
            "ping" => Method::Ping,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            other => Method::Unknown(other.to_string()),
        }
    }
}

pub struct RequestDispatcher<V, G> {
    pipeline: ChangePipeline<V, G>,
    default_model: String,
    server_name: String,
}

impl<V, G> RequestDispatcher<V, G>
where
    V: VersionControl,
    G: MessageGenerator,
{
    pub fn new(pipeline: ChangePipeline<V, G>, default_model: impl Into<String>, server_name: impl Into<String>) -> Self {
        Self {
            pipeline,
            default_model: default_model.into(),
            server_name: server_name.into(),
        }
    }

    pub fn pipeline(&self) -> &ChangePipeline<V, G> {
        &self.pipeline
    }

    /// Produces exactly one response for `request`.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.unwrap_or(Value::Null);
        debug!("Dispatching {} (id {})", request.method, id);

        let outcome = match Method::parse(&request.method) {
            Method::Initialize => Ok(self.initialize()),
            Method::Initialized | Method::Ping => Ok(json!({})),
            Method::ToolsList => Ok(json!({ "tools": tools::list_tools() })),
            Method::ToolsCall => self.call_tool(&request.params).await,
            Method::Unknown(name) => Err(RpcError::method_not_found(&name)),
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("Request {} failed: {}", id, e);
                JsonRpcResponse::failure(id, e)
            }
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.server_name,
                "version": SERVER_VERSION
            }
        })
    }

    async fn call_tool(&self, params: &Value) -> Result<Value, RpcError> {
        let name = match params.get("name") {
            Some(Value::String(name)) => name.as_str(),
            Some(_) => return Err(RpcError::invalid_params("Tool name must be a string")),
            None => return Err(RpcError::invalid_params("Missing required parameter: name")),
        };

        let tool = Tool::parse(name)
            .ok_or_else(|| RpcError::invalid_params(format!("Unknown tool: {}", name)))?;

        let empty = Map::new();
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(arguments)) => arguments,
            Some(_) => return Err(RpcError::invalid_params("Tool arguments must be an object")),
        };

        let call = AssertUnwindSafe(self.run_tool(tool, arguments)).catch_unwind();
        let result = match call.await {
            Ok(result) => result?,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!("Tool {} panicked: {}", tool.name(), reason);
                return Err(RpcError::internal(format!(
                    "Tool {} failed unexpectedly: {}",
                    tool.name(),
                    reason
                )));
            }
        };

        serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
    }

    async fn run_tool(&self, tool: Tool, arguments: &Map<String, Value>) -> Result<ToolResult, RpcError> {
        match tool {
            Tool::AutoCommit => {
                let args = AutoCommitArgs::from_arguments(arguments)?;
                tools::auto_commit(&self.pipeline, &self.default_model, args).await
            }
            Tool::GetDiff => {
                let args = GetDiffArgs::from_arguments(arguments)?;
                tools::get_diff(self.pipeline.vcs(), args).await
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
