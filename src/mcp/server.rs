// file: src/mcp/server.rs
// description: newline-delimited JSON-RPC loop over async reader and writer
// reference: https://modelcontextprotocol.io/specification/2024-11-05/basic/transports#stdio

use crate::error::Result;
use crate::generation::MessageGenerator;
use crate::mcp::dispatch::RequestDispatcher;
use crate::mcp::types::{JsonRpcRequest, JsonRpcResponse, RpcError};
use crate::repository::VersionControl;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub struct McpServer<V, G> {
    dispatcher: RequestDispatcher<V, G>,
}

impl<V, G> McpServer<V, G>
where
    V: VersionControl,
    G: MessageGenerator,
{
    pub fn new(dispatcher: RequestDispatcher<V, G>) -> Self {
        Self { dispatcher }
    }

    /// Serves stdin and stdout until the peer closes its end.
    pub async fn serve_stdio(&self) -> Result<()> {
        let reader = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await
    }

    /// Reads one request per line and answers each with one response line,
    /// strictly in order. Returns at end of input; only a failed write (or
    /// read) on the transport ends the loop early.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Protocol loop started");
        let mut buffer = Vec::new();

        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer).await? == 0 {
                info!("Input closed, stopping protocol loop");
                return Ok(());
            }

            let response = match std::str::from_utf8(&buffer) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim()).await,
                Err(e) => {
                    warn!("Discarding line that is not valid UTF-8: {}", e);
                    JsonRpcResponse::failure(Value::Null, RpcError::parse_error(e.to_string()))
                }
            };

            write_response(&mut writer, &response).await?;
        }
    }

    pub async fn handle_line(&self, line: &str) -> JsonRpcResponse {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Malformed request line: {}", e);
                return JsonRpcResponse::failure(
                    Value::Null,
                    RpcError::parse_error(format!("Parse error: {}", e)),
                );
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!("Line is not a request: {}", e);
                return JsonRpcResponse::failure(
                    id,
                    RpcError::parse_error(format!("Invalid request: {}", e)),
                );
            }
        };

        self.dispatcher.dispatch(request).await
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');

    writer.write_all(&line).await?;
    writer.flush().await?;
    debug!("Wrote {} byte response", line.len());
    Ok(())
}
