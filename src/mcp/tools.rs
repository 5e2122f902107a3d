// file: src/mcp/tools.rs
// description: tool descriptors, argument extraction and handlers for auto_commit and get_diff
// reference: https://modelcontextprotocol.io/docs/concepts/tools

use crate::generation::MessageGenerator;
use crate::mcp::types::{RpcError, ToolDefinition, ToolResult};
use crate::models::{ModelName, ProcessingRequest, RepoPath};
use crate::pipeline::ChangePipeline;
use crate::repository::VersionControl;
use crate::utils::Validator;
use schemars::{JsonSchema, schema_for};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

pub const NO_CHANGES: &str = "No changes found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    AutoCommit,
    GetDiff,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::AutoCommit, Tool::GetDiff];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "auto_commit" => Some(Tool::AutoCommit),
            "get_diff" => Some(Tool::GetDiff),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::AutoCommit => "auto_commit",
            Tool::GetDiff => "get_diff",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Tool::AutoCommit => {
                "Generate commit messages for the uncommitted changes of a git repository and commit them, one commit per file or a single commit for everything."
            }
            Tool::GetDiff => {
                "Show the diff of a git repository or of one file in it, from the working tree or from the index."
            }
        }
    }

    fn input_schema(&self) -> Value {
        let schema = match self {
            Tool::AutoCommit => serde_json::to_value(schema_for!(AutoCommitArgs)),
            Tool::GetDiff => serde_json::to_value(schema_for!(GetDiffArgs)),
        };

        let mut schema = schema.unwrap_or_else(|_| json!({ "type": "object" }));
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        schema
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

pub fn list_tools() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

#[derive(Debug, Clone, PartialEq, JsonSchema)]
pub struct AutoCommitArgs {
    /// Path to the git repository whose changes should be committed
    pub repository_path: String,
    /// Model that writes the commit messages, the configured default when omitted
    pub model: Option<String>,
    /// One commit per changed file when true (default), a single commit when false
    pub commit_individually: Option<bool>,
}

impl AutoCommitArgs {
    pub fn from_arguments(args: &Map<String, Value>) -> Result<Self, RpcError> {
        Ok(Self {
            repository_path: required_str(args, "repository_path")?,
            model: optional_str(args, "model")?,
            commit_individually: optional_bool(args, "commit_individually")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, JsonSchema)]
pub struct GetDiffArgs {
    /// Path to the git repository
    pub repository_path: String,
    /// File to diff, relative to the repository root; whole repository when omitted
    pub file_path: Option<String>,
    /// Diff the index instead of the working tree
    pub staged: Option<bool>,
}

impl GetDiffArgs {
    pub fn from_arguments(args: &Map<String, Value>) -> Result<Self, RpcError> {
        Ok(Self {
            repository_path: required_str(args, "repository_path")?,
            file_path: optional_str(args, "file_path")?,
            staged: optional_bool(args, "staged")?,
        })
    }
}

fn required_str(args: &Map<String, Value>, field: &str) -> Result<String, RpcError> {
    optional_str(args, field)?
        .ok_or_else(|| RpcError::invalid_params(format!("Missing required argument: {}", field)))
}

/// `null` counts as absent.
fn optional_str(args: &Map<String, Value>, field: &str) -> Result<Option<String>, RpcError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(field, "a string", other)),
    }
}

fn optional_bool(args: &Map<String, Value>, field: &str) -> Result<Option<bool>, RpcError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(wrong_type(field, "a boolean", other)),
    }
}

fn wrong_type(field: &str, expected: &str, found: &Value) -> RpcError {
    RpcError::invalid_params(format!(
        "Argument {} must be {}, got {}",
        field, expected, found
    ))
}

fn parse_repo(raw: &str) -> Result<RepoPath, RpcError> {
    RepoPath::parse(raw).map_err(|e| RpcError::invalid_params(e.to_string()))
}

pub async fn auto_commit<V, G>(
    pipeline: &ChangePipeline<V, G>,
    default_model: &str,
    args: AutoCommitArgs,
) -> Result<ToolResult, RpcError>
where
    V: VersionControl,
    G: MessageGenerator,
{
    let repo = parse_repo(&args.repository_path)?;
    let model = ModelName::parse(args.model.as_deref().unwrap_or(default_model))
        .map_err(|e| RpcError::invalid_params(e.to_string()))?;
    let request = ProcessingRequest::new(repo, model, args.commit_individually.unwrap_or(true));

    info!(
        "auto_commit on {} with model {} (individual: {})",
        request.repo_path, request.model, request.commit_individually
    );

    let result = pipeline.process(&request).await;
    let summary = result.format_summary();

    if result.has_errors() && result.total_commits == 0 {
        Ok(ToolResult::error(summary))
    } else {
        Ok(ToolResult::text(summary))
    }
}

pub async fn get_diff<V>(vcs: &V, args: GetDiffArgs) -> Result<ToolResult, RpcError>
where
    V: VersionControl,
{
    let repo = parse_repo(&args.repository_path)?;

    if let Some(file) = &args.file_path {
        Validator::validate_relative_file(file)
            .map_err(|e| RpcError::invalid_params(e.to_string()))?;
    }

    if !vcs.is_valid_repository(&repo).await {
        return Err(RpcError::invalid_params(format!(
            "Not a git repository: {}",
            repo
        )));
    }

    let diff = vcs
        .diff(&repo, args.file_path.as_deref(), args.staged.unwrap_or(false))
        .await
        .map_err(|e| {
            warn!("Diff failed in {}: {}", repo, e);
            RpcError::internal(e.to_string())
        })?;

    if diff.trim().is_empty() {
        Ok(ToolResult::text(NO_CHANGES))
    } else {
        Ok(ToolResult::text(diff))
    }
}
