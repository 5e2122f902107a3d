// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use git_autocommit::mcp::tools::{self, GetDiffArgs};
use git_autocommit::mcp::{McpServer, RequestDispatcher};
use git_autocommit::utils::logging::{format_error, format_info, format_success};
use git_autocommit::{
    ChangePipeline, ChatCompletionClient, Config, GitCli, ModelName, ProcessingRequest, RepoPath,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "git_autocommit")]
#[command(author = "cipher")]
#[command(version)]
#[command(about = "Generate commit messages for uncommitted changes and commit them", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON-RPC tool protocol on stdin/stdout
    Serve,

    /// Commit the uncommitted changes of a repository
    Commit {
        repository: String,

        #[arg(short, long)]
        model: Option<String>,

        /// Put every change into a single commit
        #[arg(long)]
        batch: bool,
    },

    /// Print the diff of a repository or of one file
    Diff {
        repository: String,

        #[arg(short, long)]
        file: Option<String>,

        #[arg(long)]
        staged: bool,
    },

    /// Print the tool descriptors served by `serve`
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    git_autocommit::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    if !cli.config.exists() {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
    }
    let config = Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve => cmd_serve(&config).await?,
        Commands::Commit {
            repository,
            model,
            batch,
        } => cmd_commit(&config, &repository, model.as_deref(), batch).await?,
        Commands::Diff {
            repository,
            file,
            staged,
        } => cmd_diff(&config, repository, file, staged).await?,
        Commands::Tools => cmd_tools()?,
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> Result<ChangePipeline<GitCli, ChatCompletionClient>> {
    let vcs = GitCli::new(config.git.clone());
    let generator = ChatCompletionClient::new(config.generation.clone())
        .context("Failed to create generation client")?;

    Ok(ChangePipeline::new(vcs, generator, &config.pipeline))
}

async fn cmd_serve(config: &Config) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let dispatcher = RequestDispatcher::new(
        pipeline,
        config.generation.default_model.clone(),
        config.server.name.clone(),
    );

    info!(
        "Serving {} tools over stdio (backend {})",
        config.server.name, config.generation.base_url
    );

    McpServer::new(dispatcher)
        .serve_stdio()
        .await
        .context("Protocol loop failed")
}

async fn cmd_commit(config: &Config, repository: &str, model: Option<&str>, batch: bool) -> Result<()> {
    let repo = RepoPath::parse(repository).context("Invalid repository path")?;
    let model = ModelName::parse(model.unwrap_or(&config.generation.default_model))
        .context("Invalid model name")?;
    let individually = !batch && config.pipeline.commit_individually;

    let pipeline = build_pipeline(config)?.with_progress(true);
    let result = pipeline
        .process(&ProcessingRequest::new(repo, model, individually))
        .await;

    let summary = result.format_summary();
    if result.is_empty() {
        println!("{}", format_info(&summary));
    } else if result.has_errors() {
        println!("{}", format_error(&summary));
    } else {
        println!("{}", format_success(&summary));
    }

    if result.has_errors() && result.total_commits == 0 {
        return Err(anyhow::anyhow!("No commits were created"));
    }

    Ok(())
}

async fn cmd_diff(config: &Config, repository: String, file: Option<String>, staged: bool) -> Result<()> {
    let vcs = GitCli::new(config.git.clone());
    let args = GetDiffArgs {
        repository_path: repository,
        file_path: file,
        staged: Some(staged),
    };

    let result = tools::get_diff(&vcs, args).await.context("Failed to read diff")?;
    for block in result.content {
        println!("{}", block.text);
    }

    Ok(())
}

fn cmd_tools() -> Result<()> {
    let descriptors = serde_json::to_string_pretty(&tools::list_tools())
        .context("Failed to serialize tool descriptors")?;
    println!("{}", descriptors);
    Ok(())
}
