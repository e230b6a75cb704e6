// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use agent_toolkit::utils::logging::{format_error, format_info, format_step, format_success, format_warning};
use agent_toolkit::{
    Config, EmbeddingBackend, FilesystemMcp, HealthStatus, RagPipeline, ShellMcp, Validator,
    chat, doctor,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rmcp::ServiceExt;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "agent_toolkit")]
#[command(version)]
#[command(about = "Filesystem and shell MCP servers, a chat proxy and RAG for local LLM agents", long_about = None)]
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
    /// Serve sandboxed file operations over MCP on stdio
    FsMcp {
        /// Root directory every path is confined to
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,
    },

    /// Serve shell command execution over MCP on stdio
    ShellMcp,

    /// Run the HTTP chat proxy
    ChatServer {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Answer a question from the given files, directories or URLs
    Ask {
        /// File, directory or http(s) URL to index (repeatable)
        #[arg(short, long = "source", value_name = "SOURCE", required = true)]
        sources: Vec<String>,

        question: String,

        /// Use the built-in hashed embeddings instead of the model server
        #[arg(long)]
        offline_embeddings: bool,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Check the sandbox root, local shells and the model server
    Doctor {
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    colored::control::set_override(cli.color);
    agent_toolkit::utils::logging::init_logger(cli.color, cli.verbose);

    let config_path = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Some(cli.config.as_path())
    } else {
        warn!("{} not found, using defaults and environment", cli.config.display());
        None
    };
    let mut config = Config::load(config_path).context("Failed to load configuration")?;

    match cli.command {
        Commands::FsMcp { base_dir } => {
            if let Some(dir) = base_dir {
                config.filesystem.base_dir = dir;
            }
            cmd_fs_mcp(&config).await?;
        }
        Commands::ShellMcp => {
            cmd_shell_mcp(&config).await?;
        }
        Commands::ChatServer { host, port } => {
            if let Some(host) = host {
                config.chat.host = host;
            }
            if let Some(port) = port {
                config.chat.port = port;
            }
            cmd_chat_server(&config).await?;
        }
        Commands::Ask {
            sources,
            question,
            offline_embeddings,
            top_k,
        } => {
            if let Some(k) = top_k {
                config.rag.top_k = k;
            }
            cmd_ask(&config, &sources, &question, offline_embeddings).await?;
        }
        Commands::Doctor { json } => {
            cmd_doctor(&config, json).await?;
        }
        Commands::Config => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config).context("Failed to render configuration")?
            );
        }
    }

    Ok(())
}

async fn cmd_fs_mcp(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    Validator::validate_directory(&config.filesystem.base_dir)
        .context("Filesystem base directory is not usable")?;

    let server = FilesystemMcp::new(&config.filesystem).context("Failed to create filesystem server")?;

    info!(
        "Filesystem MCP server ready (base: {}, write: {}, delete: {}). Available tools:",
        server.files().sandbox().base_dir().display(),
        config.filesystem.allow_write,
        config.filesystem.allow_delete
    );
    for tool in server.get_tool_router().list_all() {
        info!(
            "  - {}: {}",
            tool.name,
            tool.description.as_deref().unwrap_or("No description")
        );
    }

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio transport")?;
    service.waiting().await?;

    info!("Filesystem MCP server stopped");
    Ok(())
}

async fn cmd_shell_mcp(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let server = ShellMcp::new(&config.shell);

    info!("Shell MCP server ready. Available tools:");
    for tool in server.get_tool_router().list_all() {
        info!(
            "  - {}: {}",
            tool.name,
            tool.description.as_deref().unwrap_or("No description")
        );
    }

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio transport")?;
    service.waiting().await?;

    info!("Shell MCP server stopped");
    Ok(())
}

async fn cmd_chat_server(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    chat::serve(&config.chat).await.context("Chat server failed")?;
    Ok(())
}

async fn cmd_ask(config: &Config, sources: &[String], question: &str, offline: bool) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    Validator::validate_not_blank("Question", question)?;

    let embedder = EmbeddingBackend::from_config(&config.chat, &config.rag, offline)?;
    let mut pipeline = RagPipeline::new(config, embedder, true)?;

    let total_steps = sources.len() + 1;
    for (step, source) in sources.iter().enumerate() {
        eprintln!("{}", format_step(step + 1, total_steps, &format!("Indexing {}", source)));
        let added = pipeline
            .ingest(source)
            .await
            .with_context(|| format!("Failed to index {}", source))?;
        eprintln!("{}", format_success(&format!("{} chunks from {}", added, source)));
    }

    eprintln!("{}", format_step(total_steps, total_steps, "Asking the model"));
    let answer = pipeline.ask(question).await.context("Failed to answer question")?;

    println!("\n{}\n", answer.answer.trim());
    println!("{}", "=".repeat(80));
    println!("Sources:\n");
    for (idx, hit) in answer.sources.iter().enumerate() {
        println!("{}. {}", idx + 1, hit.format_summary(300));
    }

    Ok(())
}

async fn cmd_doctor(config: &Config, json: bool) -> Result<()> {
    eprintln!("{}", format_info("Running health checks"));
    let report = doctor::run_checks(config).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.format());
    }

    match report.overall_status {
        HealthStatus::Healthy => eprintln!("{}", format_success("All checks passed")),
        HealthStatus::Degraded => eprintln!("{}", format_warning("Some checks are degraded")),
        HealthStatus::Unhealthy => {
            eprintln!("{}", format_error("Some checks failed"));
            return Err(anyhow::anyhow!("Health check failed"));
        }
    }

    Ok(())
}
