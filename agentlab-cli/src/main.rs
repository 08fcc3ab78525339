//! agentlab CLI - Run the agent labs against a hosted runtime

use agentlab_core::a2a::{HttpTransport, resolve};
use agentlab_core::config::{LabConfig, MSLEARN_MCP_SERVER_URL};
use agentlab_core::labs::{
    self, BLOG_PROMPT, HANDOFF_PROMPT, LabContext, LabReport, MSLEARN_PROMPT, McpLab,
    RESEARCH_PROMPT, SINGLE_AGENT_PROMPT, WEATHER_PROMPT,
};
use agentlab_core::mcp::McpClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(name = "agentlab")]
#[command(about = "Run hosted-agent labs: code interpreter, A2A delegation and MCP bridging", long_about = None)]
#[command(version)]
struct Cli {
    /// Extra configuration file merged over agentlab.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One agent with the code interpreter
    SingleAgent {
        #[arg(short, long, default_value = SINGLE_AGENT_PROMPT)]
        prompt: String,
    },
    /// A researcher and a writer sharing one thread
    MultiAgent {
        #[arg(long, default_value = RESEARCH_PROMPT)]
        research: String,
        #[arg(long, default_value = HANDOFF_PROMPT)]
        handoff: String,
    },
    /// Bridge the tools of an MCP server to an agent
    McpBridge {
        /// MCP endpoint (defaults to MCP_SERVER_URL or the local server)
        #[arg(long)]
        server_url: Option<String>,
        #[arg(short, long, default_value = WEATHER_PROMPT)]
        prompt: String,
    },
    /// Bridge the public Microsoft Learn MCP server
    Mslearn {
        #[arg(short, long, default_value = MSLEARN_PROMPT)]
        prompt: String,
    },
    /// Delegate to remote agents discovered over A2A
    A2a {
        #[arg(short, long, default_value = BLOG_PROMPT)]
        prompt: String,
    },
    /// Resolve the configured remote agents and print the registry
    Discover,
    /// Probe /health on every configured remote agent URL
    Health,
    /// Version information
    Version,
}

impl Commands {
    fn needs_runtime(&self) -> bool {
        !matches!(self, Commands::Discover | Commands::Health | Commands::Version)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("agentlab {}", env!("CARGO_PKG_VERSION"));
        println!("agentlab-core {}", agentlab_core::VERSION);
        return Ok(());
    }

    let config = LabConfig::load_unvalidated(cli.config.as_deref())
        .context("failed to load configuration")?;
    if cli.command.needs_runtime() {
        config.validate()?;
    }
    let timeout = config.remote_agents.request_timeout;

    let report = match cli.command {
        Commands::SingleAgent { prompt } => {
            labs::single_agent(&LabContext::from_config(&config), &prompt).await?
        }
        Commands::MultiAgent { research, handoff } => {
            labs::multi_agent(&LabContext::from_config(&config), &research, &handoff).await?
        }
        Commands::McpBridge { server_url, prompt } => {
            let url = server_url.unwrap_or_else(|| config.mcp.server_url.clone());
            let client = McpClient::connect(&url, timeout)
                .await
                .with_context(|| format!("failed to connect to MCP server at {url}"))?;
            let lab = McpLab::local(&config.mcp.label, prompt);
            labs::mcp_bridge(&LabContext::from_config(&config), Arc::new(client), &lab).await?
        }
        Commands::Mslearn { prompt } => {
            let client = McpClient::connect(MSLEARN_MCP_SERVER_URL, timeout)
                .await
                .context("failed to connect to the Microsoft Learn MCP server")?;
            let lab = McpLab::mslearn(prompt);
            labs::mcp_bridge(&LabContext::from_config(&config), Arc::new(client), &lab).await?
        }
        Commands::A2a { prompt } => {
            let transport = Arc::new(HttpTransport::new(timeout)?);
            labs::a2a_orchestrator(
                &LabContext::from_config(&config),
                &config.remote_agents.urls,
                transport,
                &prompt,
            )
            .await?
        }
        Commands::Discover => {
            let transport = HttpTransport::new(timeout)?;
            let registry = resolve(&config.remote_agents.urls, &transport).await;
            let agents: Vec<_> = registry.descriptors().cloned().collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&agents)?);
            } else if agents.is_empty() {
                println!("No remote agents discovered.");
            } else {
                for agent in agents {
                    println!("{} ({}) skills=[{}]", agent.name, agent.url, agent.skills.join(", "));
                }
            }
            return Ok(());
        }
        Commands::Health => {
            let transport = HttpTransport::new(timeout)?;
            if config.remote_agents.urls.is_empty() {
                warn!("No remote agent URLs configured");
            }
            for url in &config.remote_agents.urls {
                match transport.check_health(url).await {
                    Ok(true) => println!("{url}: ok"),
                    Ok(false) => println!("{url}: unhealthy"),
                    Err(e) => println!("{url}: unreachable ({e})"),
                }
            }
            return Ok(());
        }
        Commands::Version => return Ok(()),
    };

    print_report(&report, cli.json)
}

fn print_report(report: &LabReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
