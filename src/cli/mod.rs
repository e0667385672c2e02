//! Command-line interface.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::chat::ChatClient;
use crate::config::ChatConfig;
use crate::error::Result;
use crate::models::ModelRegistry;
use crate::types::{ChatMessage, ContentPart, ConversationTurn, SearchMode};
use crate::usage::{FileUsageStore, OrderMode, UsageTracker};

/// Route, inspect and send chat turns.
#[derive(Parser, Debug)]
#[command(name = "chatroute", version, about = "Chat turn routing and streaming")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the routing decision and request body without sending
    Route(TurnArgs),
    /// Send a turn and stream the reply to stdout
    Chat(TurnArgs),
    /// List models in the current order
    Models(ModelsArgs),
    /// Manage model usage state
    Usage(UsageArgs),
}

/// One conversation turn described on the command line.
#[derive(Args, Debug)]
pub struct TurnArgs {
    /// User prompt
    pub prompt: String,

    /// Model id
    #[arg(short, long, default_value = "gpt-4.1")]
    pub model: String,

    /// Attach a file by name (repeatable)
    #[arg(long = "file", value_name = "NAME")]
    pub files: Vec<String>,

    /// Knowledge-base bot id
    #[arg(long = "bot", value_name = "ID")]
    pub bot_id: Option<String>,

    /// Search mode (off, intelligent, always, direct-agent)
    #[arg(long, default_value = "off")]
    pub search: SearchMode,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Temperature
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Ask for a buffered response
    #[arg(long)]
    pub no_stream: bool,
}

impl TurnArgs {
    /// Build the turn, resolving the model through `registry`.
    pub fn to_turn(&self, registry: &ModelRegistry) -> ConversationTurn {
        let message = if self.files.is_empty() {
            ChatMessage::user(self.prompt.as_str())
        } else {
            let mut parts: Vec<ContentPart> = self
                .files
                .iter()
                .map(|name| ContentPart::file(name.as_str(), format!("file://{name}")))
                .collect();
            parts.push(ContentPart::text(self.prompt.as_str()));
            ChatMessage::user_parts(parts)
        };

        ConversationTurn::builder()
            .messages(vec![message])
            .model(registry.lookup(&self.model))
            .maybe_system_prompt(self.system.clone())
            .maybe_temperature(self.temperature)
            .stream(!self.no_stream)
            .maybe_bot_id(self.bot_id.clone())
            .search_mode(self.search)
            .build()
    }
}

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Ordering to apply (default, usage, custom); the saved mode when omitted
    #[arg(long)]
    pub order: Option<OrderMode>,
}

#[derive(Args, Debug)]
pub struct UsageArgs {
    #[command(subcommand)]
    pub command: UsageCommands,
}

#[derive(Subcommand, Debug)]
pub enum UsageCommands {
    /// Clear usage counts and custom order
    Reset,
    /// Print the stored usage state
    Show,
}

/// Run a parsed command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = ChatConfig::load(cli.config.as_deref())?;
    let tracker = UsageTracker::load(Arc::new(FileUsageStore::new(&config.data_dir)));

    match cli.command {
        Commands::Route(args) => {
            let client = ChatClient::from_config(config)?;
            let plan = client.plan(&args.to_turn(client.registry()))?;
            println!("route:    {}", plan.decision);
            println!("endpoint: {}", plan.endpoint);
            println!("{}", serde_json::to_string_pretty(&plan.request)?);
        }
        Commands::Chat(args) => {
            let client = ChatClient::from_config(config)?.with_usage_tracker(tracker);
            let turn = args.to_turn(client.registry());
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let mut stream = client.stream_and_record(&turn, cancel).await?;
            let mut stdout = std::io::stdout();
            while let Some(delta) = stream.next().await {
                let delta = delta?;
                write!(stdout, "{}", delta.text)?;
                stdout.flush()?;
            }
            writeln!(stdout)?;
        }
        Commands::Models(args) => {
            let registry = ModelRegistry::builtin();
            let mode = args.order.unwrap_or_else(|| tracker.order_mode());
            let state = tracker.snapshot();
            for model in tracker.order(registry.list(), mode) {
                println!(
                    "{:<20} {:<20} uses={}",
                    model.id,
                    model.name,
                    state.usage_count(&model.id)
                );
            }
        }
        Commands::Usage(args) => match args.command {
            UsageCommands::Reset => {
                tracker.reset();
                println!("Usage state reset.");
            }
            UsageCommands::Show => {
                println!("{}", serde_json::to_string_pretty(&tracker.snapshot())?);
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{classify, RoutingDecision};

    #[test]
    fn parse_route_with_files() {
        let cli = Cli::try_parse_from([
            "chatroute",
            "route",
            "Summarize",
            "--file",
            "q3.xlsx",
            "--file",
            "notes.pdf",
        ])
        .unwrap();
        match cli.command {
            Commands::Route(args) => {
                assert_eq!(args.prompt, "Summarize");
                assert_eq!(args.files, vec!["q3.xlsx", "notes.pdf"]);
                assert_eq!(args.model, "gpt-4.1");
                let turn = args.to_turn(&ModelRegistry::builtin());
                assert_eq!(classify(&turn), RoutingDecision::FileAnalysis);
            }
            other => panic!("expected Route, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_search_mode() {
        let cli = Cli::try_parse_from([
            "chatroute",
            "chat",
            "latest rust release",
            "--search",
            "intelligent",
            "--model",
            "o3",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.search, SearchMode::Intelligent);
                let turn = args.to_turn(&ModelRegistry::builtin());
                assert!(turn.model.capabilities.is_reasoning_model);
                assert_eq!(classify(&turn), RoutingDecision::ToolAwareSearch);
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_models_order() {
        let cli = Cli::try_parse_from(["chatroute", "models", "--order", "usage"]).unwrap();
        match cli.command {
            Commands::Models(args) => assert_eq!(args.order, Some(OrderMode::Usage)),
            other => panic!("expected Models, got {other:?}"),
        }
    }

    #[test]
    fn parse_usage_reset_with_config() {
        let cli =
            Cli::try_parse_from(["chatroute", "usage", "reset", "--config", "chat.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("chat.toml")));
        assert!(matches!(
            cli.command,
            Commands::Usage(UsageArgs {
                command: UsageCommands::Reset
            })
        ));
    }

    #[test]
    fn unknown_search_mode_is_rejected() {
        assert!(Cli::try_parse_from(["chatroute", "route", "x", "--search", "sometimes"]).is_err());
    }
}
