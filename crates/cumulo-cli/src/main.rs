use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;

use cumulo_bus::ClientBus;
use cumulo_gateway::{Gateway, GatewayChannel, GatewayConfig, StaticTokenValidator};
use cumulo_schema::{new_client_id, ChannelEvent, ConversationTurn, TurnContext};
use cumulo_session::{ClientCredentials, SessionConnection};

#[derive(Parser)]
#[command(name = "cumulo", version, about = "Chat-turn router with weather narratives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Local REPL against the configured intent engine")]
    Chat,
    #[command(about = "Check that the environment carries a complete configuration")]
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat => run_repl().await,
        Commands::Validate => {
            let config = GatewayConfig::from_env()?;
            println!(
                "configuration ok (workspace {})",
                config.assistant.workspace_id
            );
            Ok(())
        }
    }
}

async fn run_repl() -> Result<()> {
    let config = GatewayConfig::from_env()?;

    let bus = Arc::new(ClientBus::new(32));
    let gateway = Arc::new(Gateway::from_config(&config, bus.publisher()));
    // Single-process wiring: the session token is minted here and handed to
    // both sides.
    let token = new_client_id();
    let channel = Arc::new(GatewayChannel::new(
        bus,
        gateway,
        Arc::new(StaticTokenValidator::new(token.clone())),
    ));

    let mut connection = SessionConnection::new(
        channel,
        ClientCredentials {
            token,
            user_id: "user:local".into(),
        },
    );
    let mut events = connection.connect().await?;
    match events.recv().await {
        Some(ChannelEvent::Authenticated(result)) if result.authenticated => {}
        other => anyhow::bail!("channel authentication failed: {other:?}"),
    }

    // Replies print as they arrive, the delayed weather narrative included.
    // The engine owns the context between turns, so the latest returned copy
    // is what the next turn sends.
    let context = Arc::new(Mutex::new(TurnContext::default()));
    let printer_context = context.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ChannelEvent::Reply(reply) => {
                    for line in &reply.output.text {
                        println!("{line}");
                    }
                    *printer_context.lock().await = reply.context;
                }
                ChannelEvent::Disconnected { reason } => {
                    eprintln!("disconnected: {reason}");
                    break;
                }
                ChannelEvent::Authenticated(_) => {}
            }
        }
    });

    println!("cumulo REPL. Type 'quit' to exit.");
    println!("---");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input == "quit" || input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let turn = ConversationTurn::new(input, context.lock().await.clone());
        connection.send_turn(turn).await?;
    }

    connection.disconnect().await;
    Ok(())
}
