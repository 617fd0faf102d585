use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, error, info};

use synkbot::agent::{OllamaBackend, Orchestrator};
use synkbot::config::Config;
use synkbot::synkctl::SynkctlClient;
use synkbot::tools::ToolRegistry;

const DEFAULT_SESSION: &str = "default";

/// SynkBot - Talk to your SunSynk inverter
#[derive(Parser)]
#[command(name = "synkbot")]
#[command(version)]
#[command(about = "SynkBot - An AI chatbot for talking to your SunSynk inverter", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat on stdin (default)
    Chat {
        /// Session identifier for the conversation history
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Ask a single question and print the answer
    Ask {
        question: String,
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Call a tool directly and print its JSON outcome
    Tool {
        /// Tool name, e.g. battery_state
        name: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Print the tool definitions offered to the language model
    Tools,
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let app_log_level = config.default.log_level.as_str();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("synkbot={}", app_log_level).parse()?)
                .add_directive("reqwest=warn".parse()?)
                .add_directive("hyper=warn".parse()?),
        )
        .init();
    Ok(())
}

fn chat(orchestrator: &mut Orchestrator<OllamaBackend>, session: &str) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("Welcome to SynkBot! How can I help you with your solar installation?");
    println!("Type /reset to start over, exit to leave.");
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }
        if question == "/reset" {
            orchestrator.reset(session);
            println!("Conversation cleared.\n");
            continue;
        }

        match orchestrator.ask(session, question) {
            Ok(answer) => println!("{}\n", answer),
            Err(e) => error!("Failed to answer: {}", e),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration first (to get log level)
    let config_path = cli.config;
    let config = Config::from_file(&config_path)?;
    init_tracing(&config)?;

    info!("Configuration loaded from: {}", config_path);
    debug!("  synkctl: {} (timeout {:?})", config.synkctl.command, config.synkctl.timeout);
    debug!("  LLM: {} at {}", config.llm.model, config.llm.endpoint);

    let registry = ToolRegistry::new(SynkctlClient::from_config(&config.synkctl));

    match cli.command.unwrap_or(Command::Chat {
        session: DEFAULT_SESSION.to_string(),
    }) {
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
        }
        Command::Tool { name, args } => {
            let arguments: Value =
                serde_json::from_str(&args).context("Tool arguments must be valid JSON")?;
            let outcome = registry.call(&name, &arguments);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.is_ok() {
                std::process::exit(1);
            }
        }
        Command::Ask { question, session } => {
            let backend = OllamaBackend::new(&config.llm)?;
            let mut orchestrator = Orchestrator::new(backend, registry, &config.llm);
            let answer = orchestrator.ask(&session, &question)?;
            println!("{}", answer);
        }
        Command::Chat { session } => {
            let backend = OllamaBackend::new(&config.llm)?;
            let mut orchestrator = Orchestrator::new(backend, registry, &config.llm);
            chat(&mut orchestrator, &session)?;
        }
    }

    Ok(())
}
