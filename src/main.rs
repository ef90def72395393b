use anyhow::{Context, Result};
use clap::Parser;
use mcadmin::actor::Actor;
use mcadmin::commands::{self, ServerState};
use mcadmin::{config, console};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Server administration console
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the config file. Missing keys are written back with defaults.
    #[arg(long, default_value = "Config.toml")]
    config: PathBuf,

    /// Run as this player instead of the console.
    #[arg(long = "as", value_name = "PLAYER")]
    as_player: Option<String>,

    /// Print completions for the given partial command line and exit.
    #[arg(long, value_name = "INPUT")]
    complete: Option<String>,

    /// Print the command tree visible to the actor as JSON and exit.
    #[arg(long)]
    dump_tree: bool,
}

fn main() -> Result<()> {
    // Setup logging
    let logfile = tracing_appender::rolling::daily("./logs", "mcadmin.log");
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("MCADMIN_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_writer(logfile.and(std::io::stderr))
        .with_env_filter(env_filter)
        .init();

    let args = Args::parse();
    let config = config::init(&args.config)?;
    let state = ServerState::new(&config.players).shared();
    let dispatcher = commands::build_dispatcher(state.clone(), config);

    let actor = match &args.as_player {
        Some(name) => state
            .lock()
            .map_err(|_| anyhow::anyhow!("Server state lock poisoned"))?
            .actor_for(name),
        None => Actor::console(&config.console_name),
    };

    if let Some(input) = args.complete {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("Failed to start completion runtime")?;
        let suggestions = runtime.block_on(console::complete_line(&dispatcher, &actor, &input));
        let limit = usize::try_from(config.max_suggestions).unwrap_or(usize::MAX);
        for suggestion in suggestions.list().iter().take(limit) {
            match suggestion.tooltip() {
                Some(tooltip) => println!("{}\t{}", suggestion.text(), tooltip),
                None => println!("{}", suggestion.text()),
            }
        }
        return Ok(());
    }

    if args.dump_tree {
        let tree = dispatcher.declare(&actor);
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    info!("Accepting commands as {}", actor.name());
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        for output in console::run_line(&dispatcher, &actor, &line) {
            writeln!(stdout, "{output}")?;
        }
        stdout.flush()?;

        let running = state.lock().map(|state| state.running).unwrap_or(false);
        if !running {
            break;
        }
    }
    info!("Shutting down");
    Ok(())
}
