use std::io;

use anyhow::Context;
use backend::config::{parse_bind_addr, ServerConfig, StoreBackend};
use chess_arena::hotseat::{self, HotseatConfig, HotseatEnd};
use chess_engine::constants::{DEFAULT_SEARCH_DEPTH, MAX_SEARCH_DEPTH};
use chess_engine::Color;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess-arena")]
#[command(about = "Chess game server and terminal hot-seat game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP game server
    Serve(ServeArgs),
    /// Play in the terminal
    Play(PlayArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address, overrides CHESS_BIND_ADDR
    #[arg(long)]
    bind: Option<String>,

    /// sqlite: URL, overrides DATABASE_URL
    #[arg(long, conflicts_with = "memory")]
    database_url: Option<String>,

    /// Keep games in memory even if DATABASE_URL is set
    #[arg(long)]
    memory: bool,
}

#[derive(Args)]
struct PlayArgs {
    /// Name of the White player
    #[arg(long, default_value = "White")]
    white: String,

    /// Name of the Black player
    #[arg(long, default_value = "Black")]
    black: String,

    /// Let the engine play this color
    #[arg(long, value_enum)]
    engine: Option<EngineSide>,

    /// Engine search depth
    #[arg(
        long,
        default_value_t = DEFAULT_SEARCH_DEPTH,
        value_parser = clap::value_parser!(u8).range(1..=i64::from(MAX_SEARCH_DEPTH))
    )]
    depth: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineSide {
    White,
    Black,
}

impl From<EngineSide> for Color {
    fn from(side: EngineSide) -> Self {
        match side {
            EngineSide::White => Color::White,
            EngineSide::Black => Color::Black,
        }
    }
}

fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            init_tracing("info");
            serve(args)
        }
        Command::Play(args) => {
            // Keep the board readable: only warnings unless RUST_LOG says otherwise
            init_tracing("warn");
            play(args)
        }
    }
}

fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ServerConfig::from_env().context("invalid server configuration")?;

    if let Some(bind) = args.bind {
        config.bind_addr = parse_bind_addr(&bind)?;
    }
    if args.memory {
        config.store = StoreBackend::Memory;
    } else if let Some(url) = args.database_url {
        config.store = StoreBackend::from_url(&url)?;
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(backend::server::run(config))
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    let config = HotseatConfig {
        white: args.white,
        black: args.black,
        engine: args.engine.map(Color::from),
        depth: args.depth,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    match hotseat::run(&config, stdin.lock(), &mut stdout)? {
        HotseatEnd::Finished(_) => {}
        HotseatEnd::Quit => println!("Game abandoned."),
    }
    Ok(())
}
