//! Skirmish server binary.
//!
//! Serves the grid game on one WebSocket endpoint. Clients connect with
//! `?token=<userId>:<userName>` (development authenticator).

use std::path::PathBuf;

use clap::Parser;
use skirmish::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "SKIRMISH_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Directory for the durable grid store. Without it the grid lives in
    /// memory and is lost on exit.
    #[arg(long, env = "SKIRMISH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Clear the stored grid on startup
    #[arg(long, env = "SKIRMISH_RESET")]
    reset: bool,

    /// Grid width in cells
    #[arg(long, default_value_t = 9)]
    width: i32,

    /// Grid height in cells
    #[arg(long, default_value_t = 9)]
    height: i32,

    /// Keep moves strictly inside the grid instead of allowing one step
    /// past the last row and column
    #[arg(long)]
    strict_bounds: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), SkirmishError> {
    init_tracing();
    let args = Args::parse();

    let bounds = if args.strict_bounds {
        BoundsPolicy::Strict
    } else {
        BoundsPolicy::Legacy
    };
    let game_config = GameConfig {
        grid: Grid::new(args.width, args.height).with_bounds(bounds),
        reset_on_start: args.reset,
        ..GameConfig::default()
    };
    let builder = SkirmishServerBuilder::new()
        .bind(&args.bind)
        .game_config(game_config);

    match args.data_dir {
        Some(dir) => {
            let store = FileStore::open(dir).await?;
            tracing::info!(dir = %store.dir().display(), "using file store");
            serve(builder, store).await
        }
        None => {
            tracing::warn!("no data dir given, grid will not survive a restart");
            serve(builder, MemoryStore::new()).await
        }
    }
}

async fn serve<S: KeyValueStore>(
    builder: SkirmishServerBuilder,
    store: S,
) -> Result<(), SkirmishError> {
    let server = builder.build(DevAuthenticator, store).await?;
    server.run().await
}
