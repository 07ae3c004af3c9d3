//! Tetherscope - live kinematics telemetry for the spinning tether rig

mod cli;
mod simulate;

use clap::{Parser, Subcommand};
use cli::{ServeArgs, SimulateArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tetherscope")]
#[command(about = "Derives rig kinematics from position samples and streams them to viewers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream telemetry to WebSocket viewers
    Serve(ServeArgs),
    /// Run one pipeline offline and print its telemetry
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => run_server(args),
        Some(Commands::Simulate(args)) => simulate::run(&args),
        // Default to serving with the development source
        None => run_server(ServeArgs::parse_from(["serve"])),
    }
}

fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    use tokio::runtime::Runtime;
    let config = args.server_config()?;
    let sources = args.source.factory()?;
    let rt = Runtime::new()?;
    rt.block_on(tetherscope_server::serve(config, sources))
}
