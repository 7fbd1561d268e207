mod generate;
mod play;

use clap::{Parser, Subcommand};

/// Headless runner for staged conversation rooms: generate a script, then
/// play it back with live typing pacing and ambient room activity.
#[derive(Parser)]
#[command(name = "chatstage", version, about = "Staged conversation playback")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Generate a conversation script and store it.
    Generate(generate::GenerateArgs),
    /// Play a script back as a live room.
    Play(play::PlayArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for development debugging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Generate(args) => generate::run(args).await,
        CliCommand::Play(args) => play::run(args).await,
    }
}
