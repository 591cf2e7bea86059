mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate::GenerateArgs, schema::SchemaArgs};
use env_logger::Env;

#[derive(Parser)]
#[command(name = "descgen", about = "Generate descriptor decoders from an IDL document")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write DescriptorDecoder.h/.cpp
    Generate(GenerateArgs),
    /// Print the assembled schema tables
    Schema(SchemaArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => args.run(),
        Commands::Schema(args) => args.run(),
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default)).init();
}
