mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    create, describe, edit, init, show, CreateArgs, DescribeArgs, EditArgs, InitArgs, ShowArgs,
};
use tracing_subscriber::EnvFilter;

/// Protoedit CLI - schema-driven editing of binary protobuf documents
#[derive(Parser, Debug)]
#[command(name = "protoedit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a protoedit project config
    Init(InitArgs),

    /// Print the field tree of a message type
    Describe(DescribeArgs),

    /// Create a new document holding every required field
    Create(CreateArgs),

    /// Print the contents of a document
    Show(ShowArgs),

    /// Apply edits to a document and save it
    Edit(EditArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Describe(args) => describe(args, &cwd),
                Command::Create(args) => create(args, &cwd),
                Command::Show(args) => show(args, &cwd),
                Command::Edit(args) => edit(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
