pub mod create;
pub mod describe;
pub mod edit;
pub mod init;
mod render;
pub mod show;

pub use create::{create, CreateArgs};
pub use describe::{describe, DescribeArgs};
pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use show::{show, ShowArgs};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use protoedit_editor::{Diagnostic, DiagnosticLevel};
use protoedit_schema::{MessageIndex, SchemaPool};
use tracing::debug;

use crate::config::Config;

/// Schema selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Compiled descriptor set (protoc --descriptor_set_out)
    #[arg(short, long)]
    pub descriptor_set: Option<PathBuf>,

    /// Fully-qualified root message name
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Resolve the schema pool and root message from flags, then config
pub fn load_schema(args: &SchemaArgs, config: &Config, cwd: &str) -> Result<(Arc<SchemaPool>, MessageIndex)> {
    let path = args
        .descriptor_set
        .clone()
        .or_else(|| config.descriptor_set_path(cwd))
        .ok_or_else(|| anyhow!("No descriptor set given (use --descriptor-set or protoedit.config.json)"))?;

    let bytes = std::fs::read(&path).with_context(|| format!("Cannot read {}", path.display()))?;
    let pool = SchemaPool::decode_descriptor_set(&bytes)?;
    debug!(path = %path.display(), messages = pool.messages().len(), "Loaded descriptor set");

    let name = match args.message.as_ref().or(config.root_message.as_ref()) {
        Some(name) => name.clone(),
        None if pool.messages().len() == 1 => pool.messages()[0].full_name.clone(),
        None => return Err(anyhow!("No root message given (use --message or rootMessage)")),
    };
    let root = pool
        .message_by_name(&name)
        .ok_or_else(|| anyhow!("Unknown message type: {}", name))?;

    Ok((Arc::new(pool), root))
}

pub(crate) fn print_diagnostic(diagnostic: &Diagnostic) {
    let level = match diagnostic.level {
        DiagnosticLevel::Error => "error".red().bold(),
        DiagnosticLevel::Warning => "warning".yellow().bold(),
    };
    println!("{} {}: {}", level, diagnostic.path.bright_white(), diagnostic.message);
}
