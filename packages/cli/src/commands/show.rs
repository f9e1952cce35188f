use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use protoedit_common::{FileByteSource, MemoryClipboard};
use protoedit_editor::{Document, WireCodec};
use std::path::PathBuf;

use super::render::TreeRenderer;
use super::{load_schema, print_diagnostic, SchemaArgs};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Binary document to display
    pub input: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Also list optional fields that are not set
    #[arg(short, long)]
    pub all: bool,
}

pub fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let (pool, root) = load_schema(&args.schema, &config, cwd)?;
    let input = PathBuf::from(cwd).join(&args.input);

    let mut document = Document::load(pool, root, &input, Box::new(WireCodec))
        .with_context(|| format!("Cannot open {}", input.display()))?
        .with_options(config.editor_options());

    let mut renderer = TreeRenderer::new(args.all);
    let report = document.visit(&mut renderer, &mut MemoryClipboard::new(), &FileByteSource::with_base_dir(cwd))?;

    println!("{}", document.pool().message(root).full_name.bright_white().bold());
    for line in renderer.lines() {
        println!("  {}", line);
    }

    for diagnostic in &report.diagnostics {
        print_diagnostic(diagnostic);
    }

    Ok(())
}
