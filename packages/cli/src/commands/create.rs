use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use protoedit_editor::Document;
use std::path::PathBuf;

use super::{load_schema, SchemaArgs};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Where to write the new document
    pub out: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

pub fn create(args: CreateArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let (pool, root) = load_schema(&args.schema, &config, cwd)?;
    let out = PathBuf::from(cwd).join(&args.out);

    if out.exists() && !args.force {
        println!("{} {} already exists", "⚠️".yellow(), out.display().to_string().bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let name = pool.message(root).full_name.clone();
    let mut document = Document::create(pool, root, config.editor_options())?;
    document
        .save_as(&out)
        .with_context(|| format!("Cannot write {}", out.display()))?;

    println!("  {} Created {} ({})", "✓".green(), out.display(), name);
    Ok(())
}
