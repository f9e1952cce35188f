use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;
use protoedit_common::{ByteSource, Clipboard, FileByteSource, MemoryClipboard};
use protoedit_editor::{Diagnostic, Document, EditCommand, ScriptedFrontend, WireCodec};
use std::path::PathBuf;
use tracing::{debug, info};

use super::{load_schema, print_diagnostic, SchemaArgs};
use crate::config::Config;

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Binary document to edit
    pub input: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Create an absent optional field
    #[arg(long, value_name = "PATH")]
    pub create: Vec<String>,

    /// Set a scalar, enum or bool field
    #[arg(long, value_name = "PATH=VALUE")]
    pub set: Vec<String>,

    /// Replace every value of a repeated scalar field
    #[arg(long, value_name = "PATH=V1,V2")]
    pub bulk: Vec<String>,

    /// Append a default element to a repeated field
    #[arg(long, value_name = "PATH")]
    pub append: Vec<String>,

    /// Remove one element of a repeated field
    #[arg(long, value_name = "PATH=INDEX")]
    pub remove_at: Vec<String>,

    /// Remove an optional field or an element path
    #[arg(long, value_name = "PATH")]
    pub remove: Vec<String>,

    /// Replace a bytes field with a file's content
    #[arg(long, value_name = "PATH=FILE")]
    pub embed: Vec<String>,

    /// Copy a field's text to the clipboard
    #[arg(long, value_name = "PATH")]
    pub copy: Vec<String>,

    /// Paste the clipboard into a field
    #[arg(long, value_name = "PATH")]
    pub paste: Vec<String>,

    /// Initial clipboard text
    #[arg(long, value_name = "TEXT")]
    pub clipboard: Option<String>,

    /// JSON file holding a list of edit commands, applied first
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Write the result here instead of back to the input
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn edit(args: EditArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let (pool, root) = load_schema(&args.schema, &config, cwd)?;
    let input = PathBuf::from(cwd).join(&args.input);
    let commands = collect_commands(&args, cwd)?;

    let mut document = Document::load(pool, root, &input, Box::new(WireCodec))
        .with_context(|| format!("Cannot open {}", input.display()))?
        .with_options(config.editor_options());

    let mut frontend = ScriptedFrontend::new(commands);
    let mut clipboard = match &args.clipboard {
        Some(text) => MemoryClipboard::with_contents(text.clone()),
        None => MemoryClipboard::new(),
    };
    let bytes = FileByteSource::with_base_dir(cwd);

    let diagnostics = run_passes(&mut document, &mut frontend, &mut clipboard, &bytes)?;

    for diagnostic in &diagnostics {
        print_diagnostic(diagnostic);
    }
    for (command, reason) in frontend.rejected() {
        println!("{} {}: {}", "rejected".red().bold(), command.target().bright_white(), reason);
    }
    let pending: Vec<&EditCommand> = frontend.pending().collect();
    for command in &pending {
        println!("{} {}: no such field or element", "unmatched".red().bold(), command.target().bright_white());
    }

    match &args.out {
        Some(out) => {
            let out = PathBuf::from(cwd).join(out);
            document
                .save_as(&out)
                .with_context(|| format!("Cannot write {}", out.display()))?;
            println!("  {} Saved {}", "✓".green(), out.display());
        }
        None if document.is_dirty() => {
            document
                .save()
                .with_context(|| format!("Cannot write {}", input.display()))?;
            println!("  {} Saved {}", "✓".green(), input.display());
        }
        None => println!("  {} No changes", "✓".green()),
    }

    let failed = failure_count(&diagnostics, &frontend);
    if failed > 0 {
        bail!("{} edit(s) could not be applied", failed);
    }
    Ok(())
}

/// Run passes until the script is used up or a pass consumes nothing
///
/// Diagnostics are deduplicated across passes.
pub(crate) fn run_passes(
    document: &mut Document,
    frontend: &mut ScriptedFrontend,
    clipboard: &mut dyn Clipboard,
    bytes: &dyn ByteSource,
) -> Result<Vec<Diagnostic>> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut pass = 0;

    loop {
        let before = frontend.consumed_count();
        let report = document.visit(&mut *frontend, &mut *clipboard, bytes)?;
        pass += 1;
        debug!(pass, changed = report.changed(), consumed = frontend.consumed_count(), "Edit pass");

        for diagnostic in report.diagnostics {
            if !diagnostics.contains(&diagnostic) {
                diagnostics.push(diagnostic);
            }
        }

        if frontend.is_done() || frontend.consumed_count() == before {
            break;
        }
    }

    info!(passes = pass, version = document.version, "Edits applied");
    Ok(diagnostics)
}

/// Edits that could not be applied
///
/// Refused and unmatched commands count, as does every diagnostic raised on
/// a commanded path or below it. Diagnostics elsewhere (an unsupported field
/// nobody edited, say) are printed but do not fail the run.
fn failure_count(diagnostics: &[Diagnostic], frontend: &ScriptedFrontend) -> usize {
    let targets: Vec<String> = frontend.commands().iter().map(EditCommand::target).collect();
    let failed_edits = diagnostics
        .iter()
        .filter(|d| targets.iter().any(|target| touches(&d.path, target)))
        .count();
    failed_edits + frontend.rejected().len() + frontend.pending().count()
}

/// Whether `path` is `target` or lies inside it
fn touches(path: &str, target: &str) -> bool {
    path.strip_prefix(target)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}

/// Commands from the script first, then flags grouped by kind
fn collect_commands(args: &EditArgs, cwd: &str) -> Result<Vec<EditCommand>> {
    let mut commands = match &args.script {
        Some(script) => {
            let path = PathBuf::from(cwd).join(script);
            let content = std::fs::read_to_string(&path).with_context(|| format!("Cannot read {}", path.display()))?;
            serde_json::from_str::<Vec<EditCommand>>(&content)
                .with_context(|| format!("Invalid edit script {}", path.display()))?
        }
        None => Vec::new(),
    };

    commands.extend(args.create.iter().map(|path| EditCommand::Create { path: path.clone() }));
    for item in &args.set {
        let (path, value) = parse_assignment(item)?;
        commands.push(EditCommand::Set { path, value });
    }
    for item in &args.bulk {
        let (path, text) = parse_assignment(item)?;
        commands.push(EditCommand::Bulk { path, text });
    }
    commands.extend(args.append.iter().map(|path| EditCommand::Append { path: path.clone() }));
    for item in &args.remove_at {
        let (path, index) = parse_assignment(item)?;
        let index = index
            .parse::<usize>()
            .map_err(|_| anyhow!("Invalid element index in {}", item))?;
        commands.push(EditCommand::RemoveAt { path, index });
    }
    commands.extend(args.remove.iter().map(|path| EditCommand::Remove { path: path.clone() }));
    for item in &args.embed {
        let (path, source) = parse_assignment(item)?;
        commands.push(EditCommand::Embed { path, source });
    }
    commands.extend(args.copy.iter().map(|path| EditCommand::Copy { path: path.clone() }));
    commands.extend(args.paste.iter().map(|path| EditCommand::Paste { path: path.clone() }));

    Ok(commands)
}

/// Split `path=value` at the first `=`
fn parse_assignment(item: &str) -> Result<(String, String)> {
    match item.split_once('=') {
        Some((path, value)) if !path.is_empty() => Ok((path.to_string(), value.to_string())),
        _ => bail!("Expected PATH=VALUE, got {}", item),
    }
}
