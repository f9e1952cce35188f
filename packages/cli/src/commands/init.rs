use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use protoedit_editor::DEFAULT_MAX_COMPLETION_DEPTH;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Compiled descriptor set, relative to the project directory
    #[arg(short, long, default_value = "schema.pb")]
    pub descriptor_set: String,

    /// Fully-qualified root message name
    #[arg(short, long)]
    pub message: Option<String>,

    /// Replace an existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} is already present, leaving it untouched (pass --force to replace it)",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        return Ok(());
    }

    println!("{}", "📝 Initializing protoedit project...".bright_blue().bold());

    let config = Config {
        descriptor_set: Some(args.descriptor_set.clone()),
        root_message: args.message.clone(),
        max_completion_depth: DEFAULT_MAX_COMPLETION_DEPTH,
    };

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("Next steps:");
    println!(
        "  1. Run: protoc --include_imports --descriptor_set_out={} <your .proto files>",
        args.descriptor_set
    );
    if args.message.is_none() {
        println!("  2. Set \"rootMessage\" in {}", DEFAULT_CONFIG_NAME);
    }
    println!("  {}. Run: protoedit create document.bin", if args.message.is_none() { 3 } else { 2 });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        let args = InitArgs {
            descriptor_set: "build/app.pb".to_string(),
            message: Some("app.Settings".to_string()),
            force: false,
        };
        init(args, cwd).unwrap();

        let config = Config::load(cwd).unwrap();
        assert_eq!(config.descriptor_set.as_deref(), Some("build/app.pb"));
        assert_eq!(config.root_message.as_deref(), Some("app.Settings"));
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "rootMessage": "keep.Me" }"#).unwrap();

        let args = InitArgs {
            descriptor_set: "schema.pb".to_string(),
            message: None,
            force: false,
        };
        init(args, cwd).unwrap();

        let config = Config::load(cwd).unwrap();
        assert_eq!(config.root_message.as_deref(), Some("keep.Me"));
    }
}
