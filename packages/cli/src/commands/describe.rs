use anyhow::Result;
use clap::Args;
use colored::Colorize;
use protoedit_schema::{FieldDescriptor, FieldType, MessageIndex, SchemaPool};

use super::{load_schema, SchemaArgs};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Dump the whole schema pool as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn describe(args: DescribeArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let (pool, root) = load_schema(&args.schema, &config, cwd)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&*pool)?);
        return Ok(());
    }

    println!("{}", pool.message(root).full_name.bright_white().bold());
    let mut chain = vec![root];
    for line in describe_message(&pool, root, &mut chain, 1) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per field, nested messages indented below their field
///
/// A message type already on the chain is printed once and not expanded
/// again, so recursive schemas terminate.
fn describe_message(pool: &SchemaPool, message: MessageIndex, chain: &mut Vec<MessageIndex>, depth: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for field in pool.fields_of(message) {
        lines.push(format!("{}{}", "  ".repeat(depth), describe_field(pool, field)));

        if let FieldType::Message { index } = field.field_type {
            if chain.contains(&index) {
                lines.push(format!("{}{}", "  ".repeat(depth + 1), "(recursive)".dimmed()));
                continue;
            }
            chain.push(index);
            lines.extend(describe_message(pool, index, chain, depth + 1));
            chain.pop();
        }
    }
    lines
}

fn describe_field(pool: &SchemaPool, field: &FieldDescriptor) -> String {
    let label = if field.is_repeated() {
        "repeated ".cyan().to_string()
    } else if field.required {
        "required ".yellow().to_string()
    } else {
        String::new()
    };

    let type_name = match &field.field_type {
        FieldType::Message { index } => pool.message(*index).full_name.clone(),
        FieldType::Enum { index } => {
            let schema = pool.enumeration(*index);
            let values: Vec<String> = schema
                .values
                .iter()
                .map(|v| format!("{}={}", v.name, v.number))
                .collect();
            format!("{} {{{}}}", schema.full_name, values.join(", "))
        }
        FieldType::Unsupported { name } => format!("{} (unsupported)", name).red().to_string(),
        other => other.to_string(),
    };

    format!("{}{} {} = {}", label, type_name, field.name.bold(), field.number)
}
