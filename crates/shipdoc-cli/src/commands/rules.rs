//! Rules command - inspect and check rule tables.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use shipdoc_core::extract::rules::{load_rule_table, CaptureDef, RuleTableDef};
use shipdoc_core::{FieldName, RuleEngine};

use super::{load_config, load_rules};

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Show the active rule table
    Show {
        /// Rule table file (default: configured or built-in table)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate and compile a rule table file
    Check {
        /// Rule table file
        file: PathBuf,
    },
}

pub async fn run(args: RulesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        RulesCommand::Show { rules, json } => {
            let config = load_config(config_path)?;
            let table = load_rules(rules.as_deref(), &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print!("{}", describe(&table));
            }
            Ok(())
        }
        RulesCommand::Check { file } => check(&file),
    }
}

fn check(file: &Path) -> anyhow::Result<()> {
    let table = load_rule_table(file)?;
    RuleEngine::new(&table)?;

    let matchers: usize = table.fields.iter().map(|rule| rule.matchers.len()).sum();
    println!(
        "{} {} (v{}): {} fields, {} matchers",
        style("✓").green(),
        table.name,
        table.version,
        table.fields.len(),
        matchers
    );

    for field in FieldName::ALL {
        if table.rule(field).is_none() {
            println!(
                "  {} no rule for {}, the column will always be empty",
                style("⚠").yellow(),
                field
            );
        }
    }

    Ok(())
}

/// Human-readable listing of a rule table, matchers in priority order.
fn describe(table: &RuleTableDef) -> String {
    let mut output = format!("{} (version {})\n", table.name, table.version);
    if let Some(description) = &table.description {
        output.push_str(&format!("{}\n", description));
    }

    for field in FieldName::ALL {
        output.push('\n');
        output.push_str(&format!("{}\n", field));

        let Some(rule) = table.rule(field) else {
            output.push_str("  (no rule)\n");
            continue;
        };

        for (priority, matcher) in rule.matchers.iter().enumerate() {
            let separators = if matcher.separators.is_empty() {
                "none".to_string()
            } else {
                let list = matcher.separators.join(" ");
                if matcher.separator_required {
                    format!("{} (required)", list)
                } else {
                    list
                }
            };

            let capture = match &matcher.capture {
                CaptureDef::Token { class, prefix } => match prefix {
                    Some(prefix) => format!("token [{}] with optional {:?}", class, prefix),
                    None => format!("token [{}]", class),
                },
                CaptureDef::RestOfLine => "rest of line".to_string(),
                CaptureDef::UntilLabels { terminators } => format!(
                    "until {}",
                    terminators
                        .iter()
                        .map(FieldName::column)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            };

            output.push_str(&format!(
                "  {}. {}  sep: {}  capture: {}  normalize: {:?}\n",
                priority + 1,
                matcher.labels.join(" | "),
                separators,
                capture,
                matcher.normalize
            ));
        }
    }

    output
}
