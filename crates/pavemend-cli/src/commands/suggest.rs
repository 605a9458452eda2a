//! Suggest command - show the fixes pavemend proposes for a file.

use std::path::PathBuf;

use colored::Colorize;
use pavemend::{parse, suggest_fixes, validate, SchemaRegistry};

use super::{read_input, year_bound};

pub fn run(
    file: PathBuf,
    profile: String,
    year: Option<i32>,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(&file)?;
    let profile = SchemaRegistry::profile(&profile)?;
    let current_year = year_bound(year);

    let table = parse(&text)?;
    let report = validate(&table, profile, current_year);

    if report.is_clean() {
        println!("{}", "No defects found - nothing to suggest".green());
        return Ok(());
    }

    let set = suggest_fixes(&report, &table, profile, current_year);

    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }

    println!(
        "{} {} (profile {})",
        "Suggestions for".cyan().bold(),
        file.display().to_string().white(),
        profile.kind
    );

    for suggestion in &set.headers {
        match &suggestion.to {
            Some(target) => {
                let rule = suggestion
                    .rule
                    .map(|r| format!(" [{r}]"))
                    .unwrap_or_default();
                println!(
                    "  {} '{}' -> '{}'{}",
                    "rename".green().bold(),
                    suggestion.from,
                    target,
                    if verbose { rule } else { String::new() }
                );
            }
            None => println!(
                "  {} '{}' has no confident target; drop or rename manually",
                "unresolved".red().bold(),
                suggestion.from
            ),
        }
    }

    for collision in &set.collisions {
        println!(
            "  {} {} all resolve to '{}'",
            "collision".red().bold(),
            collision.sources.join(", "),
            collision.target
        );
    }

    for correction in &set.value_corrections {
        let rows: Vec<String> = correction.rows.iter().map(|r| r.to_string()).collect();
        println!(
            "  {} {} '{}' -> {} (rows {})",
            "value".green().bold(),
            correction.column,
            correction.raw,
            correction.corrected,
            rows.join(", ")
        );
    }

    println!();
    if set.is_unambiguous() {
        println!(
            "{}",
            "All suggestions are unambiguous; `pavemend apply` will accept them".green()
        );
    } else {
        println!(
            "{}",
            "Some headers need a manual decision before applying".yellow()
        );
    }

    Ok(())
}
