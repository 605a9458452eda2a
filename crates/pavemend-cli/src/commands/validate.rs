//! Validate command - report every defect in a survey export.

use std::path::PathBuf;

use colored::Colorize;
use pavemend::{parse, validate, SchemaRegistry};

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

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {} ({} rows, {} columns, profile {})",
            "Validating".cyan().bold(),
            file.display().to_string().white(),
            table.row_count(),
            table.column_count(),
            profile.kind
        );

        if verbose {
            println!();
            println!("{}", "Valid headers:".yellow().bold());
            for header in &report.headers.valid {
                println!("  {}", header);
            }
        }

        print_defects(&report);
    }

    if report.is_clean() {
        if !json {
            println!("{}", "No defects found - sheet is clean".green());
        }
        Ok(())
    } else {
        Err(format!("{} defect(s) found", report.defect_count()).into())
    }
}

fn print_defects(report: &pavemend::ValidationReport) {
    for missing in &report.headers.missing {
        println!(
            "  {} required column '{}' is missing",
            "missing".red().bold(),
            missing
        );
    }
    for invalid in &report.headers.invalid {
        println!(
            "  {} column {} '{}': {}",
            "invalid".red().bold(),
            invalid.column,
            invalid.name,
            invalid.reason.label()
        );
    }
    for dup in &report.headers.duplicate {
        let columns: Vec<String> = dup.copies.iter().map(|c| c.column.to_string()).collect();
        println!(
            "  {} header '{}' appears at columns {}",
            "duplicate".red().bold(),
            dup.name,
            columns.join(", ")
        );
    }
    for issue in &report.value_issues {
        println!(
            "  {} row {} column '{}': {} ({})",
            "value".yellow().bold(),
            issue.row,
            issue.column,
            issue.kind.label(),
            issue.detail
        );
    }
    for group in &report.duplicate_groups {
        let rows: Vec<String> = group.members.iter().map(|r| r.to_string()).collect();
        println!(
            "  {} identity '{}' appears in rows {}",
            "dup-rows".yellow().bold(),
            group.key,
            rows.join(", ")
        );
    }
}
