//! Apply command - accept unambiguous fixes and write the cleaned dataset.

use std::path::PathBuf;

use colored::Colorize;
use pavemend::{ImportPipeline, PavemendError, PipelineState};

use super::{read_input, year_bound};

pub fn run(
    file: PathBuf,
    profile: String,
    year: Option<i32>,
    output: Option<PathBuf>,
    drop_unresolved: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(&file)?;
    let current_year = year_bound(year);

    let mut pipeline = ImportPipeline::for_profile(&profile, current_year)?;
    pipeline.parse_text(&text)?;
    let report = pipeline.validate()?;
    let defects = report.defect_count();

    if pipeline.state() == PipelineState::Valid {
        println!("{}", "Sheet is already clean; writing canonical form".green());
    } else {
        println!(
            "{} {} defect(s); applying suggested fixes",
            "Found".cyan().bold(),
            defects
        );
        let set = pipeline.suggest()?;

        if verbose {
            for suggestion in set.headers.iter().filter(|s| s.to.is_some()) {
                println!(
                    "  rename '{}' -> '{}'",
                    suggestion.from,
                    suggestion.to.as_deref().unwrap_or_default()
                );
            }
        }

        if drop_unresolved {
            let unresolved: Vec<String> = set
                .headers
                .iter()
                .filter(|s| s.to.is_none())
                .map(|s| s.from.clone())
                .collect();
            let session = pipeline.session_mut()?;
            for header in unresolved {
                println!("  {} column '{}'", "dropping".yellow().bold(), header);
                session.drop_header(header);
            }
        }

        match pipeline.resolve() {
            Ok(()) => {}
            Err(PavemendError::NotReady { blockers }) => {
                eprintln!("{}", "Cannot apply automatically:".red().bold());
                for blocker in &blockers {
                    eprintln!("  - {}", blocker);
                }
                return Err("unresolved blockers remain; fix them and re-run".into());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let dataset = pipeline.apply()?;

    let output_path = output.unwrap_or_else(|| {
        let mut p = file.clone();
        let stem = p.file_stem().unwrap_or_default().to_string_lossy().to_string();
        p.set_file_name(format!("{stem}.cleaned.csv"));
        p
    });
    std::fs::write(&output_path, dataset.to_csv_string())?;

    println!(
        "{} {} ({} rows, {})",
        "Saved to".green().bold(),
        output_path.display().to_string().white(),
        dataset.row_count(),
        dataset.content_hash
    );

    Ok(())
}
