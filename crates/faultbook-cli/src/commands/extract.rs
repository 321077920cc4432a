use faultbook_core::error::FaultbookError;
use faultbook_core::model::ParsingMode;
use faultbook_core::RunRequest;
use std::path::PathBuf;

use super::Settings;
use crate::output;

pub fn run(
    settings: &Settings,
    pdf_path: PathBuf,
    table_name: String,
    start_page: usize,
    end_page: usize,
    sew: bool,
    output_format: &str,
) -> Result<(), FaultbookError> {
    let config = settings.resolve()?;
    let request = RunRequest {
        start_page,
        end_page,
        table_name,
        mode: if sew {
            ParsingMode::Sew
        } else {
            ParsingMode::Generic
        },
    };

    let summary = faultbook_core::run(&pdf_path, &request, &config)?;

    match output_format {
        "json" => output::json::print(&summary)?,
        _ => {
            output::table::print_summary(&summary);
            eprintln!("Data stored in: {}", config.database.display());
        }
    }

    // Page-level errors are part of the summary, not a failed run
    Ok(())
}
