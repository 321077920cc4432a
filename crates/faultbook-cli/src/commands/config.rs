use faultbook_core::error::FaultbookError;

use super::Settings;
use crate::output;

pub fn show(settings: &Settings) -> Result<(), FaultbookError> {
    let config = settings.resolve()?;
    output::json::print(&config)
}
