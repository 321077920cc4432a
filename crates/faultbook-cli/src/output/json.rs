use faultbook_core::error::FaultbookError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), FaultbookError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
