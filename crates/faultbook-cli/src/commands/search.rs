use faultbook_core::error::FaultbookError;
use faultbook_core::store::{CodeQuery, RecordStore, SewQuery, SEW_TABLE};

use super::Settings;
use crate::output;

pub struct SearchArgs {
    pub table_name: Option<String>,
    pub sew: bool,
    pub code: Option<String>,
    pub sub: Option<String>,
    pub text: Option<String>,
}

pub fn run(
    settings: &Settings,
    args: SearchArgs,
    output_format: &str,
) -> Result<(), FaultbookError> {
    let config = settings.resolve()?;

    let table = match (args.table_name, args.sew) {
        (Some(name), _) => name,
        (None, true) => SEW_TABLE.to_string(),
        (None, false) => {
            return Err(FaultbookError::InvalidTableName {
                name: String::new(),
                reason: "--table is required unless --sew is given".into(),
            })
        }
    };

    if !config.database.exists() {
        return Err(FaultbookError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("database file not found at {}", config.database.display()),
        )));
    }
    let store = RecordStore::open(&config.database)?;

    if args.sew {
        let hits = store.search_sew(
            &table,
            &SewQuery {
                fault_code: args.code,
                suberror_code: args.sub,
                description: args.text,
            },
        )?;
        match output_format {
            "json" => output::json::print(&hits)?,
            _ => output::table::print_sew_hits(&hits),
        }
    } else {
        let hits = store.search_generic(
            &table,
            &CodeQuery {
                code: args.code,
                description: args.text,
            },
        )?;
        match output_format {
            "json" => output::json::print(&hits)?,
            _ => output::table::print_code_hits(&hits),
        }
    }

    Ok(())
}
