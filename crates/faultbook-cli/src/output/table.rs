use faultbook_core::model::ExtractionRun;
use faultbook_core::store::{StoredErrorCode, StoredSewRecord};

pub fn print_summary(run: &ExtractionRun) {
    println!("=== {} ({}) ===\n", run.table_name, run.mode);
    println!("  Pages processed:  {}", run.pages_processed);
    println!("  Records inserted: {}", run.records_inserted);
    println!("  Rows rejected:    {}", run.rows_rejected);
    println!("  Rows merged:      {}", run.rows_merged);

    if run.is_clean() {
        println!();
        return;
    }

    println!("\n  Page errors:");
    for err in &run.errors {
        println!("    page {:>4}: {}", err.page_number, err.reason);
    }
    println!();
}

pub fn print_sew_hits(hits: &[StoredSewRecord]) {
    if hits.is_empty() {
        println!("No matching error codes.");
        return;
    }

    let fault_width = hits
        .iter()
        .map(|h| h.fault_code.len())
        .max()
        .unwrap_or(0)
        .max("Fault".len());
    let sub_width = hits
        .iter()
        .map(|h| h.suberror_code.len())
        .max()
        .unwrap_or(0)
        .max("Sub".len());

    println!(
        "  {:<fw$}  {:<sw$}  Description",
        "Fault",
        "Sub",
        fw = fault_width,
        sw = sub_width
    );
    for hit in hits {
        println!(
            "  {:<fw$}  {:<sw$}  {}",
            hit.fault_code,
            hit.suberror_code,
            hit.description,
            fw = fault_width,
            sw = sub_width
        );
    }
    println!("\n  {} result(s)", hits.len());
}

pub fn print_code_hits(hits: &[StoredErrorCode]) {
    if hits.is_empty() {
        println!("No matching error codes.");
        return;
    }

    let code_width = hits
        .iter()
        .map(|h| h.code.len())
        .max()
        .unwrap_or(0)
        .max("Code".len());

    println!("  {:<width$}  Description", "Code", width = code_width);
    for hit in hits {
        println!("  {:<width$}  {}", hit.code, hit.description, width = code_width);
    }
    println!("\n  {} result(s)", hits.len());
}
