//! Inspect an llm log database and report how its timestamps parse.
//!
//! Usage: `inspect_db [PATH]`

use std::path::PathBuf;

use llmdash_usage::{LogStore, QuerySettings, UsageQuery};

const MARKER: &str = "chat.completion.chunk";

fn default_db_path() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(".config/io.datasette.llm/logs.db")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_db_path);

    let query = UsageQuery::new(LogStore::new(&db_path, MARKER), QuerySettings::default());
    let diag = query.diagnostics()?;

    if !diag.db_exists {
        println!("Database does not exist at {:?}", db_path);
        return Ok(());
    }

    println!("=== Tables ===");
    for table in &diag.tables {
        println!("  {}", table);
    }

    let Some(count) = diag.usage_record_count else {
        println!("\nNo responses table, nothing to inspect");
        return Ok(());
    };

    println!("\n=== Timestamp samples ===");
    for check in &diag.date_parsing_tests {
        match check.parsed {
            Some(date) => println!("  {:<40} -> {}", check.original, date),
            None => println!("  {:<40} -> (unparseable)", check.original),
        }
    }

    println!("\n=== Usage-bearing records ===");
    println!("Count: {}", count);
    println!(
        "Raw range: {} .. {}",
        diag.raw_min_date.as_deref().unwrap_or("-"),
        diag.raw_max_date.as_deref().unwrap_or("-")
    );

    let bounds = query.date_bounds()?;
    println!("Normalized range: {} .. {}", bounds.min_date, bounds.max_date);

    if let Some(sample) = &diag.sample_record {
        println!("\n=== Sample record {} ({}) ===", sample.id, sample.model);
        println!("{}", sample.response_json);
    }

    println!("\n=== Models ===");
    for model in query.models()? {
        println!("  {}", model);
    }

    Ok(())
}
