//! Run every record of a movies JSON file through the write validator.
//! Usage:
//!   cargo run --bin check_movies -- [path]
//! Falls back to MOVIES_FILE, then data/movies.json (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use movies_api::validation::validate_movie;
use serde_json::Value;
use std::collections::HashSet;
use std::env;

fn main() -> Result<()> {
    dotenv().ok();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var("MOVIES_FILE").ok())
        .unwrap_or_else(|| "data/movies.json".to_string());

    let raw = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
    let records: Vec<Value> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array", path))?;

    let mut seen = HashSet::new();
    let mut bad = 0;
    for (idx, record) in records.iter().enumerate() {
        let id = record.get("id").and_then(|v| v.as_str());
        let title = record.get("title").and_then(|v| v.as_str()).unwrap_or("<untitled>");
        let problems = record_problems(record, &mut seen);
        if problems.is_empty() {
            continue;
        }
        bad += 1;
        println!("#{} {} ({})", idx, title, id.unwrap_or("<no id>"));
        for p in problems {
            println!("    {}", p);
        }
    }

    println!("{} records checked, {} with problems", records.len(), bad);
    if bad > 0 {
        anyhow::bail!("{} invalid records in {}", bad, path);
    }
    Ok(())
}

fn record_problems(record: &Value, seen: &mut HashSet<String>) -> Vec<String> {
    let mut problems = Vec::new();
    match record.get("id").and_then(|v| v.as_str()) {
        Some(id) if !seen.insert(id.to_string()) => {
            problems.push(format!("id: duplicate '{}'", id));
        }
        Some(_) => {}
        None => problems.push("id: missing or not a string".to_string()),
    }
    if let Err(errors) = validate_movie(record) {
        problems.extend(errors.0.iter().map(|e| format!("{}: {}", e.field, e.message)));
    }
    problems
}
