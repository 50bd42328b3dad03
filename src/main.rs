// Customer Base - CLI bulk import
// Loads a fixed-width purchase-history file into the SQLite base

use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

use customer_base::{CustomerService, SqliteRepository};

const DEFAULT_DB_PATH: &str = "customers.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let file = args
                .get(2)
                .context("usage: customer-base import <file.txt> [db-path]")?;
            let db_path = args.get(3).map(String::as_str).unwrap_or(DEFAULT_DB_PATH);
            run_import(file, db_path)
        }
        _ => {
            eprintln!("usage: customer-base import <file.txt> [db-path]");
            std::process::exit(2);
        }
    }
}

fn run_import(file_path: &str, db_path: &str) -> Result<()> {
    println!("Customer Base - bulk import");

    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read input file: {file_path}"))?;

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database: {db_path}"))?;
    let repo = SqliteRepository::new(conn)?;
    println!("✓ Database ready: {db_path}");

    let service = CustomerService::new(Arc::new(repo));

    match service.create_bulk(&contents) {
        Ok(inserted) => {
            println!("✓ Inserted: {inserted} customers");
            Ok(())
        }
        Err(err) => bail!("import failed: {err}"),
    }
}
