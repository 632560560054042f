// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::Writer;
use ledger_core::{
    Balance, Engine, FileSource, ImportOptions, ImportReport, LedgerResult, ReaderSource,
    Transaction,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ledger Core - Import household transaction CSV files
///
/// Imports transactions from a CSV file into a fresh ledger and writes the
/// imported transactions (or the resulting balance) to stdout.
#[derive(Parser, Debug)]
#[command(name = "ledger-core")]
#[command(about = "Imports income/outcome CSVs into a balance-checked ledger", long_about = None)]
struct Args {
    /// Path to CSV file with transactions
    ///
    /// Expected format: title,type,value,category
    /// Example: cargo run -- transactions.csv > imported.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Delete the input file once it has been imported
    #[arg(long)]
    consume: bool,

    /// Print the balance instead of the imported transactions
    #[arg(long)]
    balance: bool,
}

fn main() {
    init_logging();

    // Parse command line arguments
    let args = Args::parse();

    if !args.delimiter.is_ascii() {
        eprintln!("Error: delimiter must be a single ASCII character");
        process::exit(1);
    }
    let options = ImportOptions {
        delimiter: args.delimiter as u8,
    };

    let engine = Engine::new().with_import_options(options);

    let report = match import(&engine, &args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error importing '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };
    info!(
        imported = report.transactions.len(),
        dropped = report.dropped_rows,
        input = %args.input.display(),
        "finished"
    );

    // Write results to stdout
    let written = if args.balance {
        engine
            .balance()
            .map_err(|e| e.to_string())
            .and_then(|balance| write_balance(&balance, std::io::stdout()).map_err(|e| e.to_string()))
    } else {
        write_transactions(&report.transactions, std::io::stdout()).map_err(|e| e.to_string())
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays valid CSV. Defaults to `info` for this
/// crate unless `RUST_LOG` says otherwise.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledger_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn import(engine: &Engine, args: &Args) -> LedgerResult<ImportReport> {
    if args.consume {
        return engine.import_transactions(FileSource::new(&args.input));
    }

    let file = File::open(&args.input)
        .map_err(|e| ledger_core::LedgerError::SourceReadFailure(e.to_string()))?;
    engine.import_transactions(ReaderSource::new(BufReader::new(file)))
}

/// Flat CSV row for a transaction.
#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    id: u32,
    title: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
    category: &'a str,
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(transaction: &'a Transaction) -> Self {
        Self {
            id: transaction.id.0,
            title: &transaction.title,
            kind: transaction.kind.as_str(),
            value: transaction.value.to_string(),
            category: &transaction.category.title,
        }
    }
}

/// Write transactions to a CSV writer
///
/// # CSV Format
///
/// Columns: `id, title, type, value, category`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_transactions<W: Write>(transactions: &[Transaction], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for transaction in transactions {
        wtr.serialize(TransactionRow::from(transaction))?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

/// Write the balance as a single CSV row with 4 decimal precision.
///
/// Columns: `income, outcome, total`
fn write_balance<W: Write>(balance: &Balance, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    wtr.serialize(balance)?;
    wtr.flush()?;
    Ok(())
}
