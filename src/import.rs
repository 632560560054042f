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

//! Bulk import of delimited transaction files.
//!
//! The pipeline moves through fixed stages:
//!
//! ```text
//! Idle ──► Reading ──► Resolving ──► Persisting ──► Done
//!             │            │             │
//!             └────────────┴─────────────┴──► Failed
//! ```
//!
//! Rows are pulled from the source until the reader reports end of input.
//! Only then are categories resolved (one batch) and transactions persisted
//! (one all-or-nothing batch). The source is disposed of after the batch is
//! stored; on any earlier failure it is left in place for a retry.
//!
//! # Format
//!
//! ```csv
//! title,type,value,category
//! Salary,income,1500.00,Work
//! Groceries,outcome,82.40,Food
//! ```
//!
//! Cells are trimmed. Rows missing a title, type or value are dropped and
//! counted in [`ImportReport::dropped_rows`]. A missing category cell is the
//! empty title. Imported outcomes are not checked against the balance.

use crate::balance::BalanceLedger;
use crate::category::CategoryResolver;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::Storage;
use crate::transaction::{Category, Transaction, TransactionDraft, TransactionKind, ensure_positive};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Something rows can be read from and later disposed of.
pub trait ImportSource {
    type Reader: Read;

    /// Opens the source for reading.
    fn open(&mut self) -> io::Result<Self::Reader>;

    /// Releases the source after a successful import.
    fn dispose(self) -> io::Result<()>;
}

/// A file on disk. Disposing deletes it.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImportSource for FileSource {
    type Reader = BufReader<File>;

    fn open(&mut self) -> io::Result<Self::Reader> {
        File::open(&self.path).map(BufReader::new)
    }

    fn dispose(self) -> io::Result<()> {
        fs::remove_file(&self.path)?;
        debug!(path = %self.path.display(), "import source removed");
        Ok(())
    }
}

/// Any reader, e.g. an upload body or an in-memory buffer. Disposing is a
/// no-op.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: Option<R>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

impl<R: Read> ImportSource for ReaderSource<R> {
    type Reader = R;

    fn open(&mut self) -> io::Result<Self::Reader> {
        self.reader
            .take()
            .ok_or_else(|| io::Error::other("reader source already consumed"))
    }

    fn dispose(self) -> io::Result<()> {
        Ok(())
    }
}

/// Import settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Where an import currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Idle,
    Reading,
    Resolving,
    Persisting,
    Done,
    Failed,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Persisted transactions in input row order.
    pub transactions: Vec<Transaction>,
    /// Rows discarded as incomplete or undecodable.
    pub dropped_rows: usize,
}

/// A parsed row waiting for its category.
#[derive(Debug)]
struct CandidateRow {
    title: String,
    kind: TransactionKind,
    value: Decimal,
    category: String,
}

impl CandidateRow {
    /// Returns `Ok(None)` for incomplete rows.
    fn parse(record: &StringRecord) -> LedgerResult<Option<Self>> {
        let cell = |index: usize| record.get(index).unwrap_or("");
        let (title, kind, value, category) = (cell(0), cell(1), cell(2), cell(3));

        if title.is_empty() || kind.is_empty() || value.is_empty() {
            return Ok(None);
        }

        let kind = TransactionKind::from_str(kind)?;
        let value = Decimal::from_str(value).map_err(|_| LedgerError::InvalidValue)?;
        let value = ensure_positive(value)?;

        Ok(Some(Self {
            title: title.to_owned(),
            kind,
            value,
            category: category.to_owned(),
        }))
    }

    fn into_draft(self, categories: &HashMap<String, Category>) -> LedgerResult<TransactionDraft> {
        let category = categories.get(&self.category).cloned().ok_or_else(|| {
            LedgerError::Storage(format!("category {:?} was not resolved", self.category))
        })?;
        Ok(TransactionDraft {
            title: self.title,
            kind: self.kind,
            value: self.value,
            category,
        })
    }
}

/// Streams a source into transactions and categories as one batch.
pub struct ImportPipeline<'a, S: ?Sized> {
    storage: &'a S,
    options: ImportOptions,
    stage: ImportStage,
}

impl<'a, S: Storage + ?Sized> ImportPipeline<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self::with_options(storage, ImportOptions::default())
    }

    pub fn with_options(storage: &'a S, options: ImportOptions) -> Self {
        Self {
            storage,
            options,
            stage: ImportStage::Idle,
        }
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    /// Imports every row of `source`, then disposes of it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SourceReadFailure`] - the source could not be opened or read.
    /// - [`LedgerError::InvalidType`] / [`LedgerError::InvalidValue`] - a complete
    ///   row carries an unknown type or a bad value.
    /// - [`LedgerError::BalanceOverflow`] - the rows would push a ledger total
    ///   out of range.
    /// - [`LedgerError::Storage`] - resolving categories or persisting failed.
    /// - [`LedgerError::SourceCleanup`] - the batch was stored but the source
    ///   could not be disposed of.
    ///
    /// Every error except `SourceCleanup` leaves storage and the source as
    /// they were (categories created while resolving are kept).
    pub fn run<I: ImportSource>(&mut self, mut source: I) -> LedgerResult<ImportReport> {
        let report = match self.execute(&mut source) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, stage = ?self.stage, "import aborted, source retained");
                self.transition(ImportStage::Failed);
                return Err(e);
            }
        };

        if let Err(e) = source.dispose() {
            warn!(error = %e, "import stored but source could not be disposed of");
            self.transition(ImportStage::Failed);
            return Err(LedgerError::SourceCleanup(e.to_string()));
        }

        self.transition(ImportStage::Done);
        info!(
            imported = report.transactions.len(),
            dropped = report.dropped_rows,
            "import complete"
        );
        Ok(report)
    }

    fn execute<I: ImportSource>(&mut self, source: &mut I) -> LedgerResult<ImportReport> {
        self.transition(ImportStage::Reading);
        let reader = source
            .open()
            .map_err(|e| LedgerError::SourceReadFailure(e.to_string()))?;
        let (rows, dropped_rows) = self.read_rows(reader)?;
        BalanceLedger::new(self.storage)
            .ensure_room(rows.iter().map(|row| (row.kind, row.value)))
            .inspect_err(|_| warn!(rows = rows.len(), "batch would overflow balance"))?;

        self.transition(ImportStage::Resolving);
        let titles: Vec<&str> = rows.iter().map(|row| row.category.as_str()).collect();
        let categories = CategoryResolver::new(self.storage).resolve_many(&titles)?;

        self.transition(ImportStage::Persisting);
        let drafts = rows
            .into_iter()
            .map(|row| row.into_draft(&categories))
            .collect::<LedgerResult<Vec<_>>>()?;
        let transactions = self.storage.insert_transactions(drafts)?;

        Ok(ImportReport {
            transactions,
            dropped_rows,
        })
    }

    /// Reads the whole source, returning kept rows and the drop count.
    fn read_rows<R: Read>(&self, reader: R) -> LedgerResult<(Vec<CandidateRow>, usize)> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .trim(Trim::All)
            .flexible(true) // Allow short rows; missing cells read as empty
            .has_headers(true) // Skip first row as header
            .from_reader(reader);

        let mut rows = Vec::new();
        let mut dropped = 0;

        for result in rdr.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    return Err(LedgerError::SourceReadFailure(e.to_string()));
                }
                Err(e) => {
                    warn!(error = %e, "dropping undecodable row");
                    dropped += 1;
                    continue;
                }
            };

            let line = record.position().map_or(0, |position| position.line());
            match CandidateRow::parse(&record) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {
                    warn!(line, "dropping incomplete row");
                    dropped += 1;
                }
                Err(e) => {
                    warn!(line, error = %e, "invalid row");
                    return Err(e);
                }
            }
        }

        debug!(rows = rows.len(), dropped, "source exhausted");
        Ok((rows, dropped))
    }

    fn transition(&mut self, next: ImportStage) {
        debug!(from = ?self.stage, to = ?next, "import stage");
        self.stage = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn source(csv: &str) -> ReaderSource<Cursor<Vec<u8>>> {
        ReaderSource::new(Cursor::new(csv.as_bytes().to_vec()))
    }

    /// Fails after handing out `prefix` bytes.
    struct BrokenReader {
        prefix: Cursor<Vec<u8>>,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.prefix.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "upload interrupted")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn undecodable_row_is_dropped_between_valid_rows() {
        let storage = MemoryStorage::new();
        let mut pipeline = ImportPipeline::new(&storage);
        let bytes = b"title,type,value,category\nA,income,1,X\nCaf\xff,income,2,Y\nB,income,3,X\n";

        let report = pipeline
            .run(ReaderSource::new(Cursor::new(bytes.to_vec())))
            .unwrap();

        let titles: Vec<_> = report.transactions.iter().map(|tx| tx.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(storage.find_category("Y").unwrap(), None);
    }

    #[test]
    fn overflowing_batch_aborts_before_resolving() {
        let storage = MemoryStorage::new();
        let mut pipeline = ImportPipeline::new(&storage);
        let csv = format!(
            "title,type,value,category\nA,income,{max},X\nB,income,{max},X\n",
            max = Decimal::MAX
        );

        let result = pipeline.run(source(&csv));

        assert_eq!(result, Err(LedgerError::BalanceOverflow));
        assert_eq!(pipeline.stage(), ImportStage::Failed);
        assert!(storage.categories().unwrap().is_empty());
        assert_eq!(storage.totals().unwrap().total(), Decimal::ZERO);
    }

    #[test]
    fn parse_simple_import() {
        let storage = MemoryStorage::new();
        let mut pipeline = ImportPipeline::new(&storage);

        let report = pipeline
            .run(source("title,type,value,category\nSalary,income,1500.00,Work\n"))
            .unwrap();

        assert_eq!(pipeline.stage(), ImportStage::Done);
        assert_eq!(report.dropped_rows, 0);
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].value, dec!(1500.00));
        assert_eq!(report.transactions[0].category.title, "Work");
    }

    #[test]
    fn parse_with_whitespace() {
        let storage = MemoryStorage::new();
        let report = ImportPipeline::new(&storage)
            .run(source("title,type,value,category\n  Rent , income ,  10.5 ,  Home \n"))
            .unwrap();

        let tx = &report.transactions[0];
        assert_eq!(tx.title, "Rent");
        assert_eq!(tx.kind, TransactionKind::Income);
        assert_eq!(tx.value, dec!(10.5));
        assert_eq!(tx.category.title, "Home");
    }

    #[test]
    fn missing_category_cell_is_empty_title() {
        let storage = MemoryStorage::new();
        let report = ImportPipeline::new(&storage)
            .run(source("title,type,value,category\nTip,income,5\n"))
            .unwrap();

        assert_eq!(report.transactions[0].category.title, "");
    }

    #[test]
    fn incomplete_rows_are_counted() {
        let storage = MemoryStorage::new();
        let csv = "title,type,value,category\n\
                   Salary,income,100,Work\n\
                   ,income,5,Work\n\
                   Coffee,outcome,,Food\n\
                   Lunch,,12,Food\n";

        let report = ImportPipeline::new(&storage).run(source(csv)).unwrap();

        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.dropped_rows, 3);
        // Dropped rows contribute no categories.
        assert_eq!(storage.categories().unwrap().len(), 1);
    }

    #[test]
    fn header_only_source_imports_nothing() {
        let storage = MemoryStorage::new();
        let report = ImportPipeline::new(&storage)
            .run(source("title,type,value,category\n"))
            .unwrap();
        assert!(report.transactions.is_empty());
        assert_eq!(report.dropped_rows, 0);
    }

    #[test]
    fn custom_delimiter() {
        let storage = MemoryStorage::new();
        let options = ImportOptions { delimiter: b';' };
        let report = ImportPipeline::with_options(&storage, options)
            .run(source("title;type;value;category\nBonus, yearly;income;1.5;Work\n"))
            .unwrap();

        let tx = &report.transactions[0];
        assert_eq!(tx.title, "Bonus, yearly");
        assert_eq!(tx.value, dec!(1.5));
    }

    #[test]
    fn unknown_type_aborts_import() {
        let storage = MemoryStorage::new();
        let mut pipeline = ImportPipeline::new(&storage);
        let csv = "title,type,value,category\n\
                   Salary,income,100,Work\n\
                   Move,transfer,5,Bank\n";

        assert_eq!(pipeline.run(source(csv)), Err(LedgerError::InvalidType));
        assert_eq!(pipeline.stage(), ImportStage::Failed);
        assert!(storage.transactions().unwrap().is_empty());
        assert!(storage.categories().unwrap().is_empty());
    }

    #[test]
    fn non_positive_value_aborts_import() {
        let storage = MemoryStorage::new();
        let csv = "title,type,value,category\nRefund,income,-3,Misc\n";
        assert_eq!(
            ImportPipeline::new(&storage).run(source(csv)),
            Err(LedgerError::InvalidValue)
        );
    }

    #[test]
    fn read_failure_aborts_before_resolving() {
        let storage = MemoryStorage::new();
        let mut pipeline = ImportPipeline::new(&storage);
        let reader = BrokenReader {
            prefix: Cursor::new(b"title,type,value,category\nSalary,income,100,Work\n".to_vec()),
        };

        let result = pipeline.run(ReaderSource::new(reader));

        assert!(matches!(result, Err(LedgerError::SourceReadFailure(_))));
        assert_eq!(pipeline.stage(), ImportStage::Failed);
        assert!(storage.categories().unwrap().is_empty());
    }

    #[test]
    fn reader_source_opens_once() {
        let mut source = source("title,type,value,category\n");
        assert!(source.open().is_ok());
        assert!(source.open().is_err());
    }
}
