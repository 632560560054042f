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

//! Ledger service surface.
//!
//! The [`Engine`] is what callers (an HTTP layer, the CLI, tests) talk to.
//! It owns the [`Storage`] backend and runs the policy components against
//! it:
//!
//! - **Create**: type, value and balance checks, then find-or-create of the
//!   category, then persist.
//! - **Delete**: remove by ID, `NotFound` if absent.
//! - **Import**: stream a source into one atomic batch, then dispose of it.
//!
//! # Thread Safety
//!
//! Balance-affecting writes (create, delete, import) are serialized through
//! a single write gate, so the affordability check and the insert that
//! follows it cannot interleave with another writer. Reads go straight to
//! storage.

use crate::balance::{Balance, BalanceLedger};
use crate::base::TransactionId;
use crate::error::LedgerResult;
use crate::import::{ImportOptions, ImportPipeline, ImportReport, ImportSource};
use crate::ledger::TransactionStore;
use crate::memory::MemoryStorage;
use crate::storage::Storage;
use crate::transaction::{Category, Transaction, TransactionRequest};
use parking_lot::Mutex;

/// Ledger engine over a storage backend.
///
/// # Invariants
///
/// - Creating an outcome never drives the balance below zero.
/// - No two categories share a title.
/// - An import stores all of its rows or none of them.
pub struct Engine<S = MemoryStorage> {
    storage: S,
    /// Held for the duration of every write.
    write_gate: Mutex<()>,
    import_options: ImportOptions,
}

impl Engine<MemoryStorage> {
    /// Creates an engine backed by empty in-memory storage.
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }
}

impl<S: Storage> Engine<S> {
    pub fn with_storage(storage: S) -> Self {
        Engine {
            storage,
            write_gate: Mutex::new(()),
            import_options: ImportOptions::default(),
        }
    }

    /// Sets the options used by [`Engine::import_transactions`].
    pub fn with_import_options(mut self, options: ImportOptions) -> Self {
        self.import_options = options;
        self
    }

    /// Creates a single transaction.
    ///
    /// See [`TransactionStore::create`] for the validation order and errors.
    pub fn create_transaction(&self, request: TransactionRequest) -> LedgerResult<Transaction> {
        let _gate = self.write_gate.lock();
        TransactionStore::new(&self.storage).create(request)
    }

    /// Deletes a transaction, failing with `NotFound` if it does not exist.
    pub fn delete_transaction(&self, id: TransactionId) -> LedgerResult<()> {
        let _gate = self.write_gate.lock();
        TransactionStore::new(&self.storage).delete(id)
    }

    /// Imports every row of `source` as one batch.
    ///
    /// See [`ImportPipeline::run`] for the failure modes.
    pub fn import_transactions<I: ImportSource>(&self, source: I) -> LedgerResult<ImportReport> {
        let _gate = self.write_gate.lock();
        ImportPipeline::with_options(&self.storage, self.import_options).run(source)
    }

    /// Current income, outcome and net totals.
    pub fn balance(&self) -> LedgerResult<Balance> {
        BalanceLedger::new(&self.storage).balance()
    }

    /// Retrieves a transaction by ID.
    pub fn transaction(&self, id: TransactionId) -> LedgerResult<Transaction> {
        TransactionStore::new(&self.storage).get(id)
    }

    /// All transactions in creation order.
    pub fn transactions(&self) -> LedgerResult<Vec<Transaction>> {
        TransactionStore::new(&self.storage).list()
    }

    /// All categories.
    pub fn categories(&self) -> LedgerResult<Vec<Category>> {
        self.storage.categories()
    }

    /// The underlying storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl Default for Engine<MemoryStorage> {
    fn default() -> Self {
        Self::new()
    }
}
