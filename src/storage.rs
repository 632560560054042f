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

//! Persistence boundary.
//!
//! The ledger core never touches a database directly. Everything it needs
//! from persistence is expressed by the [`Storage`] trait, so the same
//! policy code runs against [`MemoryStorage`](crate::MemoryStorage) in tests
//! and against a real backend in production.

use crate::balance::Balance;
use crate::base::TransactionId;
use crate::error::LedgerResult;
use crate::transaction::{Category, Transaction, TransactionDraft};

/// Operations the ledger core requires from a persistence backend.
///
/// Implementations must be safe to share across threads. Failures are
/// reported as [`LedgerError::Storage`](crate::LedgerError::Storage) and are
/// passed to callers unchanged.
pub trait Storage: Send + Sync {
    /// Looks up a category by its exact title.
    fn find_category(&self, title: &str) -> LedgerResult<Option<Category>>;

    /// Looks up every category whose title is in `titles`.
    ///
    /// Titles with no stored category are simply absent from the result.
    fn find_categories(&self, titles: &[String]) -> LedgerResult<Vec<Category>>;

    /// Inserts a category unless one with the same title exists, returning
    /// the stored record either way.
    ///
    /// Must be atomic: concurrent calls for one title yield one category.
    fn insert_category(&self, title: &str) -> LedgerResult<Category>;

    /// Batch form of [`Storage::insert_category`].
    fn insert_categories(&self, titles: &[String]) -> LedgerResult<Vec<Category>>;

    /// Lists all categories.
    fn categories(&self) -> LedgerResult<Vec<Category>>;

    /// Persists a single transaction and assigns its ID.
    fn insert_transaction(&self, draft: TransactionDraft) -> LedgerResult<Transaction>;

    /// Persists a batch of transactions, all or nothing.
    ///
    /// The returned transactions are in the same order as `drafts`.
    fn insert_transactions(&self, drafts: Vec<TransactionDraft>) -> LedgerResult<Vec<Transaction>>;

    /// Retrieves a transaction by ID.
    fn find_transaction(&self, id: TransactionId) -> LedgerResult<Option<Transaction>>;

    /// Removes a transaction. Returns `false` if it did not exist.
    fn delete_transaction(&self, id: TransactionId) -> LedgerResult<bool>;

    /// Lists all transactions in creation order.
    fn transactions(&self) -> LedgerResult<Vec<Transaction>>;

    /// Sums transaction values grouped by kind.
    fn totals(&self) -> LedgerResult<Balance>;
}
