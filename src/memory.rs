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

//! Thread-safe in-memory storage.
//!
//! Categories live in a [`DashMap`] keyed by title so that find-or-create is
//! a single entry-API call. Transactions live in an ordered map behind a
//! [`RwLock`], which makes batch inserts all-or-nothing and keeps iteration
//! in creation order.

use crate::balance::Balance;
use crate::base::{CategoryId, TransactionId};
use crate::error::{LedgerError, LedgerResult};
use crate::storage::Storage;
use crate::transaction::{Category, Transaction, TransactionDraft};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Volatile [`Storage`] backend.
///
/// IDs start at 1 and increase monotonically; deleted IDs are never reused.
/// Once a counter would pass `u32::MAX`, inserts fail with
/// [`LedgerError::Storage`] instead of wrapping.
#[derive(Debug)]
pub struct MemoryStorage {
    /// Categories indexed by title. The title key enforces uniqueness.
    categories: DashMap<String, Category>,
    next_category_id: AtomicU32,

    /// Transactions indexed by ID. IDs grow with each insert, so the map
    /// iterates in creation order.
    transactions: RwLock<BTreeMap<TransactionId, Transaction>>,
    next_transaction_id: AtomicU32,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            categories: DashMap::new(),
            next_category_id: AtomicU32::new(1),
            transactions: RwLock::new(BTreeMap::new()),
            next_transaction_id: AtomicU32::new(1),
        }
    }

    /// Foreign-key check: the draft must reference a stored category.
    fn check_category(&self, category: &Category) -> LedgerResult<()> {
        match self.categories.get(&category.title) {
            Some(stored) if stored.id == category.id => Ok(()),
            _ => Err(LedgerError::Storage(format!(
                "unknown category {} ({:?})",
                category.id, category.title
            ))),
        }
    }

    /// Reserves `count` consecutive IDs and returns the first one.
    ///
    /// Either the whole range is reserved or the counter is left as it was.
    fn reserve_ids(counter: &AtomicU32, count: usize) -> LedgerResult<u32> {
        let count = u32::try_from(count).map_err(|_| id_space_exhausted())?;
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                next.checked_add(count)
            })
            .map_err(|_| id_space_exhausted())
    }

    fn materialize(id: TransactionId, draft: TransactionDraft) -> Transaction {
        Transaction {
            id,
            title: draft.title,
            kind: draft.kind,
            value: draft.value,
            category: draft.category,
        }
    }
}

fn id_space_exhausted() -> LedgerError {
    LedgerError::Storage("identifier space exhausted".into())
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn find_category(&self, title: &str) -> LedgerResult<Option<Category>> {
        Ok(self.categories.get(title).map(|entry| entry.value().clone()))
    }

    fn find_categories(&self, titles: &[String]) -> LedgerResult<Vec<Category>> {
        Ok(titles
            .iter()
            .filter_map(|title| self.categories.get(title))
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn insert_category(&self, title: &str) -> LedgerResult<Category> {
        // Entry API holds the shard lock across check-and-insert.
        match self.categories.entry(title.to_owned()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let id = Self::reserve_ids(&self.next_category_id, 1)?;
                let category = Category {
                    id: CategoryId(id),
                    title: title.to_owned(),
                };
                entry.insert(category.clone());
                Ok(category)
            }
        }
    }

    fn insert_categories(&self, titles: &[String]) -> LedgerResult<Vec<Category>> {
        titles
            .iter()
            .map(|title| self.insert_category(title))
            .collect()
    }

    fn categories(&self) -> LedgerResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        categories.sort_by_key(|category| category.id);
        Ok(categories)
    }

    fn insert_transaction(&self, draft: TransactionDraft) -> LedgerResult<Transaction> {
        self.check_category(&draft.category)?;
        let mut table = self.transactions.write();
        let id = Self::reserve_ids(&self.next_transaction_id, 1)?;
        let transaction = Self::materialize(TransactionId(id), draft);
        table.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    fn insert_transactions(&self, drafts: Vec<TransactionDraft>) -> LedgerResult<Vec<Transaction>> {
        // Validate everything before the first write so a bad draft leaves
        // the table untouched.
        for draft in &drafts {
            self.check_category(&draft.category)?;
        }

        let mut table = self.transactions.write();
        let first = Self::reserve_ids(&self.next_transaction_id, drafts.len())?;
        let stored: Vec<Transaction> = drafts
            .into_iter()
            .zip(first..)
            .map(|(draft, id)| Self::materialize(TransactionId(id), draft))
            .collect();
        for transaction in &stored {
            table.insert(transaction.id, transaction.clone());
        }
        Ok(stored)
    }

    fn find_transaction(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        Ok(self.transactions.read().get(&id).cloned())
    }

    fn delete_transaction(&self, id: TransactionId) -> LedgerResult<bool> {
        Ok(self.transactions.write().remove(&id).is_some())
    }

    fn transactions(&self) -> LedgerResult<Vec<Transaction>> {
        Ok(self.transactions.read().values().cloned().collect())
    }

    fn totals(&self) -> LedgerResult<Balance> {
        let table = self.transactions.read();
        table
            .values()
            .try_fold(Balance::default(), |mut balance, transaction| {
                balance.record(transaction.kind, transaction.value)?;
                Ok(balance)
            })
    }
}
