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

//! Single-transaction creation and deletion.

use crate::balance::BalanceLedger;
use crate::base::TransactionId;
use crate::category::CategoryResolver;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::Storage;
use crate::transaction::{
    Transaction, TransactionDraft, TransactionKind, TransactionRequest, ensure_positive,
};
use tracing::{info, warn};

/// Creates and deletes individual transactions.
///
/// This type performs no locking of its own. Two concurrent outcome creates
/// can both pass the balance check; callers that share storage across
/// threads go through [`Engine`](crate::Engine), which serializes writes.
pub struct TransactionStore<'a, S: ?Sized> {
    storage: &'a S,
}

impl<'a, S: Storage + ?Sized> TransactionStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Validates and persists a transaction.
    ///
    /// Checks run in a fixed order so the reported error is deterministic:
    /// type, value, balance, then category resolution. An outcome must be
    /// affordable; an income must fit in the income total. A rejected
    /// request leaves storage untouched.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidType`] - `type` is not `income` or `outcome`.
    /// - [`LedgerError::InvalidValue`] - `value` is zero or negative.
    /// - [`LedgerError::InsufficientBalance`] - outcome exceeds the balance.
    /// - [`LedgerError::BalanceOverflow`] - income would overflow the totals.
    /// - [`LedgerError::Storage`] - the backend failed.
    pub fn create(&self, request: TransactionRequest) -> LedgerResult<Transaction> {
        let kind = request.kind.parse::<TransactionKind>().inspect_err(|_| {
            warn!(kind = %request.kind, "rejected transaction with unknown type");
        })?;
        let value = ensure_positive(request.value).inspect_err(|_| {
            warn!(value = %request.value, "rejected transaction with non-positive value");
        })?;

        let ledger = BalanceLedger::new(self.storage);
        match kind {
            TransactionKind::Outcome if !ledger.can_afford(value)? => {
                warn!(%value, "rejected outcome exceeding balance");
                return Err(LedgerError::InsufficientBalance);
            }
            // An affordable outcome never exceeds income, so only income
            // can push a total out of range.
            TransactionKind::Outcome => {}
            TransactionKind::Income => ledger.ensure_room([(kind, value)]).inspect_err(|_| {
                warn!(%value, "rejected income overflowing balance");
            })?,
        }

        let category = CategoryResolver::new(self.storage).resolve(&request.category)?;
        let transaction = self.storage.insert_transaction(TransactionDraft {
            title: request.title,
            kind,
            value,
            category,
        })?;

        info!(
            id = %transaction.id,
            kind = %transaction.kind,
            value = %transaction.value,
            category = %transaction.category.title,
            "transaction created"
        );
        Ok(transaction)
    }

    /// Removes a transaction.
    ///
    /// The balance is derived on every read, so nothing is re-validated.
    pub fn delete(&self, id: TransactionId) -> LedgerResult<()> {
        if self.storage.find_transaction(id)?.is_none() {
            return Err(LedgerError::NotFound);
        }
        if !self.storage.delete_transaction(id)? {
            // Removed by someone else between the lookup and the delete.
            return Err(LedgerError::NotFound);
        }
        info!(%id, "transaction deleted");
        Ok(())
    }

    /// Retrieves a transaction by ID.
    pub fn get(&self, id: TransactionId) -> LedgerResult<Transaction> {
        self.storage.find_transaction(id)?.ok_or(LedgerError::NotFound)
    }

    /// Lists all transactions in creation order.
    pub fn list(&self) -> LedgerResult<Vec<Transaction>> {
        self.storage.transactions()
    }
}
