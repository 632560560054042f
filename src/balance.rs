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

//! Balance computation.
//!
//! The balance is never stored. Every read aggregates the persisted
//! transactions, so deleting or importing transactions needs no repair step.
//!
//! # Example
//!
//! ```
//! use ledger_core::{BalanceLedger, MemoryStorage};
//! use rust_decimal::Decimal;
//!
//! let storage = MemoryStorage::new();
//! let ledger = BalanceLedger::new(&storage);
//! assert_eq!(ledger.balance().unwrap().total(), Decimal::ZERO);
//! ```

use crate::error::{LedgerError, LedgerResult};
use crate::storage::Storage;
use crate::transaction::TransactionKind;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

/// Income and outcome totals over the whole ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub income: Decimal,
    pub outcome: Decimal,
}

impl Balance {
    const DECIMAL_PRECISION: u32 = 4;

    pub fn new(income: Decimal, outcome: Decimal) -> Self {
        Self { income, outcome }
    }

    /// Returns `income - outcome`.
    pub fn total(&self) -> Decimal {
        self.income - self.outcome
    }

    /// Adds `value` to the total for `kind`.
    ///
    /// Both totals are non-negative and bounded by `Decimal::MAX`, so once
    /// the addition succeeds `total()` cannot overflow either.
    pub fn record(&mut self, kind: TransactionKind, value: Decimal) -> LedgerResult<()> {
        let slot = match kind {
            TransactionKind::Income => &mut self.income,
            TransactionKind::Outcome => &mut self.outcome,
        };
        *slot = slot.checked_add(value).ok_or(LedgerError::BalanceOverflow)?;
        Ok(())
    }
}

impl Serialize for Balance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Balance", 3)?;
        state.serialize_field("income", &self.income.round_dp(Self::DECIMAL_PRECISION))?;
        state.serialize_field("outcome", &self.outcome.round_dp(Self::DECIMAL_PRECISION))?;
        state.serialize_field("total", &self.total().round_dp(Self::DECIMAL_PRECISION))?;
        state.end()
    }
}

/// Read-only view answering balance questions against a [`Storage`].
pub struct BalanceLedger<'a, S: ?Sized> {
    storage: &'a S,
}

impl<'a, S: Storage + ?Sized> BalanceLedger<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Aggregates all persisted transactions.
    pub fn balance(&self) -> LedgerResult<Balance> {
        self.storage.totals()
    }

    /// Whether an outcome of `amount` keeps the balance at or above zero.
    pub fn can_afford(&self, amount: Decimal) -> LedgerResult<bool> {
        let total = self.balance()?.total();
        debug!(%total, %amount, "affordability check");
        Ok(total >= amount)
    }

    /// Fails with [`LedgerError::BalanceOverflow`] if recording every entry
    /// on top of the current totals would leave `Decimal` range.
    pub fn ensure_room<I>(&self, entries: I) -> LedgerResult<()>
    where
        I: IntoIterator<Item = (TransactionKind, Decimal)>,
    {
        let mut balance = self.balance()?;
        for (kind, value) in entries {
            balance.record(kind, value)?;
        }
        Ok(())
    }
}
