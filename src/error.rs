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

//! Error types for ledger operations.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transaction type is neither `income` nor `outcome`
    #[error("invalid transaction type (expected income or outcome)")]
    InvalidType,

    /// Value is missing, unparsable, zero or negative
    #[error("invalid transaction value (must be positive)")]
    InvalidValue,

    /// Outcome would exceed the current balance
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Adding the value would push a ledger total out of `Decimal` range
    #[error("balance overflow")]
    BalanceOverflow,

    /// Referenced transaction ID does not exist
    #[error("transaction not found")]
    NotFound,

    /// The import source could not be read
    #[error("failed to read import source: {0}")]
    SourceReadFailure(String),

    /// The import was persisted but its source could not be removed
    #[error("failed to dispose of import source: {0}")]
    SourceCleanup(String),

    /// Failure reported by the persistence layer
    #[error("storage error: {0}")]
    Storage(String),
}
