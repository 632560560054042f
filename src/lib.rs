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

//! # Ledger Core
//!
//! This library keeps a household ledger of income and outcome entries, each
//! tagged with a category, and guarantees that creating an outcome never
//! overdraws the balance.
//!
//! ## Core Components
//!
//! - [`Engine`]: Service surface serializing writes over a storage backend
//! - [`BalanceLedger`]: Derived income/outcome totals and affordability checks
//! - [`CategoryResolver`]: Find-or-create of categories by exact title
//! - [`TransactionStore`]: Validated create and delete of single transactions
//! - [`ImportPipeline`]: Atomic bulk import from delimited files
//! - [`Storage`]: Persistence boundary, with [`MemoryStorage`] built in
//! - [`LedgerError`]: Error types for ledger failures
//!
//! ## Example
//!
//! ```
//! use ledger_core::{Engine, LedgerError, TransactionRequest};
//! use rust_decimal::Decimal;
//!
//! let engine = Engine::new();
//!
//! engine
//!     .create_transaction(TransactionRequest::new("Salary", "income", Decimal::new(500, 0), "Work"))
//!     .unwrap();
//! engine
//!     .create_transaction(TransactionRequest::new("Rent", "outcome", Decimal::new(500, 0), "Home"))
//!     .unwrap();
//!
//! // The balance is now zero, so any further outcome is rejected.
//! let result = engine.create_transaction(TransactionRequest::new("Coffee", "outcome", Decimal::new(1, 0), "Food"));
//! assert_eq!(result, Err(LedgerError::InsufficientBalance));
//! ```

mod balance;
mod base;
mod category;
mod engine;
pub mod error;
pub mod import;
mod ledger;
mod memory;
mod storage;
mod transaction;

pub use balance::{Balance, BalanceLedger};
pub use base::{CategoryId, TransactionId};
pub use category::CategoryResolver;
pub use engine::Engine;
pub use error::{LedgerError, LedgerResult};
pub use import::{FileSource, ImportOptions, ImportPipeline, ImportReport, ImportSource, ImportStage, ReaderSource};
pub use ledger::TransactionStore;
pub use memory::MemoryStorage;
pub use storage::Storage;
pub use transaction::{Category, Transaction, TransactionDraft, TransactionKind, TransactionRequest};
