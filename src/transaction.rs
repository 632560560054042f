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

//! Transaction and category records.

use crate::base::{CategoryId, TransactionId};
use crate::error::{LedgerError, LedgerResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a transaction relative to the balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Outcome,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Outcome => "outcome",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    /// Parses the exact lowercase spellings `income` and `outcome`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "outcome" => Ok(Self::Outcome),
            _ => Err(LedgerError::InvalidType),
        }
    }
}

/// A user-defined label grouping transactions. Titles are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
}

/// A persisted ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub value: Decimal,
    pub category: Category,
}

impl Transaction {
    /// Value with the sign it contributes to the balance.
    pub fn signed_value(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.value,
            TransactionKind::Outcome => -self.value,
        }
    }
}

/// A validated transaction that storage has not assigned an ID to yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub title: String,
    pub kind: TransactionKind,
    pub value: Decimal,
    pub category: Category,
}

/// Caller-facing request to create a single transaction.
///
/// `kind` is free text so that unknown types are reported as
/// [`LedgerError::InvalidType`] rather than rejected by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Decimal,
    pub category: String,
}

impl TransactionRequest {
    pub fn new(
        title: impl Into<String>,
        kind: impl Into<String>,
        value: Decimal,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            kind: kind.into(),
            value,
            category: category.into(),
        }
    }
}

/// Rejects zero and negative values.
pub(crate) fn ensure_positive(value: Decimal) -> LedgerResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::InvalidValue);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kind_parses_exact_spellings() {
        assert_eq!("income".parse::<TransactionKind>(), Ok(TransactionKind::Income));
        assert_eq!("outcome".parse::<TransactionKind>(), Ok(TransactionKind::Outcome));
    }

    #[test]
    fn kind_rejects_other_spellings() {
        for raw in ["Income", "OUTCOME", "expense", "", " income"] {
            assert_eq!(
                raw.parse::<TransactionKind>(),
                Err(LedgerError::InvalidType),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn kind_display_matches_wire_format() {
        assert_eq!(TransactionKind::Income.to_string(), "income");
        assert_eq!(
            serde_json::to_string(&TransactionKind::Outcome).unwrap(),
            "\"outcome\""
        );
    }

    #[test]
    fn signed_value_negates_outcome() {
        let category = Category {
            id: CategoryId(1),
            title: "Food".into(),
        };
        let outcome = Transaction {
            id: TransactionId(1),
            title: "Groceries".into(),
            kind: TransactionKind::Outcome,
            value: dec!(42.50),
            category,
        };
        assert_eq!(outcome.signed_value(), dec!(-42.50));
    }

    #[test]
    fn ensure_positive_boundaries() {
        assert_eq!(ensure_positive(dec!(0.0001)), Ok(dec!(0.0001)));
        assert_eq!(ensure_positive(Decimal::ZERO), Err(LedgerError::InvalidValue));
        assert_eq!(ensure_positive(dec!(-5)), Err(LedgerError::InvalidValue));
    }

    #[test]
    fn request_deserializes_from_json() {
        let request: TransactionRequest = serde_json::from_str(
            r#"{"title": "Salary", "type": "income", "value": "1500.00", "category": "Work"}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            TransactionRequest::new("Salary", "income", dec!(1500.00), "Work")
        );
    }
}
