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

//! Property-based tests for the ledger engine.
//!
//! These tests verify invariants that should hold for any sequence of
//! create requests.

use ledger_core::{Engine, LedgerError, ReaderSource, TransactionKind, TransactionRequest};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::io::Cursor;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive amount (0.0001 to 1000 with 4 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Generate a zero or negative amount.
fn arb_non_positive() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..=0i64).prop_map(|units| Decimal::new(units, 4))
}

fn arb_kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![Just(TransactionKind::Income), Just(TransactionKind::Outcome)]
}

fn arb_category() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Food", "Rent", "Work", "food", "Travel"]).prop_map(String::from)
}

fn request(kind: TransactionKind, value: Decimal, category: &str) -> TransactionRequest {
    TransactionRequest::new("entry", kind.as_str(), value, category)
}

// =============================================================================
// Ledger Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The net balance equals the signed sum of every accepted transaction.
    #[test]
    fn balance_equals_signed_sum(
        entries in prop::collection::vec((arb_kind(), arb_amount()), 1..30),
    ) {
        let engine = Engine::new();
        let mut expected = Decimal::ZERO;

        for (kind, value) in entries {
            if let Ok(tx) = engine.create_transaction(request(kind, value, "Misc")) {
                expected += tx.signed_value();
            }
            prop_assert_eq!(engine.balance().unwrap().total(), expected);
        }
    }

    /// Creating transactions never drives the balance negative.
    #[test]
    fn balance_never_negative(
        entries in prop::collection::vec((arb_kind(), arb_amount()), 1..30),
    ) {
        let engine = Engine::new();
        for (kind, value) in entries {
            let _ = engine.create_transaction(request(kind, value, "Misc"));
            prop_assert!(engine.balance().unwrap().total() >= Decimal::ZERO);
        }
    }

    /// An outcome above the balance fails and changes nothing.
    #[test]
    fn overdraft_rejected_without_mutation(
        income in arb_amount(),
        excess in arb_amount(),
    ) {
        let engine = Engine::new();
        engine.create_transaction(request(TransactionKind::Income, income, "Work")).unwrap();
        let before = engine.transactions().unwrap();

        let result = engine.create_transaction(
            request(TransactionKind::Outcome, income + excess, "Unseen"),
        );

        prop_assert_eq!(result, Err(LedgerError::InsufficientBalance));
        prop_assert_eq!(engine.transactions().unwrap(), before);
        prop_assert_eq!(engine.categories().unwrap().len(), 1);
    }

    /// Zero and negative values are rejected regardless of type.
    #[test]
    fn non_positive_value_rejected(kind in arb_kind(), value in arb_non_positive()) {
        let engine = Engine::new();
        prop_assert_eq!(
            engine.create_transaction(request(kind, value, "Misc")),
            Err(LedgerError::InvalidValue)
        );
    }

    /// Anything but the two lowercase spellings is an invalid type.
    #[test]
    fn unknown_type_rejected(raw in "[a-zA-Z]{0,12}", value in arb_amount()) {
        prop_assume!(raw != "income" && raw != "outcome");
        let engine = Engine::new();
        prop_assert_eq!(
            engine.create_transaction(TransactionRequest::new("x", raw, value, "Misc")),
            Err(LedgerError::InvalidType)
        );
    }

    /// Category titles stay unique across creates and imports.
    #[test]
    fn category_titles_unique(
        created in prop::collection::vec(arb_category(), 0..10),
        imported in prop::collection::vec(arb_category(), 0..10),
    ) {
        let engine = Engine::new();
        for category in &created {
            engine
                .create_transaction(TransactionRequest::new("x", "income", Decimal::ONE, category.as_str()))
                .unwrap();
        }

        let mut csv = String::from("title,type,value,category\n");
        for category in &imported {
            csv.push_str(&format!("y,income,1,{category}\n"));
        }
        engine
            .import_transactions(ReaderSource::new(Cursor::new(csv.into_bytes())))
            .unwrap();

        let categories = engine.categories().unwrap();
        let titles: HashSet<_> = categories.iter().map(|c| c.title.clone()).collect();
        prop_assert_eq!(titles.len(), categories.len());

        let expected: HashSet<_> = created.iter().chain(imported.iter()).cloned().collect();
        prop_assert_eq!(titles, expected);
    }
}
