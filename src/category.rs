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

//! Find-or-create resolution of category titles.
//!
//! Titles are matched exactly: no trimming, no case folding. Creation goes
//! through [`Storage::insert_category`], which is atomic per title, so
//! resolving the same title from any number of callers yields one category.

use crate::error::LedgerResult;
use crate::storage::Storage;
use crate::transaction::Category;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Maps category titles to stored categories, creating missing ones.
pub struct CategoryResolver<'a, S: ?Sized> {
    storage: &'a S,
}

impl<'a, S: Storage + ?Sized> CategoryResolver<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Returns the category titled `title`, creating it on first use.
    pub fn resolve(&self, title: &str) -> LedgerResult<Category> {
        if let Some(category) = self.storage.find_category(title)? {
            return Ok(category);
        }
        let category = self.storage.insert_category(title)?;
        debug!(id = %category.id, title = %category.title, "category resolved by insert");
        Ok(category)
    }

    /// Resolves many titles with one lookup and at most one batch insert.
    ///
    /// Repeated titles in the input are collapsed first, so every occurrence
    /// of a new title maps to the same created category.
    pub fn resolve_many<T: AsRef<str>>(
        &self,
        titles: &[T],
    ) -> LedgerResult<HashMap<String, Category>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut distinct: Vec<String> = Vec::new();
        for title in titles {
            let title: &str = title.as_ref();
            if seen.insert(title) {
                distinct.push(title.to_owned());
            }
        }
        if distinct.is_empty() {
            return Ok(HashMap::new());
        }

        let mut resolved: HashMap<String, Category> = self
            .storage
            .find_categories(&distinct)?
            .into_iter()
            .map(|category| (category.title.clone(), category))
            .collect();

        let missing: Vec<String> = distinct
            .into_iter()
            .filter(|title| !resolved.contains_key(title))
            .collect();
        if !missing.is_empty() {
            for category in self.storage.insert_categories(&missing)? {
                debug!(id = %category.id, title = %category.title, "category created in batch");
                resolved.insert(category.title.clone(), category);
            }
        }

        Ok(resolved)
    }
}
