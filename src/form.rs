//! State model of the product entry form.
//!
//! Mirrors the inline script of the bundled page: an ordered list of
//! entries plus an optional edit cursor. All mutations are synchronous.

use crate::product::{CODE_LENGTH, GenerateRequest, ProductEntry};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("field `{0}` is required")]
    MissingField(&'static str),
    #[error("code must be at most {max} characters, got {len}")]
    CodeTooLong { max: usize, len: usize },
}

/// One rendered table row: the entry and its position.
#[derive(Debug, PartialEq, Eq)]
pub struct Row<'a> {
    pub index: usize,
    pub entry: &'a ProductEntry,
    pub editing: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ProductForm {
    entries: Vec<ProductEntry>,
    edit_cursor: Option<usize>,
}

impl ProductForm {
    pub fn new() -> Self {
        ProductForm::default()
    }

    pub fn entries(&self) -> &[ProductEntry] {
        &self.entries
    }

    pub fn edit_cursor(&self) -> Option<usize> {
        self.edit_cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `entry`, or replace the entry under the edit cursor and clear it.
    /// Returns the index the entry now occupies.
    pub fn submit(&mut self, entry: ProductEntry) -> Result<usize, FormError> {
        check_fields(&entry)?;
        match self.edit_cursor.take() {
            Some(index) if index < self.entries.len() => {
                self.entries[index] = entry;
                Ok(index)
            }
            _ => {
                self.entries.push(entry);
                Ok(self.entries.len() - 1)
            }
        }
    }

    /// Point the edit cursor at `index` and return the entry to prefill the inputs.
    pub fn begin_edit(&mut self, index: usize) -> Option<&ProductEntry> {
        let entry = self.entries.get(index)?;
        self.edit_cursor = Some(index);
        Some(entry)
    }

    /// Remove the entry at `index`. The edit cursor keeps pointing at the same
    /// entry, or is cleared if that entry was the one removed.
    pub fn delete(&mut self, index: usize) -> Option<ProductEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.edit_cursor = match self.edit_cursor {
            Some(cursor) if cursor == index => None,
            Some(cursor) if cursor > index => Some(cursor - 1),
            other => other,
        };
        Some(removed)
    }

    pub fn rows(&self) -> Vec<Row<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Row {
                index,
                entry,
                editing: self.edit_cursor == Some(index),
            })
            .collect()
    }

    /// JSON body for `POST /generate_doc`.
    pub fn to_request_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&GenerateRequest {
            products: self.entries.clone(),
        })
    }
}

fn check_fields(entry: &ProductEntry) -> Result<(), FormError> {
    let fields = [
        ("barcode", &entry.barcode),
        ("description", &entry.description),
        ("code", &entry.code),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(FormError::MissingField(name));
        }
    }
    let len = entry.code.chars().count();
    if len > CODE_LENGTH {
        return Err(FormError::CodeTooLong {
            max: CODE_LENGTH,
            len,
        });
    }
    Ok(())
}
