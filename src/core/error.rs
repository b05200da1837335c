//! Errors surfaced to callers of the ledger.

use crate::core::pagination::PageError;
use crate::core::transaction::{CategoryId, TransactionId};
use std::collections::BTreeMap;
use std::fmt;

/// Field-level validation failures, keyed by the offending field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(f, m)| (f.as_str(), m.as_slice()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The request was rejected before anything was persisted.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// No transaction with this id is owned by the requesting user. Used for
    /// both missing ids and ids owned by someone else.
    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),

    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error(transparent)]
    Page(#[from] PageError),

    /// The store failed; nothing about the request itself was wrong.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            LedgerError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
