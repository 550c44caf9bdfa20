//! Error types for the mail session facade.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::ItemClass;

/// Failures reported by a store adapter (the mail client side of the boundary).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The client has no object under that name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Directory (Exchange) address lookup failed.
    #[error("directory lookup failed: {0}")]
    Directory(String),

    /// The client rejected a restriction query.
    #[error("invalid restriction '{query}': {reason}")]
    Restriction { query: String, reason: String },

    /// The client refused the call.
    #[error("mail client error: {0}")]
    Client(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Badly shaped caller input.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("'{param}' must be a date or a string like DD/MM/YYYY (got '{value}')")]
    InvalidDate { param: &'static str, value: String },

    #[error("'{field}' must be an address string or a list of address strings")]
    RecipientType { field: &'static str },

    #[error("'attachments' must be a list of file paths")]
    AttachmentType,
}

/// Errors that can occur in facade operations.
#[derive(Debug, Error)]
pub enum MailError {
    /// The client exposes no account at all.
    #[error("no account is configured in the mail client")]
    NoAccounts,

    /// Account or folder segment not found.
    #[error("can't get items from account '{account}' with folder path '{path}': {reason}")]
    Resolution {
        account: String,
        path: String,
        reason: String,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("a start date or an end date is required")]
    MissingDateBound,

    #[error("no items match the dates provided ({query})")]
    EmptyResult { query: String },

    #[error("can't extract an email address from an item of class {0}")]
    UnsupportedItem(ItemClass),

    #[error("{} not found", .0.display())]
    AttachmentNotFound(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, MailError>;
