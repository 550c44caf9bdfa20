//! Adapter boundary between the facade and the desktop mail client.
//!
//! Everything the facade needs from the client's object model goes through
//! these traits, so the read and write paths stay statically typed and can
//! run against [`snapshot::SnapshotStore`] instead of a live client.

pub mod snapshot;

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::date_filter::Restriction;
use crate::error::StoreError;

pub use snapshot::SnapshotStore;

/// Address type reported for directory-based (Exchange) senders.
pub const DIRECTORY_ADDRESS_TYPE: &str = "EX";

/// A mail account configured in the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub email: String,
}

/// Object class as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    /// A mail message (class 43).
    Mail,
    /// A recipient entry (class 4).
    Recipient,
    /// Meetings, tasks, reports...
    Other(u32),
}

impl ItemClass {
    pub const MAIL_CODE: u32 = 43;
    pub const RECIPIENT_CODE: u32 = 4;

    pub fn from_code(code: u32) -> Self {
        match code {
            Self::MAIL_CODE => ItemClass::Mail,
            Self::RECIPIENT_CODE => ItemClass::Recipient,
            other => ItemClass::Other(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            ItemClass::Mail => Self::MAIL_CODE,
            ItemClass::Recipient => Self::RECIPIENT_CODE,
            ItemClass::Other(code) => *code,
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemClass::Mail => write!(f, "mail ({})", self.code()),
            ItemClass::Recipient => write!(f, "recipient ({})", self.code()),
            ItemClass::Other(code) => write!(f, "{}", code),
        }
    }
}

/// Session with the mail client. One per process in practice, injected
/// into [`crate::MailSession`].
pub trait MailStore {
    type Folder: MailFolder;
    type Draft: DraftMessage;

    /// Accounts in the client's enumeration order.
    fn accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Root folder of the account owning `email`.
    fn account_root(&self, email: &str) -> Result<Self::Folder, StoreError>;

    /// New, empty outgoing message from the default profile.
    fn create_draft(&self) -> Result<Self::Draft, StoreError>;
}

pub trait MailFolder: Sized {
    type Items: ItemCollection;

    fn name(&self) -> String;

    /// Direct child named exactly `name`, if any.
    fn subfolder(&self, name: &str) -> Result<Option<Self>, StoreError>;

    fn items(&self) -> Result<Self::Items, StoreError>;
}

/// Item collection with the client's cursor semantics.
pub trait ItemCollection: Sized {
    type Item: MailItem;

    /// New collection narrowed by `restriction`, evaluated by the client.
    fn restrict(&self, restriction: &Restriction) -> Result<Self, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    /// Rewinds the cursor and returns the first item.
    fn first(&mut self) -> Result<Option<Self::Item>, StoreError>;

    fn next(&mut self) -> Result<Option<Self::Item>, StoreError>;
}

/// Anything an email address can be extracted from.
pub trait AddressSource {
    fn class(&self) -> ItemClass;

    fn display_name(&self) -> String;

    /// `EX` for directory entries, `SMTP` otherwise.
    fn address_type(&self) -> String;

    /// Address as stored on the object, which is a directory DN for `EX`.
    fn literal_address(&self) -> String;

    /// Primary SMTP address looked up in the organizational directory.
    fn directory_address(&self) -> Result<String, StoreError>;
}

/// A live mail item. Sender fields come from the [`AddressSource`] impl.
pub trait MailItem: AddressSource + Clone {
    type Recipient: AddressSource;

    fn received_time(&self) -> Result<NaiveDateTime, StoreError>;
    fn subject(&self) -> String;
    fn body(&self) -> String;
    fn html_body(&self) -> String;

    /// Recipients in the client's order.
    fn recipients(&self) -> Result<Vec<Self::Recipient>, StoreError>;
}

/// Outgoing message being built inside the client.
pub trait DraftMessage {
    fn set_subject(&mut self, subject: &str);
    fn set_body(&mut self, body: &str);
    fn set_to(&mut self, to: &str);
    fn set_cc(&mut self, cc: &str);
    fn attach(&mut self, path: &Path) -> Result<(), StoreError>;

    /// Shows the message in the client. Blocks until dismissed when `modal`.
    fn display(&mut self, modal: bool) -> Result<(), StoreError>;

    fn send(self) -> Result<(), StoreError>;
}
