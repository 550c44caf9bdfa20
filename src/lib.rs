// Library exports for mailsession crate
// The binary and the integration tests go through these modules

pub mod composer;
pub mod config;
pub mod date_filter;
pub mod error;
pub mod export;
pub mod projector;
pub mod resolver;
pub mod session;
pub mod store;

pub use composer::{ComposeRequest, OutgoingMessage, Recipients};
pub use date_filter::{filter_by_date, DateBound, Restriction};
pub use error::{FormatError, MailError, Result, StoreError};
pub use projector::{Address, Contact, ItemRecord, ItemRecords, LiveItem, LiveItems};
pub use resolver::FolderPath;
pub use session::MailSession;
pub use store::{Account, MailStore, SnapshotStore};
