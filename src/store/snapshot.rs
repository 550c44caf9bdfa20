//! Mail store backed by a JSON snapshot of the client's object graph.
//!
//! Snapshot layout:
//!
//! ```json
//! { "accounts": [ { "name": "Jane Doe", "email": "jane@example.com",
//!     "folders": [ { "name": "Inbox", "folders": [], "items": [
//!       { "received": "2019-09-04T08:05:00", "subject": "Hi",
//!         "sender": { "name": "Bob", "address": "bob@example.com" },
//!         "recipients": [ { "name": "Jane Doe", "address": "jane@example.com" } ] } ] } ] } ] }
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{
    Account, AddressSource, DraftMessage, ItemClass, ItemCollection, MailFolder, MailItem,
    MailStore,
};
use crate::date_filter::{Restriction, CANONICAL_DATE_FORMAT};
use crate::error::StoreError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub accounts: Vec<AccountSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub folders: Vec<FolderSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSnapshot {
    pub name: String,
    #[serde(default)]
    pub folders: Vec<FolderSnapshot>,
    #[serde(default)]
    pub items: Vec<ItemSnapshot>,
}

fn mail_class() -> u32 {
    ItemClass::MAIL_CODE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSnapshot {
    #[serde(default = "mail_class")]
    pub class: u32,
    pub received: NaiveDateTime,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub html_body: String,
    pub sender: EntrySnapshot,
    #[serde(default)]
    pub recipients: Vec<EntrySnapshot>,
}

fn smtp_type() -> String {
    "SMTP".to_string()
}

/// Sender or recipient address entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub name: String,
    pub address: String,
    #[serde(default = "smtp_type")]
    pub address_type: String,
    /// Set when the directory knows this entry.
    #[serde(default)]
    pub directory_address: Option<String>,
}

impl EntrySnapshot {
    fn lookup_directory(&self) -> Result<String, StoreError> {
        self.directory_address
            .clone()
            .ok_or_else(|| StoreError::Directory(format!("no directory user for '{}'", self.name)))
    }
}

impl AddressSource for EntrySnapshot {
    fn class(&self) -> ItemClass {
        ItemClass::Recipient
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn address_type(&self) -> String {
        self.address_type.clone()
    }

    fn literal_address(&self) -> String {
        self.address.clone()
    }

    fn directory_address(&self) -> Result<String, StoreError> {
        self.lookup_directory()
    }
}

#[derive(Debug)]
struct FolderNode {
    name: String,
    children: Vec<Rc<FolderNode>>,
    items: Vec<SnapshotItem>,
}

impl FolderNode {
    fn build(name: String, folders: Vec<FolderSnapshot>, items: Vec<ItemSnapshot>) -> Rc<Self> {
        Rc::new(FolderNode {
            name,
            children: folders
                .into_iter()
                .map(|f| FolderNode::build(f.name, f.folders, f.items))
                .collect(),
            items: items.into_iter().map(|i| SnapshotItem(Rc::new(i))).collect(),
        })
    }
}

/// Message recorded by the snapshot outbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub to: String,
    pub cc: Option<String>,
    pub attachments: Vec<PathBuf>,
    pub displayed: bool,
}

#[derive(Debug, Default)]
struct Outbox {
    displayed: Vec<SentMessage>,
    sent: Vec<SentMessage>,
}

pub struct SnapshotStore {
    accounts: Vec<Account>,
    roots: Vec<Rc<FolderNode>>,
    outbox: Rc<RefCell<Outbox>>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let mut accounts = Vec::new();
        let mut roots = Vec::new();

        for account in snapshot.accounts {
            accounts.push(Account {
                name: account.name,
                email: account.email.clone(),
            });
            roots.push(FolderNode::build(account.email, account.folders, Vec::new()));
        }

        SnapshotStore {
            accounts,
            roots,
            outbox: Rc::new(RefCell::new(Outbox::default())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        info!("Loading mailbox snapshot from {}", path.display());
        let json = fs::read_to_string(path)?;
        let store = Self::from_json(&json)?;
        debug!("Snapshot has {} account(s)", store.accounts.len());
        Ok(store)
    }

    /// Messages that went through `send`, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox.borrow().sent.clone()
    }

    /// Messages that were shown, sent or not.
    pub fn displayed(&self) -> Vec<SentMessage> {
        self.outbox.borrow().displayed.clone()
    }

    /// Writes every sent message to `dir` as `<id>.json`.
    pub fn write_outbox(&self, dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for message in &self.outbox.borrow().sent {
            let path = dir.join(format!("{}.json", message.id));
            fs::write(&path, serde_json::to_string_pretty(message)?)?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

impl MailStore for SnapshotStore {
    type Folder = SnapshotFolder;
    type Draft = SnapshotDraft;

    fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.accounts.clone())
    }

    fn account_root(&self, email: &str) -> Result<SnapshotFolder, StoreError> {
        self.roots
            .iter()
            .find(|root| root.name == email)
            .map(|root| SnapshotFolder(Rc::clone(root)))
            .ok_or_else(|| StoreError::NotFound(format!("account '{}'", email)))
    }

    fn create_draft(&self) -> Result<SnapshotDraft, StoreError> {
        Ok(SnapshotDraft {
            outbox: Rc::clone(&self.outbox),
            message: SentMessage {
                id: uuid::Uuid::new_v4().to_string(),
                ..SentMessage::default()
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotFolder(Rc<FolderNode>);

impl MailFolder for SnapshotFolder {
    type Items = SnapshotItems;

    fn name(&self) -> String {
        self.0.name.clone()
    }

    fn subfolder(&self, name: &str) -> Result<Option<Self>, StoreError> {
        Ok(self
            .0
            .children
            .iter()
            .find(|child| child.name == name)
            .map(|child| SnapshotFolder(Rc::clone(child))))
    }

    fn items(&self) -> Result<SnapshotItems, StoreError> {
        Ok(SnapshotItems::new(self.0.items.clone()))
    }
}

/// Live item handle. Clones share the same underlying item.
#[derive(Debug, Clone)]
pub struct SnapshotItem(Rc<ItemSnapshot>);

impl SnapshotItem {
    pub fn data(&self) -> &ItemSnapshot {
        &self.0
    }

    /// Whether both handles point at the same item.
    pub fn same_item(&self, other: &SnapshotItem) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl AddressSource for SnapshotItem {
    fn class(&self) -> ItemClass {
        ItemClass::from_code(self.0.class)
    }

    fn display_name(&self) -> String {
        self.0.sender.name.clone()
    }

    fn address_type(&self) -> String {
        self.0.sender.address_type.clone()
    }

    fn literal_address(&self) -> String {
        self.0.sender.address.clone()
    }

    fn directory_address(&self) -> Result<String, StoreError> {
        self.0.sender.lookup_directory()
    }
}

impl MailItem for SnapshotItem {
    type Recipient = EntrySnapshot;

    fn received_time(&self) -> Result<NaiveDateTime, StoreError> {
        Ok(self.0.received)
    }

    fn subject(&self) -> String {
        self.0.subject.clone()
    }

    fn body(&self) -> String {
        self.0.body.clone()
    }

    fn html_body(&self) -> String {
        self.0.html_body.clone()
    }

    fn recipients(&self) -> Result<Vec<EntrySnapshot>, StoreError> {
        Ok(self.0.recipients.clone())
    }
}

/// Item collection with a `first`/`next` cursor.
#[derive(Debug, Clone)]
pub struct SnapshotItems {
    items: Vec<SnapshotItem>,
    cursor: usize,
}

impl SnapshotItems {
    fn new(items: Vec<SnapshotItem>) -> Self {
        SnapshotItems { items, cursor: 0 }
    }
}

/// Bounds compare against midnight of the given day, like the client does.
fn restriction_bound(
    value: Option<&str>,
    restriction: &Restriction,
) -> Result<Option<NaiveDateTime>, StoreError> {
    value
        .map(|text| {
            NaiveDate::parse_from_str(text, CANONICAL_DATE_FORMAT)
                .map(|date| date.and_time(NaiveTime::MIN))
                .map_err(|e| StoreError::Restriction {
                    query: restriction.to_string(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

impl ItemCollection for SnapshotItems {
    type Item = SnapshotItem;

    fn restrict(&self, restriction: &Restriction) -> Result<Self, StoreError> {
        let start = restriction_bound(restriction.start(), restriction)?;
        let end = restriction_bound(restriction.end(), restriction)?;

        let items = self
            .items
            .iter()
            .filter(|item| start.map_or(true, |start| item.0.received >= start))
            .filter(|item| end.map_or(true, |end| item.0.received <= end))
            .cloned()
            .collect();

        Ok(SnapshotItems::new(items))
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.items.len())
    }

    fn first(&mut self) -> Result<Option<SnapshotItem>, StoreError> {
        self.cursor = 0;
        self.next()
    }

    fn next(&mut self) -> Result<Option<SnapshotItem>, StoreError> {
        let item = self.items.get(self.cursor).cloned();
        if item.is_some() {
            self.cursor += 1;
        }
        Ok(item)
    }
}

/// Draft that lands in the store's outbox when sent.
pub struct SnapshotDraft {
    outbox: Rc<RefCell<Outbox>>,
    message: SentMessage,
}

impl DraftMessage for SnapshotDraft {
    fn set_subject(&mut self, subject: &str) {
        self.message.subject = subject.to_string();
    }

    fn set_body(&mut self, body: &str) {
        self.message.body = body.to_string();
    }

    fn set_to(&mut self, to: &str) {
        self.message.to = to.to_string();
    }

    fn set_cc(&mut self, cc: &str) {
        self.message.cc = Some(cc.to_string());
    }

    fn attach(&mut self, path: &Path) -> Result<(), StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        self.message.attachments.push(path.to_path_buf());
        Ok(())
    }

    fn display(&mut self, _modal: bool) -> Result<(), StoreError> {
        self.message.displayed = true;
        info!("📨 To: {} | Subject: {}", self.message.to, self.message.subject);
        self.outbox.borrow_mut().displayed.push(self.message.clone());
        Ok(())
    }

    fn send(self) -> Result<(), StoreError> {
        debug!("Outbox received message {}", self.message.id);
        self.outbox.borrow_mut().sent.push(self.message);
        Ok(())
    }
}
