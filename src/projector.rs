use std::fmt;

use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::{Serialize, Serializer};

use crate::error::{MailError, Result};
use crate::store::{AddressSource, ItemClass, ItemCollection, MailItem, DIRECTORY_ADDRESS_TYPE};

/// Placeholder written instead of the live item when it is not kept.
pub const OMITTED_ITEM_NOTE: &str = "mail item not kept, project with keep_live_handle = true";

/// Format of `received` in exported records.
pub const RECEIVED_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Email address extracted from a sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Resolved SMTP address.
    Smtp(String),
    /// Directory lookup failed for a recipient; this is the raw address
    /// stored on the recipient entry (often an Exchange DN).
    Unresolved(String),
}

impl Address {
    pub fn as_str(&self) -> &str {
        match self {
            Address::Smtp(address) | Address::Unresolved(address) => address,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Address::Smtp(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Extracts the email address of a mail item's sender or of a recipient.
///
/// Mail items use the directory address when the sender is an Exchange
/// entry. Recipients try the directory and fall back to their raw address
/// on any failure. Other classes are rejected.
pub fn extract_address<A: AddressSource>(source: &A) -> Result<Address> {
    match source.class() {
        ItemClass::Mail => {
            if source.address_type() == DIRECTORY_ADDRESS_TYPE {
                Ok(Address::Smtp(source.directory_address()?))
            } else {
                Ok(Address::Smtp(source.literal_address()))
            }
        }
        ItemClass::Recipient => match source.directory_address() {
            Ok(address) => Ok(Address::Smtp(address)),
            Err(e) => {
                warn!(
                    "Directory lookup failed for recipient '{}', keeping raw address: {}",
                    source.display_name(),
                    e
                );
                Ok(Address::Unresolved(source.literal_address()))
            }
        },
        other => Err(MailError::UnsupportedItem(other)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: String,
    pub email: Address,
}

/// Live item attached to a record, or the note that replaced it.
#[derive(Debug, Clone)]
pub enum LiveItem<I> {
    Kept(I),
    Omitted,
}

impl<I> LiveItem<I> {
    pub fn as_ref(&self) -> Option<&I> {
        match self {
            LiveItem::Kept(item) => Some(item),
            LiveItem::Omitted => None,
        }
    }

    pub fn into_inner(self) -> Option<I> {
        match self {
            LiveItem::Kept(item) => Some(item),
            LiveItem::Omitted => None,
        }
    }
}

impl<I> Serialize for LiveItem<I> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            LiveItem::Kept(_) => serializer.serialize_str("mail item kept in memory"),
            LiveItem::Omitted => serializer.serialize_str(OMITTED_ITEM_NOTE),
        }
    }
}

/// Plain snapshot of a mail item.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct ItemRecord<I> {
    #[serde(serialize_with = "serialize_received")]
    pub received: NaiveDateTime,
    pub subject: String,
    pub body: String,
    pub html_body: String,
    pub sender: Contact,
    pub recipients: Vec<Contact>,
    pub mail_item: LiveItem<I>,
}

fn serialize_received<S: Serializer>(
    received: &NaiveDateTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&received.format(RECEIVED_FORMAT).to_string())
}

/// Recipients of `item` as name/address pairs, in the client's order.
pub fn item_recipients<I: MailItem>(item: &I) -> Result<Vec<Contact>> {
    item.recipients()?
        .iter()
        .map(|recipient| {
            Ok(Contact {
                name: recipient.display_name(),
                email: extract_address(recipient)?,
            })
        })
        .collect()
}

/// Builds the record for one item.
pub fn project_item<I: MailItem>(item: I, keep_live_handle: bool) -> Result<ItemRecord<I>> {
    let record = ItemRecord {
        received: item.received_time()?,
        subject: item.subject(),
        body: item.body(),
        html_body: item.html_body(),
        sender: Contact {
            name: item.display_name(),
            email: extract_address(&item)?,
        },
        recipients: item_recipients(&item)?,
        mail_item: LiveItem::Omitted,
    };

    if keep_live_handle {
        Ok(ItemRecord {
            mail_item: LiveItem::Kept(item),
            ..record
        })
    } else {
        Ok(record)
    }
}

#[derive(Debug, Clone, Copy)]
enum CursorState {
    NotStarted,
    Reading { remaining: usize },
    Done,
}

/// Lazy walk over a collection with its `first`/`next` cursor.
///
/// Bounded by the collection's count when the walk starts. Stops for good
/// after the last item or after the first error.
pub struct LiveItems<C: ItemCollection> {
    items: C,
    state: CursorState,
}

impl<C: ItemCollection> LiveItems<C> {
    pub fn new(items: C) -> Self {
        LiveItems {
            items,
            state: CursorState::NotStarted,
        }
    }

    fn advance(&mut self) -> Result<Option<C::Item>> {
        let fetched = match self.state {
            CursorState::Done => return Ok(None),
            CursorState::Reading { remaining: 0 } => {
                self.state = CursorState::Done;
                return Ok(None);
            }
            CursorState::NotStarted => {
                let total = self.items.count()?;
                debug!("Walking {} item(s)", total);
                self.state = CursorState::Reading { remaining: total };
                if total == 0 {
                    self.state = CursorState::Done;
                    return Ok(None);
                }
                self.items.first()?
            }
            CursorState::Reading { .. } => self.items.next()?,
        };

        match (fetched, self.state) {
            (Some(item), CursorState::Reading { remaining }) => {
                self.state = CursorState::Reading {
                    remaining: remaining - 1,
                };
                Ok(Some(item))
            }
            _ => {
                self.state = CursorState::Done;
                Ok(None)
            }
        }
    }
}

impl<C: ItemCollection> Iterator for LiveItems<C> {
    type Item = Result<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.state = CursorState::Done;
                Some(Err(e))
            }
        }
    }
}

/// Lazy sequence of [`ItemRecord`]s, one item read per advance.
pub struct ItemRecords<C: ItemCollection> {
    cursor: LiveItems<C>,
    keep_live_handle: bool,
}

impl<C: ItemCollection> ItemRecords<C> {
    pub fn new(items: C, keep_live_handle: bool) -> Self {
        ItemRecords {
            cursor: LiveItems::new(items),
            keep_live_handle,
        }
    }
}

impl<C: ItemCollection> Iterator for ItemRecords<C> {
    type Item = Result<ItemRecord<C::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.cursor.next()? {
            Ok(item) => item,
            Err(e) => return Some(Err(e)),
        };

        let record = project_item(item, self.keep_live_handle);
        if record.is_err() {
            self.cursor.state = CursorState::Done;
        }
        Some(record)
    }
}

/// Raw items of `items`, one per advance.
pub fn live_items<C: ItemCollection>(items: C) -> LiveItems<C> {
    LiveItems::new(items)
}

/// Records for `items`. The live item is only kept when asked for.
pub fn project_items<C: ItemCollection>(items: C, keep_live_handle: bool) -> ItemRecords<C> {
    ItemRecords::new(items, keep_live_handle)
}
