use log::{info, warn};

use crate::composer::{self, OutgoingMessage};
use crate::config::SessionConfig;
use crate::date_filter::{self, DateBound};
use crate::error::Result;
use crate::projector::{self, ItemRecords, LiveItems};
use crate::resolver;
use crate::store::{Account, ItemCollection, MailFolder, MailStore};

/// Items of a folder resolved through a given store.
pub type StoreItems<S> = <<S as MailStore>::Folder as MailFolder>::Items;

/// Facade over one mail client session.
///
/// The session is borrowed: the facade neither opens nor closes it, so
/// several facades (or tests) can share or swap stores freely.
pub struct MailSession<'s, S: MailStore> {
    store: &'s S,
    config: SessionConfig,
}

impl<'s, S: MailStore> MailSession<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    pub fn with_config(store: &'s S, config: SessionConfig) -> Self {
        MailSession { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let accounts = resolver::list_accounts(self.store)?;
        if self.config.log_accounts {
            for account in &accounts {
                info!("Account: {} <{}>", account.name, account.email);
            }
        }
        Ok(accounts)
    }

    /// Items of `folder_path` (default folder when `None`) in `account_email`
    /// (first account when `None`).
    pub fn resolve_items(
        &self,
        account_email: Option<&str>,
        folder_path: Option<&str>,
    ) -> Result<StoreItems<S>> {
        if self.config.log_accounts {
            if let Err(e) = self.list_accounts() {
                warn!("Unable to list accounts: {}", e);
            }
        }
        resolver::resolve_items(
            self.store,
            account_email,
            folder_path,
            &self.config.default_folder,
        )
    }

    pub fn filter_by_date(
        &self,
        items: &StoreItems<S>,
        start: Option<DateBound>,
        end: Option<DateBound>,
    ) -> Result<StoreItems<S>> {
        date_filter::filter_by_date(items, start, end)
    }

    /// Records for `items`, keeping live items per the session config.
    pub fn project_items<C: ItemCollection>(&self, items: C) -> ItemRecords<C> {
        projector::project_items(items, self.config.keep_live_items)
    }

    pub fn project_items_with<C: ItemCollection>(
        &self,
        items: C,
        keep_live_handle: bool,
    ) -> ItemRecords<C> {
        projector::project_items(items, keep_live_handle)
    }

    pub fn live_items<C: ItemCollection>(&self, items: C) -> LiveItems<C> {
        projector::live_items(items)
    }

    pub fn compose(&self, message: &OutgoingMessage) -> Result<()> {
        composer::compose(self.store, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::error::{MailError, StoreError};
    use crate::store::snapshot::{SnapshotDraft, SnapshotFolder};
    use crate::store::SnapshotStore;

    /// Counts account enumerations, optionally failing them.
    struct CountingStore {
        inner: SnapshotStore,
        listed: Cell<usize>,
        broken: bool,
    }

    impl CountingStore {
        fn new(broken: bool) -> Self {
            let inner = SnapshotStore::from_json(
                r#"{ "accounts": [
                     { "name": "Alin", "email": "alin@example.com",
                       "folders": [ { "name": "Inbox" } ] },
                     { "name": "Work", "email": "work@corp.example.com",
                       "folders": [ { "name": "Inbox" } ] } ] }"#,
            )
            .unwrap();
            CountingStore {
                inner,
                listed: Cell::new(0),
                broken,
            }
        }
    }

    impl MailStore for CountingStore {
        type Folder = SnapshotFolder;
        type Draft = SnapshotDraft;

        fn accounts(&self) -> std::result::Result<Vec<Account>, StoreError> {
            self.listed.set(self.listed.get() + 1);
            if self.broken {
                return Err(StoreError::Client("Accounts collection unavailable".to_string()));
            }
            self.inner.accounts()
        }

        fn account_root(&self, email: &str) -> std::result::Result<SnapshotFolder, StoreError> {
            self.inner.account_root(email)
        }

        fn create_draft(&self) -> std::result::Result<SnapshotDraft, StoreError> {
            self.inner.create_draft()
        }
    }

    fn logging() -> SessionConfig {
        SessionConfig {
            log_accounts: true,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_explicit_account_is_not_enumerated_by_default() {
        let store = CountingStore::new(false);
        let session = MailSession::new(&store);

        session.resolve_items(Some("work@corp.example.com"), None).unwrap();
        assert_eq!(store.listed.get(), 0);
    }

    #[test]
    fn test_log_accounts_enumerates_before_resolving() {
        let store = CountingStore::new(false);
        let session = MailSession::with_config(&store, logging());

        session.resolve_items(Some("work@corp.example.com"), None).unwrap();
        assert_eq!(store.listed.get(), 1);

        let accounts = session.list_accounts().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(store.listed.get(), 2);
    }

    #[test]
    fn test_log_accounts_failure_does_not_block_explicit_account() {
        let store = CountingStore::new(true);
        let session = MailSession::with_config(&store, logging());

        assert!(session.resolve_items(Some("alin@example.com"), None).is_ok());
        assert!(matches!(
            session.resolve_items(None, None),
            Err(MailError::Resolution { .. })
        ));
    }
}
