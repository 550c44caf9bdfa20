use std::fmt;

use log::{debug, info};

use crate::error::{MailError, Result};
use crate::store::{Account, MailFolder, MailStore};

/// Folder used when no path is given.
pub const DEFAULT_FOLDER: &str = "Inbox";

/// Stands in for the account name in errors raised before it is known.
const FIRST_ACCOUNT: &str = "<first account>";

/// Folder path such as `"Inbox > Planning > 2019"`.
///
/// Segments are trimmed and must match folder names exactly. There is no
/// escaping, so a folder whose name contains `>` can't be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    pub fn parse(path: &str) -> Self {
        FolderPath {
            segments: path.split('>').map(|s| s.trim().to_string()).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl From<&str> for FolderPath {
    fn from(path: &str) -> Self {
        FolderPath::parse(path)
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(" > "))
    }
}

/// Accounts configured in the client, in enumeration order.
pub fn list_accounts<S: MailStore>(store: &S) -> Result<Vec<Account>> {
    let accounts = store.accounts()?;
    debug!("Found {} account(s)", accounts.len());
    Ok(accounts)
}

/// Resolves an account and folder path to that folder's items.
///
/// Without an account the first enumerated one is used; without a path,
/// `default_folder`. Any lookup failure is reported as a single
/// [`MailError::Resolution`] naming both the account and the path.
pub fn resolve_items<S: MailStore>(
    store: &S,
    account_email: Option<&str>,
    folder_path: Option<&str>,
    default_folder: &str,
) -> Result<<S::Folder as MailFolder>::Items> {
    let requested = folder_path.unwrap_or(default_folder).to_string();
    let path = FolderPath::parse(&requested);

    let account = match account_email {
        Some(email) => email.to_string(),
        None => {
            let accounts = list_accounts(store).map_err(|e| MailError::Resolution {
                account: FIRST_ACCOUNT.to_string(),
                path: requested.clone(),
                reason: e.to_string(),
            })?;
            let first = accounts.into_iter().next().ok_or(MailError::NoAccounts)?;
            debug!("No account given, using first account: {}", first.email);
            first.email
        }
    };

    info!("Resolving items of '{}' in account {}", path, account);

    let resolution_error = |reason: String| MailError::Resolution {
        account: account.clone(),
        path: requested.clone(),
        reason,
    };

    let mut folder = store
        .account_root(&account)
        .map_err(|e| resolution_error(e.to_string()))?;

    for segment in path.segments() {
        folder = match folder.subfolder(segment) {
            Ok(Some(child)) => child,
            Ok(None) => {
                return Err(resolution_error(format!(
                    "no folder named '{}' under '{}'",
                    segment,
                    folder.name()
                )))
            }
            Err(e) => return Err(resolution_error(e.to_string())),
        };
        debug!("Entered folder '{}'", segment);
    }

    folder.items().map_err(|e| resolution_error(e.to_string()))
}
