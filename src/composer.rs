use std::path::PathBuf;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{FormatError, MailError, Result};
use crate::store::{DraftMessage, MailStore};

/// Separator the client expects between addresses in To/CC.
pub const ADDRESS_SEPARATOR: &str = "; ";

/// One address or an ordered list of addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    /// Value for the client's To/CC field.
    pub fn to_field(&self) -> String {
        match self {
            Recipients::One(address) => address.clone(),
            Recipients::Many(addresses) => addresses.join(ADDRESS_SEPARATOR),
        }
    }

    /// Accepts a JSON string or an array of strings, nothing else.
    pub fn from_value(
        value: &Value,
        field: &'static str,
    ) -> std::result::Result<Self, FormatError> {
        match value {
            Value::String(address) => Ok(Recipients::One(address.clone())),
            Value::Array(values) => values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Recipients::Many)
                .ok_or(FormatError::RecipientType { field }),
            _ => Err(FormatError::RecipientType { field }),
        }
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Recipients::One(address.to_string())
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Recipients::One(address)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Recipients::Many(addresses)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(addresses: Vec<&str>) -> Self {
        Recipients::Many(addresses.into_iter().map(str::to_string).collect())
    }
}

/// Attachment list from JSON. A bare string is rejected, unlike To/CC.
pub fn attachments_from_value(value: &Value) -> std::result::Result<Vec<PathBuf>, FormatError> {
    match value {
        Value::Array(values) => values
            .iter()
            .map(|v| v.as_str().map(PathBuf::from))
            .collect::<Option<Vec<_>>>()
            .ok_or(FormatError::AttachmentType),
        _ => Err(FormatError::AttachmentType),
    }
}

/// A message to hand over to the client.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub subject: String,
    pub body: String,
    pub to: Recipients,
    pub cc: Option<Recipients>,
    pub attachments: Vec<PathBuf>,
    /// Show the message in the client before anything else.
    pub display: bool,
    /// Transmit the message, whatever happened on display.
    pub send: bool,
}

impl OutgoingMessage {
    /// Displayed then sent, no CC, no attachments.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        to: impl Into<Recipients>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            to: to.into(),
            cc: None,
            attachments: Vec::new(),
            display: true,
            send: true,
        }
    }

    #[must_use]
    pub fn with_cc(mut self, cc: impl Into<Recipients>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    #[must_use]
    pub fn with_send(mut self, send: bool) -> Self {
        self.send = send;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Loosely typed compose request, as read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposeRequest {
    pub subject: String,
    #[serde(alias = "message")]
    pub body: String,
    pub to: Value,
    #[serde(default)]
    pub cc: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Value>,
    #[serde(default = "default_true")]
    pub display: bool,
    #[serde(default = "default_true")]
    pub send: bool,
}

impl ComposeRequest {
    /// Checks the loose fields and builds the typed message.
    pub fn into_message(self) -> Result<OutgoingMessage> {
        let to = Recipients::from_value(&self.to, "to")?;
        let cc = self
            .cc
            .as_ref()
            .map(|cc| Recipients::from_value(cc, "cc"))
            .transpose()?;
        let attachments = match &self.attachments {
            Some(value) => attachments_from_value(value)?,
            None => Vec::new(),
        };

        Ok(OutgoingMessage {
            subject: self.subject,
            body: self.body,
            to,
            cc,
            attachments,
            display: self.display,
            send: self.send,
        })
    }
}

/// Builds `message` in the client, then displays and/or sends it.
///
/// Every attachment is checked before the draft is created: one missing
/// file aborts the whole message.
pub fn compose<S: MailStore>(store: &S, message: &OutgoingMessage) -> Result<()> {
    let to = message.to.to_field();
    let cc = message
        .cc
        .as_ref()
        .map(Recipients::to_field)
        .filter(|cc| !cc.is_empty());

    if let Some(missing) = message.attachments.iter().find(|path| !path.is_file()) {
        return Err(MailError::AttachmentNotFound(missing.clone()));
    }

    let mut draft = store.create_draft()?;
    draft.set_subject(&message.subject);
    draft.set_body(&message.body);
    draft.set_to(&to);
    if let Some(cc) = &cc {
        draft.set_cc(cc);
    }

    for path in &message.attachments {
        debug!("Attaching {}", path.display());
        draft.attach(path)?;
    }

    if message.display {
        info!("Displaying message '{}'", message.subject);
        draft.display(true)?;
    }

    if message.send {
        draft.send()?;
        info!("✅ Message '{}' sent to {}", message.subject, to);
    } else {
        debug!("Message '{}' not sent (send = false)", message.subject);
    }

    Ok(())
}
