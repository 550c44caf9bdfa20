use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::projector::{Contact, ItemRecord, RECEIVED_FORMAT};

/// One CSV line per record. Recipients are flattened into one column.
#[derive(Debug, Serialize)]
pub struct RecordRow {
    pub received: String,
    pub subject: String,
    pub sender_name: String,
    pub sender_email: String,
    pub recipients: String,
    pub body: String,
}

fn format_contact(contact: &Contact) -> String {
    format!("{} <{}>", contact.name, contact.email)
}

impl<I> From<&ItemRecord<I>> for RecordRow {
    fn from(record: &ItemRecord<I>) -> Self {
        RecordRow {
            received: record.received.format(RECEIVED_FORMAT).to_string(),
            subject: record.subject.clone(),
            sender_name: record.sender.name.clone(),
            sender_email: record.sender.email.to_string(),
            recipients: record
                .recipients
                .iter()
                .map(format_contact)
                .collect::<Vec<_>>()
                .join("; "),
            body: record.body.clone(),
        }
    }
}

pub fn write_json<I, W: Write>(records: &[ItemRecord<I>], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records).context("Unable to write JSON records")
}

pub fn write_csv<I, W: Write>(records: &[ItemRecord<I>], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(RecordRow::from(record))
            .context("Unable to write CSV record")?;
    }
    wtr.flush().context("Unable to flush CSV output")?;
    Ok(())
}
