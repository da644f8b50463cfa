use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Normalized output unit. Optional fields serialize as explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub source: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub content: String,
}

/// Everything a record carries except its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordFields {
    pub source: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub content: String,
}

impl RecordFields {
    pub fn into_record(self, ids: IdStrategy) -> Record {
        let id = ids.mint(&self);
        Record {
            id,
            source: self.source,
            url: self.url,
            title: self.title,
            author: self.author,
            date: self.date,
            content: self.content,
        }
    }
}

/// How record identifiers are minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// Fresh UUID v4 per record; identical content re-scraped gets a new id.
    #[default]
    Random,
    /// Stable id derived from `source`, `url` and `content`.
    ContentHash,
}

impl IdStrategy {
    pub fn mint(self, fields: &RecordFields) -> String {
        match self {
            IdStrategy::Random => uuid::Uuid::new_v4().to_string(),
            IdStrategy::ContentHash => content_hash(fields),
        }
    }
}

fn content_hash(fields: &RecordFields) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fields.source.as_bytes());
    hasher.update([0x1f]);
    hasher.update(fields.url.as_deref().unwrap_or_default().as_bytes());
    hasher.update([0x1f]);
    hasher.update(fields.content.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for byte in digest.iter().take(16) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
