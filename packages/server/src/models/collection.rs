use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use common::storage::MediaKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shared::optional_position;

/// The two collection families. They share one hierarchy and differ only in
/// their natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Timeline events, keyed by year.
    Timeline,
    /// Programs, keyed by title.
    Program,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Timeline, Family::Program];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Timeline => "timeline",
            Family::Program => "program",
        }
    }

    /// Human-readable singular used in response messages.
    pub fn label(self) -> &'static str {
        match self {
            Family::Timeline => "Timeline year",
            Family::Program => "Program",
        }
    }

    /// Human-readable plural used in response messages.
    pub fn plural(self) -> &'static str {
        match self {
            Family::Timeline => "timeline events",
            Family::Program => "programs",
        }
    }

    pub fn plural_title(self) -> &'static str {
        match self {
            Family::Timeline => "Timeline events",
            Family::Program => "Programs",
        }
    }

    /// Message for a create request missing one of its required fields.
    pub fn required_message(self) -> &'static str {
        match self {
            Family::Timeline => "Year, xPosition, and yPosition are required.",
            Family::Program => "Title, xPosition, and yPosition are required.",
        }
    }

    /// Parse a natural key for this family from a request value.
    ///
    /// Years accept a JSON integer or an integer string; titles are trimmed and
    /// must not be empty.
    pub fn key_from_value(self, value: &Value) -> Result<NaturalKey, AppError> {
        match self {
            Family::Timeline => {
                let year = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                year.and_then(|y| i32::try_from(y).ok())
                    .map(NaturalKey::Year)
                    .ok_or_else(|| AppError::Validation("Year must be an integer.".into()))
            }
            Family::Program => match value {
                Value::String(s) if !s.trim().is_empty() => {
                    Ok(NaturalKey::Title(s.trim().to_string()))
                }
                _ => Err(AppError::Validation(
                    "Title must be a non-empty string.".into(),
                )),
            },
        }
    }

    pub fn not_found(self) -> AppError {
        AppError::NotFound(format!("{} not found.", self.label()))
    }

    pub fn duplicate(self, key: &NaturalKey) -> AppError {
        match key {
            NaturalKey::Year(year) => AppError::Conflict(format!(
                "A timeline event for the year {year} already exists."
            )),
            NaturalKey::Title(_) => {
                AppError::Conflict("A program with this title already exists.".into())
            }
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique natural key of a collection. Titles compare case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NaturalKey {
    Year(i32),
    Title(String),
}

impl NaturalKey {
    pub fn family(&self) -> Family {
        match self {
            NaturalKey::Year(_) => Family::Timeline,
            NaturalKey::Title(_) => Family::Program,
        }
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NaturalKey::Year(a), NaturalKey::Year(b)) => a.cmp(b),
            (NaturalKey::Title(a), NaturalKey::Title(b)) => a.cmp(b),
            (NaturalKey::Year(_), NaturalKey::Title(_)) => Ordering::Less,
            (NaturalKey::Title(_), NaturalKey::Year(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NaturalKey::Year(year) => write!(f, "{year}"),
            NaturalKey::Title(title) => f.write_str(title),
        }
    }
}

fn center() -> f64 {
    50.0
}

/// A positioned image or video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub url: String,
    pub media_type: MediaKind,
    #[serde(default = "center")]
    pub x_position: f64,
    #[serde(default = "center")]
    pub y_position: f64,
}

/// A positioned infographic image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infographic {
    pub url: String,
    #[serde(default)]
    pub x_position: Option<f64>,
    #[serde(default)]
    pub y_position: Option<f64>,
}

/// A titled, positioned sub-item of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Vec<String>,
    pub x_position: f64,
    pub y_position: f64,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub infographics: Vec<Infographic>,
}

impl Entry {
    /// URLs of every blob this entry owns.
    pub fn blob_urls(&self) -> impl Iterator<Item = &str> {
        self.media
            .iter()
            .map(|m| m.url.as_str())
            .chain(self.infographics.iter().map(|i| i.url.as_str()))
    }
}

/// Top-level aggregate. A collection and its whole entry/attachment tree are
/// stored and replaced as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: Uuid,
    #[serde(flatten)]
    pub key: NaturalKey,
    pub x_position: f64,
    pub y_position: f64,
    #[serde(default)]
    pub entries: Vec<Entry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(key: NaturalKey, x_position: f64, y_position: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key,
            x_position,
            y_position,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn family(&self) -> Family {
        self.key.family()
    }

    pub fn entry_mut(&mut self, entry_id: Uuid) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == entry_id)
    }

    pub fn remove_entry(&mut self, entry_id: Uuid) -> Option<Entry> {
        let index = self.entries.iter().position(|e| e.id == entry_id)?;
        Some(self.entries.remove(index))
    }

    /// URLs of every blob owned by any entry of this collection.
    pub fn blob_urls(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(Entry::blob_urls)
            .map(str::to_string)
            .collect()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// JSON body of collection create and update requests.
///
/// Only the key field matching the route's family is read.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "optional_position")]
    pub x_position: Option<f64>,
    #[serde(default, deserialize_with = "optional_position")]
    pub y_position: Option<f64>,
}

impl CollectionRequest {
    pub fn key(&self, family: Family) -> Option<&Value> {
        match family {
            Family::Timeline => self.year.as_ref(),
            Family::Program => self.title.as_ref(),
        }
    }
}

/// Sort collections by natural key ascending.
pub fn sort_by_key(collections: &mut [Collection]) {
    collections.sort_by(|a, b| a.key.cmp(&b.key));
}
