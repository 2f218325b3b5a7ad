use std::collections::HashMap;

use common::storage::{BlobCategory, MediaKind};

use crate::error::AppError;
use crate::models::shared::{parse_description, parse_position};

/// Text fields of an entry form, keyed by field name.
///
/// Repeated fields keep every value in arrival order. A trailing `[]` on the
/// name is stripped so `mediaXPositions[]` and `mediaXPositions` are the same
/// field.
#[derive(Debug, Default, Clone)]
pub struct FormFields {
    values: HashMap<String, Vec<String>>,
}

impl FormFields {
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        let name = name.strip_suffix("[]").unwrap_or(name);
        self.values
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    /// Last value of a scalar field.
    pub fn one(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    /// Every value of an array field. `None` when the field never appeared.
    pub fn many(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }
}

/// An uploaded file that has been read into memory but not stored yet.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A file paired with the coordinates it will be placed at.
#[derive(Debug, Clone)]
pub struct PlacedFile {
    pub file: PendingFile,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Media,
    Infographic,
}

impl AttachmentKind {
    /// Multipart field carrying files of this kind.
    pub fn file_field(self) -> &'static str {
        match self {
            AttachmentKind::Media => "media",
            AttachmentKind::Infographic => "infographic",
        }
    }

    fn x_field(self) -> &'static str {
        match self {
            AttachmentKind::Media => "mediaXPositions",
            AttachmentKind::Infographic => "infographicXPositions",
        }
    }

    fn y_field(self) -> &'static str {
        match self {
            AttachmentKind::Media => "mediaYPositions",
            AttachmentKind::Infographic => "infographicYPositions",
        }
    }

    pub fn category(self) -> BlobCategory {
        match self {
            AttachmentKind::Media => BlobCategory::Media,
            AttachmentKind::Infographic => BlobCategory::Infographics,
        }
    }

    /// Media takes images and videos; infographics take images only.
    pub fn accepts(self, mime_type: &str) -> bool {
        match (self, MediaKind::classify(mime_type)) {
            (AttachmentKind::Media, Some(_)) => true,
            (AttachmentKind::Infographic, Some(MediaKind::Image)) => true,
            _ => false,
        }
    }

    fn unsupported_message(self, mime_type: &str) -> String {
        format!("Unsupported {} file type: {mime_type}.", self.file_field())
    }

    fn unpaired_message(self) -> String {
        format!(
            "Each {} file must have corresponding xPosition and yPosition.",
            self.file_field()
        )
    }

    fn bad_positions_message(self) -> String {
        format!("Invalid {} positions provided.", self.file_field())
    }
}

/// What an entry request asks to happen to one attachment list.
#[derive(Debug, Clone)]
pub enum AttachmentChange {
    /// Neither files nor positions supplied.
    Keep,
    /// Positions only; applied in place without blob I/O.
    Reposition(Vec<(f64, f64)>),
    /// New files; the old list is replaced wholesale.
    Replace(Vec<PlacedFile>),
}

impl AttachmentChange {
    /// Pair files with their positions by index.
    ///
    /// Every file needs exactly one x and one y and a type this kind accepts;
    /// any mismatch rejects the whole list before anything is uploaded.
    pub fn from_parts(
        kind: AttachmentKind,
        files: Vec<PendingFile>,
        xs: Vec<f64>,
        ys: Vec<f64>,
    ) -> Result<Self, AppError> {
        if !files.is_empty() {
            if xs.len() != files.len() || ys.len() != files.len() {
                return Err(AppError::Validation(kind.unpaired_message()));
            }
            if let Some(file) = files.iter().find(|f| !kind.accepts(&f.content_type)) {
                return Err(AppError::Validation(
                    kind.unsupported_message(&file.content_type),
                ));
            }
            let placed = files
                .into_iter()
                .zip(xs.into_iter().zip(ys))
                .map(|(file, (x, y))| PlacedFile { file, x, y })
                .collect();
            return Ok(AttachmentChange::Replace(placed));
        }

        if xs.is_empty() && ys.is_empty() {
            return Ok(AttachmentChange::Keep);
        }
        if xs.len() != ys.len() {
            return Err(AppError::Validation(kind.bad_positions_message()));
        }
        Ok(AttachmentChange::Reposition(xs.into_iter().zip(ys).collect()))
    }

    /// Reject a positions-only change whose length differs from the number of
    /// attachments it would move.
    pub fn check_against(&self, kind: AttachmentKind, current: usize) -> Result<(), AppError> {
        match self {
            AttachmentChange::Reposition(positions) if positions.len() != current => {
                Err(AppError::Validation(kind.bad_positions_message()))
            }
            _ => Ok(()),
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            AttachmentChange::Replace(files) => files.len(),
            _ => 0,
        }
    }
}

/// A validated entry add/update request.
#[derive(Debug, Clone)]
pub struct EntryForm {
    pub title: Option<String>,
    /// `None` leaves the stored description unchanged.
    pub description: Option<Vec<String>>,
    pub x_position: Option<f64>,
    pub y_position: Option<f64>,
    pub media: AttachmentChange,
    pub infographics: AttachmentChange,
}

impl EntryForm {
    /// Validate raw form input. Nothing is uploaded or stored here.
    pub fn parse(
        fields: &FormFields,
        media: Vec<PendingFile>,
        infographics: Vec<PendingFile>,
    ) -> Result<Self, AppError> {
        let description = match fields.one("description") {
            Some(text) => parse_description(text)?,
            None => None,
        };

        Ok(Self {
            title: fields.one("title").map(str::to_string),
            description,
            x_position: optional(fields, "xPosition")?,
            y_position: optional(fields, "yPosition")?,
            media: change(fields, AttachmentKind::Media, media)?,
            infographics: change(fields, AttachmentKind::Infographic, infographics)?,
        })
    }

    pub fn upload_count(&self) -> usize {
        self.media.file_count() + self.infographics.file_count()
    }
}

fn optional(fields: &FormFields, name: &str) -> Result<Option<f64>, AppError> {
    fields
        .one(name)
        .map(|text| parse_position(name, text))
        .transpose()
}

fn positions(fields: &FormFields, name: &str) -> Result<Vec<f64>, AppError> {
    fields
        .many(name)
        .unwrap_or_default()
        .iter()
        .map(|text| parse_position(name, text))
        .collect()
}

fn change(
    fields: &FormFields,
    kind: AttachmentKind,
    files: Vec<PendingFile>,
) -> Result<AttachmentChange, AppError> {
    let xs = positions(fields, kind.x_field())?;
    let ys = positions(fields, kind.y_field())?;
    AttachmentChange::from_parts(kind, files, xs, ys)
}
