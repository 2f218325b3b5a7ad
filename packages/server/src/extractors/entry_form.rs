use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::entry::{AttachmentKind, EntryForm, FormFields, PendingFile};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Entry add/update input, accepted as `multipart/form-data` (with files) or
/// as a JSON object using the same field names.
///
/// The whole request is validated before the handler runs, so a rejected
/// request never reaches the blob store.
pub struct EntryInput(pub EntryForm);

impl<S> FromRequest<S> for EntryInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let form = if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            read_multipart(multipart).await?
        } else {
            let AppJson(body) = AppJson::<Map<String, Value>>::from_request(req, state).await?;
            read_json(body)?
        };
        Ok(EntryInput(form))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<EntryForm, AppError> {
    let mut fields = FormFields::default();
    let mut media = Vec::new();
    let mut infographics = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let base = name.strip_suffix("[]").unwrap_or(&name);

        let kind = if base == AttachmentKind::Media.file_field() {
            Some(AttachmentKind::Media)
        } else if base == AttachmentKind::Infographic.file_field() {
            Some(AttachmentKind::Infographic)
        } else {
            None
        };

        match kind {
            Some(kind) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let declared = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read {base}: {e}")))?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let file = PendingFile {
                    content_type: detect_mime(&bytes, &file_name, declared.as_deref()),
                    file_name,
                    bytes: bytes.to_vec(),
                };
                match kind {
                    AttachmentKind::Media => media.push(file),
                    AttachmentKind::Infographic => infographics.push(file),
                }
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read {base}: {e}")))?;
                fields.push(&name, text);
            }
        }
    }

    EntryForm::parse(&fields, media, infographics)
}

fn read_json(body: Map<String, Value>) -> Result<EntryForm, AppError> {
    let mut fields = FormFields::default();
    for (name, value) in body {
        match value {
            Value::Null => {}
            // An array description is re-encoded so both transports share one decoder.
            Value::Array(items) if name == "description" => {
                fields.push(&name, Value::Array(items).to_string());
            }
            Value::Array(items) => {
                for item in items {
                    fields.push(&name, scalar_text(item));
                }
            }
            other => fields.push(&name, scalar_text(other)),
        }
    }
    EntryForm::parse(&fields, Vec::new(), Vec::new())
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// MIME type sniffed from the content, then guessed from the file name, then
/// the declared part type.
fn detect_mime(bytes: &[u8], file_name: &str, declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.essence_str().to_string())
        .or_else(|| declared.map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}
