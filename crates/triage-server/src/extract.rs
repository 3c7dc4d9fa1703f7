//! Request extractors for form and multipart payloads.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use axum::extract::multipart::Field;
use tracing::debug;
use triage_core::AgentError;
use triage_models::AudioHint;

use crate::dto::TextFields;
use crate::error::AppError;

/// A file read out of a multipart body.
#[derive(Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl Upload {
    async fn read(field: Field<'_>) -> Result<Self, AgentError> {
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AgentError::invalid_input(format!("could not read upload: {e}")))?;
        Ok(Self {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        })
    }

    /// Splits off the container hint used by the audio decoder.
    pub fn into_audio(self) -> (Vec<u8>, AudioHint) {
        let hint = AudioHint {
            content_type: self.content_type,
            file_name: self.file_name,
        };
        (self.bytes, hint)
    }
}

/// Reads the uploaded file from a multipart body.
///
/// Prefers the field named `file`; otherwise the first field that carries a
/// filename is used.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, AgentError> {
    let mut fallback = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AgentError::invalid_input(format!("malformed multipart body: {e}")))?
    {
        let is_file_field = field.name() == Some("file");
        if !is_file_field && (field.file_name().is_none() || fallback.is_some()) {
            continue;
        }

        let upload = Upload::read(field).await?;
        if is_file_field {
            return Ok(upload);
        }
        fallback = Some(upload);
    }

    fallback.ok_or_else(|| AgentError::invalid_input("missing file upload field 'file'"))
}

/// Body of a text prediction request.
///
/// Accepts `multipart/form-data`, `application/x-www-form-urlencoded`, or a
/// JSON object. `temperature`, `location`, and `image` are accepted for
/// client compatibility and not used.
#[derive(Debug)]
pub struct TextSubmission {
    pub text: String,
    pub temperature: Option<String>,
    pub location: Option<String>,
    pub image: Option<Upload>,
}

fn invalid(e: impl std::fmt::Display) -> AppError {
    AppError::Text(AgentError::invalid_input(e.to_string()))
}

impl<S> FromRequest<S> for TextSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let (fields, image) = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(invalid)?;
            read_text_multipart(multipart).await.map_err(AppError::Text)?
        } else if content_type.starts_with("application/json") {
            let Json(fields) = Json::<TextFields>::from_request(req, state).await.map_err(invalid)?;
            (fields, None)
        } else {
            let Form(fields) = Form::<TextFields>::from_request(req, state).await.map_err(invalid)?;
            (fields, None)
        };

        let text = fields
            .text
            .ok_or_else(|| invalid("missing required field 'text'"))?;

        Ok(Self {
            text,
            temperature: fields.temperature,
            location: fields.location,
            image,
        })
    }
}

async fn read_text_multipart(
    mut multipart: Multipart,
) -> Result<(TextFields, Option<Upload>), AgentError> {
    let mut fields = TextFields::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AgentError::invalid_input(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let slot = match name.as_str() {
            "text" => &mut fields.text,
            "temperature" => &mut fields.temperature,
            "location" => &mut fields.location,
            "image" => {
                image = Some(Upload::read(field).await?);
                continue;
            }
            other => {
                debug!(field = other, "ignoring unknown form field");
                continue;
            }
        };
        let value = field
            .text()
            .await
            .map_err(|e| AgentError::invalid_input(format!("could not read field '{name}': {e}")))?;
        *slot = Some(value);
    }

    Ok((fields, image))
}
