//! Multipart form bodies for file-bearing endpoints.
//!
//! Fields whose value is absent are left out entirely rather than sent
//! empty, so a partial profile update never blanks fields on the server.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::error::ApiError;

/// An in-memory file attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type, if known.
    pub mime: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Create an attachment with no declared MIME type.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes,
        }
    }

    /// Declare the MIME type.
    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read an attachment from disk, guessing the MIME type of common image
    /// formats from the extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        let mime = path
            .extension()
            .and_then(|ext| image_mime(&ext.to_string_lossy()))
            .map(str::to_owned);
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn image_mime(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum Field {
    Text(String),
    File(FilePart),
}

/// Builder for a multipart request body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: Vec<(String, Field)>,
}

impl MultipartForm {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), Field::Text(value.into())));
        self
    }

    /// Add a text field when `value` is present and not blank.
    #[must_use]
    pub fn optional_text(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value.map(Into::into) {
            Some(value) if !value.trim().is_empty() => self.text(name, value),
            _ => self,
        }
    }

    /// Add a field holding `value` encoded as JSON, when present.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if `value` cannot be serialised.
    pub fn optional_json<T: Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        value: Option<&T>,
    ) -> Result<Self, ApiError> {
        match value {
            Some(value) => Ok(self.text(name, serde_json::to_string(value)?)),
            None => Ok(self),
        }
    }

    /// Add a file field when present.
    #[must_use]
    pub fn optional_file(mut self, name: impl Into<String>, file: Option<FilePart>) -> Self {
        if let Some(file) = file {
            self.fields.push((name.into(), Field::File(file)));
        }
        self
    }

    /// Names of the fields that will be sent, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Value of a text field.
    #[must_use]
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(field, value)| match value {
            Field::Text(text) if field == name => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether no field was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_form(self) -> Result<Form, ApiError> {
        self.fields
            .into_iter()
            .try_fold(Form::new(), |form, (name, field)| match field {
                Field::Text(text) => Ok(form.text(name, text)),
                Field::File(file) => {
                    let mut part = Part::bytes(file.bytes).file_name(file.file_name);
                    if let Some(mime) = file.mime {
                        part = part.mime_str(&mime).map_err(|e| {
                            ApiError::InvalidRequest(format!("invalid MIME type {mime:?}: {e}"))
                        })?;
                    }
                    Ok(form.part(name, part))
                }
            })
    }
}
