use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use reqwest::multipart;

use crate::{NexrayError, Result};

/// Value of one multipart form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    /// Plain text field.
    Text(String),
    /// In-memory file content.
    Bytes {
        data: Vec<u8>,
        /// File name announced for the part; `nexray-<unix millis>.jpg` when absent.
        file_name: Option<String>,
    },
    /// File read from disk when the request is sent.
    File(PathBuf),
}

impl FormValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn bytes(data: impl Into<Vec<u8>>, file_name: impl Into<String>) -> Self {
        Self::Bytes {
            data: data.into(),
            file_name: Some(file_name.into()),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    fn is_upload(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for FormValue {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes {
            data,
            file_name: None,
        }
    }
}

/// Multipart form body. Fields given without a value are left out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(String, FormValue)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field; `None` values are skipped.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Option<FormValue>>) -> Self {
        if let Some(value) = value.into() {
            self.fields.push((name.into(), value));
        }
        self
    }

    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, FormValue::Text(value.into()))
    }

    pub fn bytes(
        self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
    ) -> Self {
        self.field(name, FormValue::bytes(data, file_name))
    }

    pub fn file(self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.field(name, FormValue::file(path))
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any field carries file content.
    pub fn has_uploads(&self) -> bool {
        self.fields.iter().any(|(_, value)| value.is_upload())
    }

    /// Builds a fresh `reqwest` form. Called once per attempt since
    /// multipart bodies cannot be cloned.
    pub(crate) async fn to_multipart(&self) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for (name, value) in &self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name.clone(), text.clone()),
                FormValue::Bytes { data, file_name } => {
                    let file_name = file_name.clone().unwrap_or_else(generated_upload_name);
                    form.part(
                        name.clone(),
                        multipart::Part::bytes(data.clone()).file_name(file_name),
                    )
                }
                FormValue::File(path) => {
                    let data = tokio::fs::read(path)
                        .await
                        .map_err(|source| NexrayError::Io {
                            path: path.clone(),
                            source,
                        })?;
                    let file_name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(generated_upload_name);
                    form.part(
                        name.clone(),
                        multipart::Part::bytes(data).file_name(file_name),
                    )
                }
            };
        }
        Ok(form)
    }
}

/// Name given to in-memory uploads without one.
fn generated_upload_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("nexray-{millis}.jpg")
}

impl<K, V> FromIterator<(K, Option<V>)> for Form
where
    K: Into<String>,
    V: Into<FormValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |form, (name, value)| {
            form.field(name, value.map(Into::into))
        })
    }
}
