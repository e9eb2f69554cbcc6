//! Ephemeral request descriptors.
//!
//! A request is described by value, not by a built `reqwest` request, so the
//! single retry after a token refresh can replay exactly the same
//! method/path/body. Multipart bodies are rebuilt from the descriptor for
//! the same reason.

use entrega_core::{ApiError, ApiResult};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde_json::Value;
use std::path::PathBuf;
use tokio_util::io::ReaderStream;

/// A named file attachment for a multipart request.
///
/// Path-backed parts are streamed from disk at send time; in-memory parts
/// carry their bytes. Both can be materialized more than once.
#[derive(Debug, Clone)]
pub struct FilePart {
    name: String,
    file_name: String,
    content_type: Option<String>,
    source: FileSource,
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl FilePart {
    /// Attach a file on disk; the part is streamed, not buffered.
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archivo".to_string());
        Self {
            name: name.into(),
            file_name,
            content_type: None,
            source: FileSource::Path(path),
        }
    }

    /// Attach bytes already in memory (e.g. a camera capture).
    pub fn from_bytes(
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type: None,
            source: FileSource::Bytes(bytes),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn resolved_content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or_else(|| infer_content_type(&self.file_name))
    }

    async fn to_part(&self) -> ApiResult<Part> {
        let part = match &self.source {
            FileSource::Bytes(bytes) => Part::bytes(bytes.clone()),
            FileSource::Path(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|error| {
                    ApiError::network("No se pudo leer el archivo adjunto")
                        .with_cause(format!("{}: {error}", path.display()))
                })?;
                Part::stream(Body::wrap_stream(ReaderStream::new(file)))
            }
        };
        part.file_name(self.file_name.clone())
            .mime_str(self.resolved_content_type())
            .map_err(|error| {
                ApiError::network("Tipo de contenido inválido para el archivo adjunto")
                    .with_cause(error.to_string())
            })
    }
}

fn infer_content_type(file_name: &str) -> &'static str {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// One HTTP call, described by value. Constructed per call, discarded after.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub(crate) enum RequestBody {
    Empty,
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn json(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    pub fn multipart(
        method: Method,
        path: impl Into<String>,
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Multipart { fields, files },
        }
    }
}

/// Build a fresh multipart form from descriptor parts.
pub(crate) async fn multipart_form(
    fields: &[(String, String)],
    files: &[FilePart],
) -> ApiResult<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }
    for file in files {
        form = form.part(file.name.clone(), file.to_part().await?);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_is_inferred_from_file_name() {
        assert_eq!(infer_content_type("foto.JPG"), "image/jpeg");
        assert_eq!(infer_content_type("captura.png"), "image/png");
        assert_eq!(infer_content_type("licencia.pdf"), "application/pdf");
        assert_eq!(infer_content_type("sin_extension"), "application/octet-stream");
    }

    #[test]
    fn explicit_content_type_wins() {
        let part = FilePart::from_bytes("archivo", "raro.bin", vec![1, 2, 3])
            .with_content_type("image/heic");
        assert_eq!(part.resolved_content_type(), "image/heic");
    }

    #[test]
    fn from_path_takes_file_name_from_path() {
        let part = FilePart::from_path("archivo", "/tmp/subidas/foto.png");
        assert_eq!(part.file_name(), "foto.png");
        assert_eq!(part.resolved_content_type(), "image/png");
    }

    #[tokio::test]
    async fn missing_file_surfaces_as_network_error() {
        let part = FilePart::from_path("archivo", "/no/existe/foto.png");
        let error = part.to_part().await.unwrap_err();
        assert!(error.is_network_error());
        assert!(error.cause().is_some());
    }

    #[tokio::test]
    async fn form_builds_from_fields_and_bytes() {
        let files = vec![FilePart::from_bytes("archivo", "foto.png", vec![0u8; 16])];
        let fields = vec![("tipo".to_string(), "licencia".to_string())];
        assert!(multipart_form(&fields, &files).await.is_ok());
    }
}
