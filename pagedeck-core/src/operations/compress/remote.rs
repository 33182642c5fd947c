use super::{CompressionInput, CompressionStrategy};
use crate::error::{PageDeckError, Result};
use crate::page::PageId;
use crate::progress::{report, ProgressCallback};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Posts the merged document to the compression endpoint.
///
/// The request carries three multipart fields: `file` (the merged PDF),
/// `rotations` (JSON object of page id to degrees) and `pageOrder` (JSON
/// array of page ids). No client-side timeout is applied.
pub struct RemoteCompression {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl RemoteCompression {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pagedeck/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<std::time::Duration>)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(input: &CompressionInput<'_>) -> Result<Form> {
        let order: Vec<&PageId> = input.pages.iter().map(|page| &page.id).collect();
        let file = Part::bytes(input.merged.to_vec())
            .file_name("merged.pdf")
            .mime_str("application/pdf")?;

        Ok(Form::new()
            .part("file", file)
            .text("rotations", input.rotations.to_json()?)
            .text("pageOrder", serde_json::to_string(&order)?))
    }
}

impl CompressionStrategy for RemoteCompression {
    fn name(&self) -> &'static str {
        "server"
    }

    fn compress(&self, input: &CompressionInput<'_>, progress: &dyn ProgressCallback) -> Result<Vec<u8>> {
        if input.merged.is_empty() {
            return Err(PageDeckError::NoPagesToProcess);
        }

        report(progress, 10.0, "Uploading document");
        debug!("POST {} ({} bytes)", self.endpoint, input.merged.len());
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(Self::form(input)?)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(PageDeckError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        report(progress, 90.0, "Downloading result");
        let bytes = response.bytes()?.to_vec();
        report(progress, 100.0, "Compression complete");
        info!("Server compression returned {} bytes", bytes.len());
        Ok(bytes)
    }
}
