//! Link post-processing of finished documents
//!
//! A merged or compressed document can be handed to an external service that
//! restores its hyperlinks. The step is best effort: when the service fails
//! the document is kept exactly as it was.

use crate::error::{PageDeckError, Result};
use crate::operations::compress::CompressionPreset;
use crate::rotation::RotationMap;
use reqwest::blocking::multipart::{Form, Part};
use tracing::{debug, warn};

/// What the post-processor is told about the document it receives.
#[derive(Debug, Clone, Copy)]
pub struct PostProcessRequest<'a> {
    /// Whether the document is on its way to (or out of) compression
    pub compress: bool,
    pub preset: CompressionPreset,
    pub rotations: &'a RotationMap,
}

pub trait DocumentPostProcessor {
    fn name(&self) -> &'static str;

    fn process(&self, pdf: &[u8], request: &PostProcessRequest<'_>) -> Result<Vec<u8>>;
}

/// Run `processor`, keeping `pdf` unchanged when it fails.
pub fn process_or_keep(
    processor: &dyn DocumentPostProcessor,
    pdf: Vec<u8>,
    request: &PostProcessRequest<'_>,
) -> Vec<u8> {
    match processor.process(&pdf, request) {
        Ok(processed) if !processed.is_empty() => {
            debug!("{} post-processing: {} -> {} bytes", processor.name(), pdf.len(), processed.len());
            processed
        }
        Ok(_) => {
            warn!("{} post-processing returned an empty document, keeping the original", processor.name());
            pdf
        }
        Err(e) => {
            warn!("{} post-processing failed, keeping the original: {}", processor.name(), e);
            pdf
        }
    }
}

/// Posts documents to a hyperlink-processing endpoint.
///
/// Multipart fields: `file`, `compress` (`true`/`false`),
/// `compression_level` (1 to 3) and `rotations` (JSON).
pub struct HyperlinkService {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HyperlinkService {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pagedeck/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn form(pdf: &[u8], request: &PostProcessRequest<'_>) -> Result<Form> {
        let file = Part::bytes(pdf.to_vec())
            .file_name("document.pdf")
            .mime_str("application/pdf")?;

        Ok(Form::new()
            .part("file", file)
            .text("compress", request.compress.to_string())
            .text("compression_level", request.preset.level().to_string())
            .text("rotations", request.rotations.to_json()?))
    }
}

impl DocumentPostProcessor for HyperlinkService {
    fn name(&self) -> &'static str {
        "hyperlinks"
    }

    fn process(&self, pdf: &[u8], request: &PostProcessRequest<'_>) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(Self::form(pdf, request)?)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageDeckError::Remote {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    struct Stamp;

    impl DocumentPostProcessor for Stamp {
        fn name(&self) -> &'static str {
            "stamp"
        }

        fn process(&self, pdf: &[u8], request: &PostProcessRequest<'_>) -> Result<Vec<u8>> {
            let mut out = pdf.to_vec();
            out.extend_from_slice(if request.compress { b"+c" } else { b"+m" });
            Ok(out)
        }
    }

    struct Failing;

    impl DocumentPostProcessor for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn process(&self, _pdf: &[u8], _request: &PostProcessRequest<'_>) -> Result<Vec<u8>> {
            Err(PageDeckError::Remote {
                status: 500,
                message: "Failed to process hyperlinks".to_string(),
            })
        }
    }

    fn request(rotations: &RotationMap, compress: bool) -> PostProcessRequest<'_> {
        PostProcessRequest {
            compress,
            preset: CompressionPreset::Medium,
            rotations,
        }
    }

    /// Serves one request with `status` and `body`, returning what it received.
    fn one_shot_server(status: &'static str, body: &'static [u8]) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/hyperlinks", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = stream.read(&mut buf).unwrap();
                received.extend_from_slice(&buf[..n]);
                if n == 0 || ends_multipart(&received) {
                    break;
                }
            }
            let head = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len());
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
            String::from_utf8_lossy(&received).into_owned()
        });
        (url, handle)
    }

    /// A multipart body ends with the closing boundary, a chunked one with an empty chunk.
    fn ends_multipart(received: &[u8]) -> bool {
        received.ends_with(b"--\r\n") || received.ends_with(b"\r\n0\r\n\r\n")
    }

    #[test]
    fn test_processed_bytes_replace_document() {
        let rotations = RotationMap::new();
        let out = process_or_keep(&Stamp, b"%PDF".to_vec(), &request(&rotations, false));
        assert_eq!(out, b"%PDF+m".to_vec());
    }

    #[test]
    fn test_failure_keeps_document() {
        let rotations = RotationMap::new();
        let out = process_or_keep(&Failing, b"%PDF".to_vec(), &request(&rotations, true));
        assert_eq!(out, b"%PDF".to_vec());
    }

    #[test]
    fn test_service_posts_form_fields() {
        let (url, server) = one_shot_server("200 OK", b"%PDF-linked");
        let service = HyperlinkService::new(url).unwrap();
        let rotations = RotationMap::new();

        let out = service.process(b"%PDF-1.5", &request(&rotations, true)).unwrap();
        assert_eq!(out, b"%PDF-linked".to_vec());

        let received = server.join().unwrap();
        assert!(received.starts_with("POST /api/hyperlinks HTTP/1.1"));
        assert!(received.contains("name=\"compress\"\r\n\r\ntrue"));
        assert!(received.contains("name=\"compression_level\"\r\n\r\n2"));
        assert!(received.contains("filename=\"document.pdf\""));
    }

    #[test]
    fn test_service_error_status_keeps_document() {
        let (url, server) = one_shot_server("500 Internal Server Error", b"{\"error\":\"down\"}");
        let service = HyperlinkService::new(url).unwrap();
        let rotations = RotationMap::new();

        let out = process_or_keep(&service, b"%PDF-1.5".to_vec(), &request(&rotations, false));
        assert_eq!(out, b"%PDF-1.5".to_vec());
        server.join().unwrap();
    }
}
