//! Cloud OCR: Tencent Cloud `GeneralAccurateOCR`.
//!
//! The image is sent base64-encoded in a JSON body and the response's
//! `TextDetections` fragments are concatenated in order. Requests are signed
//! with TC3-HMAC-SHA256 using the secret id/key from
//! `TENCENTCLOUD_SECRET_ID` / `TENCENTCLOUD_SECRET_KEY`.
//!
//! Every failure (missing credentials, transport error, service error code)
//! is returned as a [`FileError`] for that one image; there is exactly one
//! attempt per image.

use crate::error::{Doc2CsvError, FileError};
use crate::pipeline::ocr::TextRecognizer;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "ocr";
const ACTION: &str = "GeneralAccurateOCR";
const API_VERSION: &str = "2018-11-19";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Environment variable holding the secret id.
pub const SECRET_ID_VAR: &str = "TENCENTCLOUD_SECRET_ID";
/// Environment variable holding the secret key.
pub const SECRET_KEY_VAR: &str = "TENCENTCLOUD_SECRET_KEY";

/// API key pair for the cloud service.
#[derive(Clone)]
pub struct CloudCredentials {
    pub secret_id: String,
    pub secret_key: String,
}

impl CloudCredentials {
    /// Read both variables; `None` if either is unset or empty.
    pub fn from_env() -> Option<Self> {
        let secret_id = std::env::var(SECRET_ID_VAR).ok().filter(|s| !s.is_empty())?;
        let secret_key = std::env::var(SECRET_KEY_VAR).ok().filter(|s| !s.is_empty())?;
        Some(Self {
            secret_id,
            secret_key,
        })
    }
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OcrRequest<'a> {
    #[serde(rename = "ImageBase64")]
    image_base64: &'a str,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: OcrResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    text_detections: Option<Vec<TextDetection>>,
    #[serde(default)]
    error: Option<ServiceError>,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextDetection {
    #[serde(default)]
    detected_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceError {
    code: String,
    message: String,
}

// ── Recogniser ───────────────────────────────────────────────────────────

/// Tencent Cloud OCR client.
pub struct CloudRecognizer {
    client: reqwest::Client,
    endpoint: String,
    region: String,
    credentials: Option<CloudCredentials>,
}

impl CloudRecognizer {
    /// Build the client. Missing credentials are not an error here; each
    /// image fails with [`FileError::MissingCredentials`] instead.
    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        credentials: Option<CloudCredentials>,
        timeout_secs: u64,
    ) -> Result<Self, Doc2CsvError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Doc2CsvError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            region: region.into(),
            credentials,
        })
    }

    async fn call(
        &self,
        image: &Path,
        credentials: &CloudCredentials,
        payload: String,
    ) -> Result<String, FileError> {
        let request_failed = |detail: String| FileError::RequestFailed {
            path: image.to_path_buf(),
            detail,
        };

        let timestamp = chrono::Utc::now().timestamp();
        let authorization = tc3_authorization(credentials, &self.endpoint, &payload, timestamp);

        let response = self
            .client
            .post(format!("https://{}/", self.endpoint))
            .header("Authorization", authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", &self.endpoint)
            .header("X-TC-Action", ACTION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Version", API_VERSION)
            .header("X-TC-Region", &self.region)
            .body(payload)
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;

        let status = response.status();
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| request_failed(format!("HTTP {status}: {e}")))?;

        collect_detections(image, envelope.response)
    }
}

#[async_trait]
impl TextRecognizer for CloudRecognizer {
    fn name(&self) -> &'static str {
        "tencentcloud"
    }

    async fn recognize(&self, image: &Path) -> Result<String, FileError> {
        let Some(credentials) = self.credentials.as_ref() else {
            return Err(FileError::MissingCredentials {
                path: image.to_path_buf(),
            });
        };

        let bytes = tokio::fs::read(image)
            .await
            .map_err(|e| FileError::ReadFailed {
                path: image.to_path_buf(),
                detail: e.to_string(),
            })?;
        check_payload(image, &bytes)?;

        let b64 = STANDARD.encode(&bytes);
        debug!("{}: {} bytes base64", image.display(), b64.len());
        let payload = serde_json::to_string(&OcrRequest { image_base64: &b64 }).map_err(|e| {
            FileError::RequestFailed {
                path: image.to_path_buf(),
                detail: e.to_string(),
            }
        })?;

        self.call(image, credentials, payload).await
    }
}

/// Only PNG and JPEG payloads are worth a paid request.
fn check_payload(image: &Path, bytes: &[u8]) -> Result<(), FileError> {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png | image::ImageFormat::Jpeg) => Ok(()),
        Ok(other) => Err(FileError::UnsupportedImage {
            path: image.to_path_buf(),
            detail: format!("{other:?}"),
        }),
        Err(e) => Err(FileError::UnsupportedImage {
            path: image.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

fn collect_detections(image: &Path, response: OcrResponse) -> Result<String, FileError> {
    if let Some(err) = response.error {
        return Err(FileError::ServiceError {
            path: image.to_path_buf(),
            code: err.code,
            message: err.message,
        });
    }
    debug!(
        "{}: request {}",
        image.display(),
        response.request_id.as_deref().unwrap_or("-")
    );
    Ok(response
        .text_detections
        .unwrap_or_default()
        .into_iter()
        .map(|d| d.detected_text)
        .collect())
}

// ── TC3-HMAC-SHA256 ──────────────────────────────────────────────────────

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// `Authorization` header value for a POST of `payload` to `host`.
fn tc3_authorization(
    credentials: &CloudCredentials,
    host: &str,
    payload: &str,
    timestamp: i64,
) -> String {
    let date = chrono::DateTime::<chrono::Utc>::from_timestamp(timestamp, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let signed_headers = "content-type;host";
    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{CONTENT_TYPE}\nhost:{host}\n\n{signed_headers}\n{}",
        sha256_hex(payload.as_bytes())
    );

    let scope = format!("{date}/{SERVICE}/tc3_request");
    let string_to_sign = format!(
        "TC3-HMAC-SHA256\n{timestamp}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let secret_date = hmac_sha256(
        format!("TC3{}", credentials.secret_key).as_bytes(),
        date.as_bytes(),
    );
    let secret_service = hmac_sha256(&secret_date, SERVICE.as_bytes());
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request");
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

    format!(
        "TC3-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.secret_id
    )
}
