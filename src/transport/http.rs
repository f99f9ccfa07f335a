//! HTTP transport: `POST {api_base}/convert?output_format=…` with a multipart body.
//!
//! Every file becomes one part under the repeated field name `files`,
//! carrying its raw bytes, original filename and guessed content type.
//!
//! Response bodies are always read as raw bytes, whatever the status. A 2xx
//! body is the converted document. A non-2xx body is the service's JSON
//! error document, but it is passed along undecoded so that
//! [`crate::interpret`] stays the only place that knows its shape.

use super::{ConversionRequest, ConversionTransport, TransportError, TransportResult};
use crate::config::ClientConfig;
use crate::error::DocLensError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Multipart field name the service reads uploads from.
pub const FILES_FIELD: &str = "files";

/// Health-check answer from `GET {api_base}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceStatus {
    pub message: String,
}

/// reqwest-backed [`ConversionTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_base: String,
    convert_url: String,
    request_timeout_secs: u64,
    connect_timeout_secs: u64,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, DocLensError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DocLensError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            convert_url: config.convert_url(),
            request_timeout_secs: config.request_timeout_secs,
            connect_timeout_secs: config.connect_timeout_secs,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Ask the service whether it is up.
    pub async fn ping(&self) -> Result<ServiceStatus, TransportError> {
        let url = format!("{}/", self.api_base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.network_error(&e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.network_error(&e))?;

        if !status.is_success() {
            return Err(TransportError::http(status.as_u16(), Some(body)));
        }

        serde_json::from_slice(&body).map_err(|e| {
            TransportError::http(status.as_u16(), None)
                .with_message(format!("Unexpected health-check response: {e}"))
        })
    }

    fn build_form(request: &ConversionRequest) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for file in &request.files {
            let body = reqwest::Body::from(file.content().clone());
            let part = Part::stream_with_length(body, file.byte_size())
                .file_name(file.name().to_string())
                .mime_str(file.content_type())
                .map_err(|e| {
                    TransportError::network(format!(
                        "Invalid content type '{}' for {}: {e}",
                        file.content_type(),
                        file.name()
                    ))
                })?;
            form = form.part(FILES_FIELD, part);
        }
        Ok(form)
    }

    fn network_error(&self, e: &reqwest::Error) -> TransportError {
        let message = self.describe_failure(e.is_connect(), e.is_timeout(), &e.to_string());
        TransportError::network(message)
    }

    /// A connect failure is reported before a timeout: reqwest flags a
    /// connect timeout as both, and its limit is the connect timeout.
    fn describe_failure(&self, connect: bool, timeout: bool, detail: &str) -> String {
        match (connect, timeout) {
            (true, true) => format!(
                "Could not connect to the conversion service at {} within {}s",
                self.api_base, self.connect_timeout_secs
            ),
            (true, false) => format!(
                "Could not connect to the conversion service at {}",
                self.api_base
            ),
            (false, true) => format!("Request timed out after {}s", self.request_timeout_secs),
            (false, false) => detail.to_string(),
        }
    }
}

#[async_trait]
impl ConversionTransport for HttpTransport {
    async fn send(&self, request: &ConversionRequest) -> TransportResult {
        let url = &self.convert_url;
        let form = Self::build_form(request)?;

        info!(
            "POST {} ({} files, {} bytes, output_format={})",
            url,
            request.files.len(),
            request.total_size(),
            request.format.wire_value()
        );

        let response = self
            .client
            .post(url)
            .query(&[("output_format", request.format.wire_value())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("Conversion request failed before a response: {}", e);
                self.network_error(&e)
            })?;

        let status = response.status();
        debug!("Response status {}", status);

        match response.bytes().await {
            Ok(body) if status.is_success() => {
                info!("Received {} bytes", body.len());
                Ok(body)
            }
            Ok(body) => {
                warn!("Service answered HTTP {} ({} byte body)", status, body.len());
                Err(TransportError::http(status.as_u16(), Some(body)))
            }
            Err(e) if status.is_success() => Err(self.network_error(&e)),
            Err(e) => {
                warn!("HTTP {} and the body could not be read: {}", status, e);
                Err(TransportError::http(status.as_u16(), None).with_message(e.to_string()))
            }
        }
    }
}
