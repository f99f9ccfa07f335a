//! Configuration types for the DocLens client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The output format a conversion asks for is the
//! closed [`OutputFormat`] enum defined alongside it.

use crate::error::DocLensError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable holding the conversion service base URL.
pub const API_URL_ENV: &str = "DOCLENS_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "DOCLENS_TIMEOUT_SECS";

/// Base URL used when nothing else is configured: a service on localhost.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Configuration for a DocLens client.
///
/// Built via [`ClientConfig::builder()`], [`ClientConfig::from_env()`] or
/// [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use doclens_client::{ClientConfig, OutputFormat};
///
/// let config = ClientConfig::builder()
///     .api_base("https://doclens.example.com/")
///     .request_timeout_secs(300)
///     .default_format(OutputFormat::Pdf)
///     .build()
///     .unwrap();
/// assert_eq!(config.api_base, "https://doclens.example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the conversion service, without a trailing slash.
    /// Default: `http://localhost:8000`.
    pub api_base: String,

    /// Whole-request timeout in seconds. Default: 600.
    ///
    /// The service OCRs every page and runs a language model over the text
    /// before answering, so a multi-page PDF can legitimately take minutes.
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Format selected when a controller is created. Default: [`OutputFormat::Word`].
    pub default_format: OutputFormat,

    /// Directory downloads are saved into when the caller does not name one.
    /// Default: the current directory.
    pub download_dir: PathBuf,

    /// Value sent as the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 600,
            connect_timeout_secs: 10,
            default_format: OutputFormat::default(),
            download_dir: PathBuf::from("."),
            user_agent: concat!("doclens-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("default_format", &self.default_format)
            .field("download_dir", &self.download_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from `DOCLENS_API_URL` and `DOCLENS_TIMEOUT_SECS`,
    /// falling back to the defaults for anything unset or empty.
    pub fn from_env() -> Result<Self, DocLensError> {
        let mut builder = Self::builder();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                builder = builder.api_base(url);
            }
        }

        if let Ok(secs) = std::env::var(TIMEOUT_ENV) {
            if !secs.trim().is_empty() {
                let secs: u64 = secs.trim().parse().map_err(|_| {
                    DocLensError::InvalidConfig(format!(
                        "{TIMEOUT_ENV} must be a whole number of seconds, got '{secs}'"
                    ))
                })?;
                builder = builder.request_timeout_secs(secs);
            }
        }

        builder.build()
    }

    /// Full URL of the conversion endpoint (without the query string).
    pub fn convert_url(&self) -> String {
        format!("{}/convert", self.api_base)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn default_format(mut self, format: OutputFormat) -> Self {
        self.config.default_format = format;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, DocLensError> {
        let c = &self.config;
        if !(c.api_base.starts_with("http://") || c.api_base.starts_with("https://")) {
            return Err(DocLensError::InvalidConfig(format!(
                "API base must be an http:// or https:// URL, got '{}'",
                c.api_base
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(DocLensError::InvalidConfig(
                "Request timeout must be ≥ 1s".into(),
            ));
        }
        if c.connect_timeout_secs == 0 {
            return Err(DocLensError::InvalidConfig(
                "Connect timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Document format the service is asked to produce.
///
/// | Variant | Wire value | Extension |
/// |---------|-----------|-----------|
/// | `Word` | `docx` | `.docx` (default) |
/// | `Pdf` | `pdf` | `.pdf` |
/// | `PlainText` | `txt` | `.txt` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Microsoft Word document. (default)
    #[default]
    #[serde(rename = "docx")]
    Word,
    /// Portable Document Format.
    Pdf,
    /// UTF-8 plain text with light Markdown-style headings.
    #[serde(rename = "txt")]
    PlainText,
}

impl OutputFormat {
    /// Value of the `output_format` query parameter.
    pub fn wire_value(self) -> &'static str {
        match self {
            OutputFormat::Word => "docx",
            OutputFormat::Pdf => "pdf",
            OutputFormat::PlainText => "txt",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Word => ".docx",
            OutputFormat::Pdf => ".pdf",
            OutputFormat::PlainText => ".txt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Word => "Word (.docx)",
            OutputFormat::Pdf => "PDF (.pdf)",
            OutputFormat::PlainText => "Plain text (.txt)",
        }
    }

    /// Content type the service answers with for this format.
    pub fn media_type(self) -> &'static str {
        match self {
            OutputFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::PlainText => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = DocLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "docx" | "word" => Ok(OutputFormat::Word),
            "pdf" => Ok(OutputFormat::Pdf),
            "txt" | "text" | "plain" => Ok(OutputFormat::PlainText),
            other => Err(DocLensError::InvalidConfig(format!(
                "Unknown output format '{other}' (expected docx, pdf or txt)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.api_base, "http://localhost:8000");
        assert_eq!(c.default_format, OutputFormat::Word);
        assert_eq!(c.convert_url(), "http://localhost:8000/convert");
    }

    #[test]
    fn builder_trims_trailing_slashes() {
        let c = ClientConfig::builder()
            .api_base("https://api.example.com///")
            .build()
            .unwrap();
        assert_eq!(c.api_base, "https://api.example.com");
    }

    #[test]
    fn builder_rejects_non_http_base() {
        let err = ClientConfig::builder()
            .api_base("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, DocLensError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ClientConfig::builder()
            .request_timeout_secs(0)
            .build()
            .is_err());
        assert!(ClientConfig::builder()
            .connect_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn format_attributes() {
        assert_eq!(OutputFormat::Word.wire_value(), "docx");
        assert_eq!(OutputFormat::Pdf.extension(), ".pdf");
        assert_eq!(OutputFormat::PlainText.extension(), ".txt");
        assert_eq!(OutputFormat::PlainText.label(), "Plain text (.txt)");
        assert!(OutputFormat::Word.media_type().contains("wordprocessingml"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("docx".parse::<OutputFormat>().unwrap(), OutputFormat::Word);
        assert_eq!("Word".parse::<OutputFormat>().unwrap(), OutputFormat::Word);
        assert_eq!(".PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::PlainText);
        assert!("rtf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn format_serde_uses_wire_values() {
        let json = serde_json::to_string(&OutputFormat::PlainText).unwrap();
        assert_eq!(json, "\"txt\"");
        let back: OutputFormat = serde_json::from_str("\"docx\"").unwrap();
        assert_eq!(back, OutputFormat::Word);
    }
}
