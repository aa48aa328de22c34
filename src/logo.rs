//! Logo image validation
//!
//! A state-free pipeline of three ordered checks over a candidate logo file:
//! declared MIME type, byte size, and decoded pixel dimensions. Each stage
//! short-circuits on failure; the dimension stage may additionally attach
//! non-fatal warnings. SVG logos have no raster dimensions and skip the
//! decode stage entirely.

use std::fmt;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use image::ImageReader;
use serde::Serialize;
use tempfile::NamedTempFile;

/// MIME types accepted for token logos.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/png", "image/jpeg", "image/jpg", "image/svg+xml"];

/// Size ceiling: 5 MiB, inclusive.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Hard ceiling for either raster axis.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

/// Preferred logo size; anything else in range gets a warning.
pub const RECOMMENDED_IMAGE_DIMENSION: u32 = 512;

const SVG_TYPE: &str = "image/svg+xml";

/// Immutable validation configuration. The validator captures no other state,
/// so two runs over the same file always produce the same report.
#[derive(Debug, Clone)]
pub struct ImageRules {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
    pub max_dimension: u32,
    pub recommended_dimension: u32,
}

impl Default for ImageRules {
    fn default() -> Self {
        ImageRules {
            allowed_types: ALLOWED_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
            max_bytes: MAX_IMAGE_BYTES,
            max_dimension: MAX_IMAGE_DIMENSION,
            recommended_dimension: RECOMMENDED_IMAGE_DIMENSION,
        }
    }
}

impl ImageRules {
    fn allows(&self, content_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}

/// Pixel dimensions of a decoded raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A candidate logo file: name, declared MIME type, raw contents.
#[derive(Debug, Clone)]
pub struct LogoFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl LogoFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        LogoFile {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Load a logo from disk, deriving the MIME type from the file extension.
    /// Unknown extensions yield an empty type, which the type stage reports
    /// as "unknown".
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read logo file {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "logo".to_string());
        Ok(LogoFile {
            file_name,
            content_type: content_type_for(path),
            bytes: Bytes::from(data),
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn content_type_for(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") => "image/jpg",
        Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "",
    }
    .to_string()
}

/// Report produced by [`validate`]: validity flag, first failing stage's
/// error, dimension-stage warnings, and echoed file facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogoValidation {
    pub valid: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub dimensions: Option<Dimensions>,
    pub size: u64,
    pub content_type: String,
}

impl LogoValidation {
    fn rejected(error: String, size: u64, content_type: String) -> Self {
        LogoValidation {
            valid: false,
            error: Some(error),
            warnings: Vec::new(),
            dimensions: None,
            size,
            content_type,
        }
    }
}

/// Run the three-stage validation pipeline over a logo file.
///
/// The decode runs on the blocking pool; the header buffer is dropped as soon
/// as the dimensions are read.
pub async fn validate(file: &LogoFile, rules: &ImageRules) -> LogoValidation {
    let size = file.size();
    let content_type = file.content_type.clone();

    if !rules.allows(&content_type) {
        let shown = if content_type.is_empty() {
            "unknown"
        } else {
            content_type.as_str()
        };
        return LogoValidation::rejected(
            format!(
                "Invalid file type: {}. Allowed types: {}",
                shown,
                rules.allowed_types.join(", ")
            ),
            size,
            content_type,
        );
    }

    if size == 0 {
        return LogoValidation::rejected("File is empty".to_string(), size, content_type);
    }
    if size > rules.max_bytes {
        let actual_mb = size as f64 / (1024.0 * 1024.0);
        let max_mb = rules.max_bytes / (1024 * 1024);
        return LogoValidation::rejected(
            format!(
                "File size {:.2}MB exceeds the maximum allowed size of {}MB",
                actual_mb, max_mb
            ),
            size,
            content_type,
        );
    }

    // Vector images have no raster dimensions to check.
    if content_type.eq_ignore_ascii_case(SVG_TYPE) {
        return LogoValidation {
            valid: true,
            error: None,
            warnings: Vec::new(),
            dimensions: None,
            size,
            content_type,
        };
    }

    let data = file.bytes.clone();
    let decoded = tokio::task::spawn_blocking(move || decode_dimensions(&data)).await;
    let dims = match decoded {
        Ok(Some(dims)) => dims,
        _ => {
            return LogoValidation::rejected(
                "Image file appears to be corrupted or invalid".to_string(),
                size,
                content_type,
            )
        }
    };

    if dims.width > rules.max_dimension || dims.height > rules.max_dimension {
        return LogoValidation {
            valid: false,
            error: Some(format!(
                "Image dimensions {} exceed the maximum allowed {}x{}",
                dims, rules.max_dimension, rules.max_dimension
            )),
            warnings: Vec::new(),
            dimensions: Some(dims),
            size,
            content_type,
        };
    }

    let mut warnings = Vec::new();
    if dims.width != rules.recommended_dimension || dims.height != rules.recommended_dimension {
        warnings.push(format!(
            "Recommended dimensions are {}x{}, got {}",
            rules.recommended_dimension, rules.recommended_dimension, dims
        ));
    }

    LogoValidation {
        valid: true,
        error: None,
        warnings,
        dimensions: Some(dims),
        size,
        content_type,
    }
}

fn decode_dimensions(data: &[u8]) -> Option<Dimensions> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format().ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(Dimensions { width, height })
}

/// Format a byte count the way the deployment form displays it.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Two decimals, trailing zeros trimmed ("1.5 KB", not "1.50 KB")
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Caller-owned previewable reference to a logo: the bytes written to a
/// temporary file that lives exactly as long as the handle. Call
/// [`PreviewHandle::release`] when the preview is no longer displayed;
/// dropping the handle is the backstop.
#[derive(Debug)]
pub struct PreviewHandle {
    file: NamedTempFile,
}

impl PreviewHandle {
    pub fn create(logo: &LogoFile) -> Result<Self> {
        let suffix = Path::new(&logo.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("logo-preview-")
            .suffix(&suffix)
            .tempfile()
            .context("Failed to create preview file")?;
        file.write_all(&logo.bytes)
            .context("Failed to write preview file")?;
        file.flush().context("Failed to flush preview file")?;

        Ok(PreviewHandle { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Explicitly remove the backing file.
    pub fn release(self) -> Result<()> {
        self.file.close().context("Failed to remove preview file")
    }
}
