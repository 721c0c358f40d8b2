//! 扫描目标
//!
//! A target is either an uploaded file (identified by its content hash) or a
//! URL (identified by its canonical string). Targets are validated on
//! construction and immutable afterwards.

use crate::errors::TargetError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const APK_MIME_TYPE: &str = "application/vnd.android.package-archive";
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// 目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Url,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::File => write!(f, "file"),
            TargetKind::Url => write!(f, "url"),
        }
    }
}

/// 文件目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTarget {
    /// 内容哈希（小写十六进制）
    pub content_hash: String,
    /// 文件大小（字节）
    pub size: u64,
    /// MIME 类型
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub md5: Option<String>,
}

impl FileTarget {
    /// Android 安装包按文件处理，仅在报告中单独标记
    pub fn is_apk(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(APK_MIME_TYPE)
            || self
                .file_name
                .as_deref()
                .map(|name| name.to_ascii_lowercase().ends_with(".apk"))
                .unwrap_or(false)
    }
}

/// URL 目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlTarget {
    /// 规范化后的 URL
    pub url: String,
    pub domain: String,
    pub protocol: String,
    pub path: String,
}

/// 扫描目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScanTarget {
    File(FileTarget),
    Url(UrlTarget),
}

impl ScanTarget {
    /// Builds a file target from an already computed content hash.
    pub fn file(
        content_hash: impl AsRef<str>,
        size: u64,
        mime_type: impl Into<String>,
    ) -> Result<Self, TargetError> {
        let content_hash = normalize_hash(content_hash.as_ref())?;
        Ok(ScanTarget::File(FileTarget {
            content_hash,
            size,
            mime_type: mime_or_default(mime_type.into()),
            file_name: None,
            md5: None,
        }))
    }

    /// Hashes raw upload bytes. SHA-256 becomes the identity, MD5 is kept for
    /// the technical details section of the report.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>, file_name: Option<String>) -> Self {
        let content_hash = hex::encode(Sha256::digest(bytes));
        let md5 = format!("{:x}", md5::compute(bytes));
        ScanTarget::File(FileTarget {
            content_hash,
            size: bytes.len() as u64,
            mime_type: mime_or_default(mime_type.into()),
            file_name,
            md5: Some(md5),
        })
    }

    /// Parses and canonicalises an absolute http(s) URL.
    pub fn url(raw: &str) -> Result<Self, TargetError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TargetError::EmptyUrl);
        }

        let parsed = Url::parse(trimmed).map_err(|e| TargetError::InvalidUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        }

        let domain = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(TargetError::MissingHost(trimmed.to_string())),
        };

        Ok(ScanTarget::Url(UrlTarget {
            url: parsed.as_str().to_string(),
            domain,
            protocol: parsed.scheme().to_string(),
            path: parsed.path().to_string(),
        }))
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            ScanTarget::File(_) => TargetKind::File,
            ScanTarget::Url(_) => TargetKind::Url,
        }
    }

    /// Identity used for idempotence: the content hash for files, the
    /// canonical URL string for URLs.
    pub fn identity(&self) -> &str {
        match self {
            ScanTarget::File(file) => &file.content_hash,
            ScanTarget::Url(url) => &url.url,
        }
    }

    /// Human facing label for reports and logs.
    pub fn display_name(&self) -> &str {
        match self {
            ScanTarget::File(file) => file.file_name.as_deref().unwrap_or(&file.content_hash),
            ScanTarget::Url(url) => &url.url,
        }
    }

    pub fn is_apk(&self) -> bool {
        matches!(self, ScanTarget::File(file) if file.is_apk())
    }
}

fn normalize_hash(raw: &str) -> Result<String, TargetError> {
    let hash = raw.trim();
    if hash.is_empty() {
        return Err(TargetError::MissingHash);
    }
    let valid_len = matches!(hash.len(), 32 | 40 | 64);
    if !valid_len || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TargetError::InvalidHash(hash.to_string()));
    }
    Ok(hash.to_ascii_lowercase())
}

fn mime_or_default(mime: String) -> String {
    if mime.trim().is_empty() {
        DEFAULT_MIME_TYPE.to_string()
    } else {
        mime
    }
}
