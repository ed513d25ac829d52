use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Namespace and dataset slugs: lowercase letters, digits, hyphens; no
// leading or trailing hyphen. Publisher slugs additionally allow dots
// for domain-style names (met.no, norge.no).
static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap());
static PUBLISHER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9.-]*[a-z0-9])?$").unwrap());
static ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^[a-z0-9]([a-z0-9.-]*[a-z0-9])?",
        r"/[a-z0-9]([a-z0-9-]*[a-z0-9])?",
        r"/[a-z0-9]([a-z0-9-]*[a-z0-9])?$",
    ))
    .unwrap()
});
static CHECKSUM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(sha256|sha512|md5):[a-f0-9]+$").unwrap());

/// Whether a string is a well-formed `publisher/namespace/dataset` id.
///
/// Applied before any registry lookup; invalid input short-circuits
/// without network activity.
pub fn is_valid_id(s: &str) -> bool {
    ID_REGEX.is_match(s)
}

/// One validation finding, addressed by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub field: String,
    pub message: String,
}

impl Issue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A single data file within a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Source {
    fn validate(&self, field: &str, issues: &mut Vec<Issue>) {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            issues.push(Issue::new(
                format!("{field}.url"),
                "URL must start with http:// or https://",
            ));
        }
        if self.format.trim().is_empty() {
            issues.push(Issue::new(
                format!("{field}.format"),
                "Format cannot be empty",
            ));
        }
        if let Some(checksum) = &self.checksum {
            if !CHECKSUM_REGEX.is_match(checksum) {
                issues.push(Issue::new(
                    format!("{field}.checksum"),
                    "Invalid checksum format — expected sha256:<hex>, sha512:<hex>, or md5:<hex>",
                ));
            }
        }
    }
}

/// Metadata about the dataset's publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The datapackage.json schema.
///
/// Immutable once resolved from a registry; the pull pipeline never
/// mutates a package, it only reads the source list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPackage {
    pub id: String,
    pub version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub publisher: PublisherInfo,
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl DataPackage {
    pub fn publisher_slug(&self) -> &str {
        self.id.split('/').next().unwrap_or("")
    }

    pub fn namespace_slug(&self) -> &str {
        self.id.split('/').nth(1).unwrap_or("")
    }

    pub fn dataset_slug(&self) -> &str {
        self.id.split('/').nth(2).unwrap_or("")
    }

    /// Full schema validation; an empty result means the package is
    /// publishable.
    pub fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        if !is_valid_id(&self.id) {
            issues.push(Issue::new(
                "id",
                format!(
                    "Invalid identifier format {:?}. Expected publisher/namespace/dataset \
                     (three slash-separated slugs of lowercase letters, digits, and hyphens — \
                     the publisher may contain dots, e.g. met.no/weather/oslo-hourly)",
                    self.id
                ),
            ));
        }
        if self.version.trim().is_empty() {
            issues.push(Issue::new("version", "Version cannot be empty"));
        }
        if self.title.trim().is_empty() {
            issues.push(Issue::new("title", "Title cannot be empty"));
        }
        if self.publisher.name.trim().is_empty() {
            issues.push(Issue::new("publisher.name", "Publisher name cannot be empty"));
        }
        if let Some(url) = &self.publisher.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                issues.push(Issue::new(
                    "publisher.url",
                    "Publisher URL must start with http:// or https://",
                ));
            }
        }
        if self.sources.is_empty() {
            issues.push(Issue::new("sources", "At least one source is required"));
        }
        for (i, source) in self.sources.iter().enumerate() {
            source.validate(&format!("sources[{i}]"), &mut issues);
        }

        issues
    }
}
