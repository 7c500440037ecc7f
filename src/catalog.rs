//! Connection catalog: the named databases an agent may reach.
//!
//! Loaded once at startup from a JSON object keyed by database name and kept
//! immutable for the lifetime of the process:
//!
//! ```json
//! {
//!   "school": { "url": "sqlite:///srv/data/school.db", "description": "Students and courses" }
//! }
//! ```

use anyhow::Context;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::dialect::Dialect;
use crate::error::{DbToolError, DbToolResult};

/// On-disk shape of one catalog entry.
#[derive(Debug, Deserialize)]
struct RawEntry {
    url: String,
    #[serde(default)]
    description: String,
}

/// A named connection. The URL embeds credentials, so it is held as a secret
/// and only exposed when a driver needs it.
#[derive(Debug)]
pub struct ConnectionDescriptor {
    pub name: String,
    url: SecretString,
    pub description: String,
    dialect: Dialect,
}

impl ConnectionDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>, description: impl Into<String>) -> Self {
        let url: String = url.into();
        let dialect = Dialect::classify(&url);
        Self {
            name: name.into(),
            url: SecretString::from(url),
            description: description.into(),
            dialect,
        }
    }

    /// Dialect classified from the URL when the descriptor was built.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Connection string in the form sqlx expects.
    ///
    /// A driver suffix in the scheme (`mysql+pymysql://`) is dropped.
    pub fn driver_url(&self) -> String {
        strip_driver_suffix(self.url.expose_secret())
    }

    /// Connection string with any password removed, for log lines.
    pub fn redacted_url(&self) -> String {
        let raw = self.driver_url();
        match url::Url::parse(&raw) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            }
            Err(_) => format!("{}://***", self.dialect.scheme_hint()),
        }
    }
}

fn strip_driver_suffix(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match scheme.split_once('+') {
            Some((base, _driver)) => format!("{base}://{rest}"),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}

/// Ordered, read-only mapping of database name to descriptor.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: IndexMap<String, ConnectionDescriptor>,
}

impl Catalog {
    pub fn new(descriptors: impl IntoIterator<Item = ConnectionDescriptor>) -> Self {
        let entries = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.name.clone(), descriptor))
            .collect();
        Self { entries }
    }

    /// Parse a catalog from its JSON text, preserving key order.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let raw: IndexMap<String, RawEntry> =
            serde_json::from_str(content).context("Connection catalog is not a valid JSON object")?;

        Ok(Self::new(raw.into_iter().map(|(name, entry)| {
            ConnectionDescriptor::new(name, entry.url, entry.description)
        })))
    }

    /// Load the catalog file named on the command line.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read connection catalog: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse connection catalog: {}", path.display()))
    }

    /// Look up a database by name.
    pub fn resolve(&self, name: &str) -> DbToolResult<&ConnectionDescriptor> {
        self.entries
            .get(name)
            .ok_or_else(|| DbToolError::DatabaseNotFound {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionDescriptor> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
