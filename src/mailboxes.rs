use std::path::Path;

use anyhow::Result;

/// A departmental address assignable to accounts as primary or extra
/// identity. Immutable once loaded; the email is always derived from the
/// prefix, never read from the catalog document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedMailbox {
    pub prefix: String,
    pub name: String,
    pub email: String,
    pub department_de: Option<String>,
    pub department_en: Option<String>,
}

/// The shared-mailbox registry, loaded once per invocation from a TOML
/// document keyed by prefix. Document order is kept for presentation.
#[derive(Debug, Clone, Default)]
pub struct MailboxCatalog {
    entries: Vec<SharedMailbox>,
}

impl MailboxCatalog {
    /// A missing catalog document is not an error: it yields an empty
    /// catalog and the assignment step becomes a no-op.
    pub fn load(path: &Path, domain: &str) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let doc = std::fs::read_to_string(path)?;
        Self::from_toml(&doc, domain)
    }

    pub fn from_toml(doc: &str, domain: &str) -> Result<Self> {
        let table: toml::value::Table = toml::from_str(doc)?;
        let entries = table
            .into_iter()
            .filter_map(|(prefix, value)| {
                // only nested tables are mailbox definitions
                let cfg = value.as_table()?;
                let name = cfg
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&prefix)
                    .to_string();
                let department_de = cfg.get("de").and_then(|v| v.as_str()).map(str::to_string);
                let department_en = cfg.get("en").and_then(|v| v.as_str()).map(str::to_string);
                Some(SharedMailbox {
                    email: format!("{}@{}", prefix, domain),
                    name,
                    department_de,
                    department_en,
                    prefix,
                })
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, prefix: &str) -> Option<&SharedMailbox> {
        self.entries.iter().find(|m| m.prefix == prefix)
    }

    pub fn prefixes(&self) -> Vec<String> {
        self.entries.iter().map(|m| m.prefix.clone()).collect()
    }
}
