use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved key of the singular primary identity slot.
pub const PRIMARY_SLOT: &str = "---";

/// One SnappyMail identity record. Field names follow SnappyMail's wire
/// format; fields this tool does not manage survive a merge through the
/// flattened map.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MailIdentity {
    #[serde(rename = "Id", default)]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "Signature", default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    #[serde(
        rename = "SignatureInsertBefore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub signature_insert_before: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A per-account identity document: identity id -> record.
pub type IdentityFile = BTreeMap<String, MailIdentity>;

/// One entry of the additional-accounts registry (extra mailboxes bound to
/// an account besides its primary one).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdditionalAccount {
    #[serde(rename = "Email")]
    pub email: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

pub type AdditionalAccounts = BTreeMap<String, AdditionalAccount>;

/// Merges name/email/signature into the primary slot, synthesizing the slot
/// when absent. Every other field already present on the slot is preserved;
/// the slot always ends up under the fixed primary key.
pub fn merge_primary_slot(ids: &mut IdentityFile, email: &str, name: &str, signature_html: &str) {
    let slot = ids
        .entry(PRIMARY_SLOT.to_string())
        .or_insert_with(|| MailIdentity {
            id: String::new(),
            name: name.to_string(),
            ..MailIdentity::default()
        });
    slot.name = name.to_string();
    slot.email = Some(email.to_string());
    slot.signature = Some(signature_html.to_string());
    slot.signature_insert_before = Some(true);
}

/// Reads, merges and persists SnappyMail's per-account JSON documents.
/// All writes are read-modify-write without locking; concurrent runs
/// against the same account can clobber each other.
pub struct IdentityStore {
    data_dir: PathBuf,
}

impl IdentityStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// The account's own identity document, derived from the account id.
    pub fn identities_path(&self, account: &str) -> PathBuf {
        self.data_dir.join(account).join("identities.json")
    }

    /// Identity document of one extra mailbox bound to the account.
    pub fn extra_identities_path(&self, account: &str, email: &str) -> PathBuf {
        self.data_dir
            .join(account)
            .join(email)
            .join("identities.json")
    }

    pub fn additional_accounts_path(&self, account: &str) -> PathBuf {
        self.data_dir.join(account).join("additionalaccounts.json")
    }

    pub fn merge_primary(
        &self,
        path: &Path,
        email: &str,
        name: &str,
        signature_html: &str,
    ) -> Result<()> {
        let mut ids: IdentityFile = read_json_or_default(path)?;
        merge_primary_slot(&mut ids, email, name, signature_html);
        write_json(path, &ids)
    }

    /// Appends a mailbox to the account's additional-accounts registry,
    /// keeping entries already present.
    pub fn register_additional(&self, account: &str, email: &str, name: &str) -> Result<()> {
        let path = self.additional_accounts_path(account);
        let mut accounts: AdditionalAccounts = read_json_or_default(&path)?;
        let entry = accounts
            .entry(email.to_string())
            .or_insert_with(|| AdditionalAccount {
                email: email.to_string(),
                name: name.to_string(),
                extra: serde_json::Map::new(),
            });
        entry.email = email.to_string();
        entry.name = name.to_string();
        write_json(&path, &accounts)
    }
}

fn read_json_or_default<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let doc = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str(&doc).with_context(|| format!("'{}' must be a JSON document", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }
    let doc = serde_json::to_string_pretty(value)?;
    std::fs::write(path, doc).with_context(|| format!("unable to write {}", path.display()))?;
    Ok(())
}
