use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// PHP interpreter used to run occ
    #[serde(default = "default_php")]
    pub php: String,

    /// Path to the Nextcloud occ script
    pub occ: PathBuf,

    /// Domain appended to usernames and mailbox prefixes
    pub email_domain: String,

    /// Shared-mailbox catalog document; its absence is not an error
    #[serde(default = "default_mailboxes")]
    pub mailboxes: PathBuf,

    /// SnappyMail per-domain storage directory, e.g.
    /// <nextcloud>/data/appdata_snappymail/_data_/_default_/storage/<domain>
    pub snappymail_data: PathBuf,

    #[serde(default = "default_signature_template")]
    pub signature_template: PathBuf,

    /// Ask occ for machine-parseable output (--output=json) where supported
    #[serde(default)]
    pub structured_output: bool,
}

pub fn read_config(config_file: PathBuf) -> Result<Config> {
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .open(config_file.as_path())?;

    let mut config = String::new();
    file.read_to_string(&mut config)?;

    Ok(toml::from_str(&config)?)
}

fn default_php() -> String {
    "php".into()
}

fn default_mailboxes() -> PathBuf {
    "mailboxes.toml".into()
}

fn default_signature_template() -> PathBuf {
    "signature_template.txt".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            occ = "/var/www/cloud/occ"
            email_domain = "example.net"
            snappymail_data = "/srv/snappymail/storage/example.net"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.php, "php");
        assert_eq!(cfg.mailboxes, PathBuf::from("mailboxes.toml"));
        assert_eq!(
            cfg.signature_template,
            PathBuf::from("signature_template.txt")
        );
        assert!(!cfg.structured_output);
    }
}
