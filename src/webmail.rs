use anyhow::{Context, Result};

use crate::config::Config;
use crate::identity::IdentityStore;
use crate::mailboxes::{MailboxCatalog, SharedMailbox};
use crate::occ::AdminTool;
use crate::prompt::{self, Prompter};
use crate::report::Reporter;
use crate::signature;

const CUSTOM_CHOICE: &str = "Custom/User-specific";

fn valid_email(input: &str) -> Result<(), String> {
    if input.contains('@') {
        Ok(())
    } else {
        Err("Please enter a valid email address".into())
    }
}

/// Binds shared or custom mailboxes to an account's SnappyMail settings:
/// the primary mail account through `snappymail:settings`, extra mailboxes
/// through the additional-accounts registry and per-mailbox identity
/// documents.
pub struct WebmailAssigner<'a> {
    config: &'a Config,
    catalog: &'a MailboxCatalog,
    occ: &'a dyn AdminTool,
    prompter: &'a mut dyn Prompter,
    reporter: &'a dyn Reporter,
    store: IdentityStore,
}

impl<'a> WebmailAssigner<'a> {
    pub fn new(
        config: &'a Config,
        catalog: &'a MailboxCatalog,
        occ: &'a dyn AdminTool,
        prompter: &'a mut dyn Prompter,
        reporter: &'a dyn Reporter,
    ) -> Self {
        let store = IdentityStore::new(config.snappymail_data.clone());
        Self {
            config,
            catalog,
            occ,
            prompter,
            reporter,
            store,
        }
    }

    /// Standalone `webmail` flow for an existing account: primary mailbox
    /// first, then optionally extra shared mailboxes.
    pub fn run(&mut self, account: Option<String>) -> Result<()> {
        let account = self.select_main_account(account)?;
        if !self.catalog.is_empty()
            && self
                .prompter
                .confirm("Add extra shared mailbox(es) to this account?", false)?
        {
            self.add_extra_accounts(&account)?;
        }
        Ok(())
    }

    /// Optionally binds a shared or custom mailbox as the account's primary
    /// mail account. With an empty catalog the account keeps whatever mail
    /// settings it already has and no occ call is made.
    pub fn select_main_account(&mut self, account: Option<String>) -> Result<String> {
        let account = match account {
            Some(account) => account,
            None => self
                .prompter
                .text("Nextcloud username", None, &prompt::non_empty)?,
        };

        if self.catalog.is_empty() {
            return Ok(account);
        }

        let mut choices = vec![CUSTOM_CHOICE.to_string()];
        choices.extend(self.catalog.prefixes());
        let choice = self
            .prompter
            .select("Use a shared email account as main account?", &choices)?;

        let (email, mailbox) = if choice == CUSTOM_CHOICE {
            let email = self
                .prompter
                .text("Enter full email address", None, &valid_email)?;
            (email, None)
        } else {
            let mailbox = self
                .catalog
                .get(&choice)
                .context("selected mailbox must exist in the catalog")?;
            (mailbox.email.clone(), Some(mailbox))
        };

        let password = self.prompter.password("Mailbox password")?;

        tracing::debug!(user = %account, email = %email, "bind-main");
        self.occ.run(
            &["snappymail:settings", &account, &email, &password],
            false,
            true,
            "set snappymail primary account",
        )?;
        self.reporter.info(
            "SnappyMail",
            &format!("Mailbox {} set as main account for {}.", email, account),
        );

        // shared mailboxes also become the account's primary identity;
        // a custom address keeps whatever identity is already there
        if let Some(mailbox) = mailbox {
            let signature_html = self.generate_signature(&account, mailbox)?;
            let path = self.store.identities_path(&account);
            self.store
                .merge_primary(&path, &mailbox.email, &mailbox.name, &signature_html)?;
        }

        Ok(account)
    }

    /// Binds further shared mailboxes as non-primary identities: one entry
    /// in the additional-accounts registry plus a per-mailbox identity
    /// document, each per mailbox.
    pub fn add_extra_accounts(&mut self, account: &str) -> Result<()> {
        if self.catalog.is_empty() {
            return Ok(());
        }
        let choices = self.catalog.prefixes();
        let picks = self.prompter.multi_select(
            "Add which shared mailbox(es)? (skip this when the primary account already is a shared mailbox)",
            &choices,
        )?;
        for prefix in picks {
            let mailbox = self
                .catalog
                .get(&prefix)
                .context("selected mailbox must exist in the catalog")?;
            self.add_extra_account(account, mailbox)?;
        }
        Ok(())
    }

    fn add_extra_account(&mut self, account: &str, mailbox: &SharedMailbox) -> Result<()> {
        tracing::debug!(user = %account, email = %mailbox.email, "bind-extra");
        self.store
            .register_additional(account, &mailbox.email, &mailbox.name)?;

        let signature_html = self.generate_signature(account, mailbox)?;
        let path = self.store.extra_identities_path(account, &mailbox.email);
        self.store
            .merge_primary(&path, &mailbox.email, &mailbox.name, &signature_html)?;

        self.reporter.info(
            "SnappyMail",
            &format!("Extra mailbox {} registered for {}.", mailbox.email, account),
        );
        Ok(())
    }

    /// Renders the account's signature for one shared mailbox. A missing
    /// template or unreadable profile field degrades to an empty
    /// substitution instead of failing the assignment.
    fn generate_signature(&self, account: &str, mailbox: &SharedMailbox) -> Result<String> {
        let template_path = &self.config.signature_template;
        if !template_path.exists() {
            self.reporter.warning(
                "Signature",
                &format!(
                    "Template '{}' not found; writing an empty signature.",
                    template_path.display()
                ),
            );
            return Ok(String::new());
        }
        let template = std::fs::read_to_string(template_path)
            .with_context(|| format!("unable to read {}", template_path.display()))?;

        let pronouns = self.profile_value(account, "pronouns")?;
        let person_name = self.profile_value(account, "displayname")?;
        let rendered = signature::render(
            &template,
            &[
                ("pronouns", &pronouns),
                ("person_name", &person_name),
                (
                    "department_de",
                    mailbox.department_de.as_deref().unwrap_or(""),
                ),
                (
                    "department_en",
                    mailbox.department_en.as_deref().unwrap_or(""),
                ),
            ],
        );
        Ok(signature::to_html_breaks(&rendered))
    }

    fn profile_value(&self, account: &str, field: &str) -> Result<String> {
        let out = self.occ.run(
            &["user:profile", account, field],
            true,
            false,
            &format!("reading profile field '{}'", field),
        )?;
        Ok(out
            .and_then(|o| o.stdout)
            .map(|s| s.trim().to_string())
            .unwrap_or_default())
    }
}
