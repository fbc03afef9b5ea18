use anyhow::{bail, Result};

use crate::config::Config;
use crate::mailboxes::MailboxCatalog;
use crate::occ::AdminTool;
use crate::prompt::{self, Prompter};
use crate::report::Reporter;
use crate::webmail::WebmailAssigner;

const PRONOUN_CHOICES: [&str; 5] = [
    "they/them",
    "she/her",
    "he/him",
    "custom",
    "prefer not to say",
];

/// Collected and validated account fields; input to `user:add`, never
/// persisted.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub pronouns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    Created {
        username: String,
        /// Shown exactly once, never stored. Absent when the occ output
        /// carried no recognizable credential.
        password: Option<String>,
    },
    Aborted,
}

/// Pre-fills the username from the full name: lowercase, drop everything
/// that is not a letter, digit, whitespace, hyphen or underscore, then
/// collapse whitespace/underscore/hyphen runs into single dots.
pub fn sanitize_username(full_name: &str) -> String {
    let mut out = String::new();
    let mut pending_dot = false;
    for c in full_name.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_dot && !out.is_empty() {
                out.push('.');
            }
            pending_dot = false;
            out.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_dot = true;
        }
    }
    out
}

pub fn build_email(username: &str, domain: &str) -> String {
    format!("{}@{}", username, domain)
}

fn valid_username(input: &str) -> Result<(), String> {
    let ok = !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err("Use lowercase letters, numbers, dots, dashes, underscores only".into())
    }
}

/// Parses occ's machine-readable output mode: the whole stdout is one JSON
/// object carrying a `password` field.
fn extract_password_structured(stdout: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).ok()?;
    value.get("password")?.as_str().map(str::to_string)
}

/// Keyword scan over free-text output: the last whitespace-delimited token
/// of the first line containing "password" case-insensitively.
fn extract_password_heuristic(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find(|line| line.to_lowercase().contains("password"))
        .and_then(|line| line.split_whitespace().last())
        .map(str::to_string)
}

pub fn extract_generated_password(stdout: &str) -> Option<String> {
    extract_password_structured(stdout).or_else(|| extract_password_heuristic(stdout))
}

/// The account-creation wizard:
/// collect fields, confirm, `user:add` with a server-generated credential,
/// secondary settings (pronouns, app order), then mailbox identity
/// assignment.
pub struct Wizard<'a> {
    config: &'a Config,
    catalog: &'a MailboxCatalog,
    occ: &'a dyn AdminTool,
    prompter: &'a mut dyn Prompter,
    reporter: &'a dyn Reporter,
}

impl<'a> Wizard<'a> {
    pub fn new(
        config: &'a Config,
        catalog: &'a MailboxCatalog,
        occ: &'a dyn AdminTool,
        prompter: &'a mut dyn Prompter,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            catalog,
            occ,
            prompter,
            reporter,
        }
    }

    pub fn run(&mut self) -> Result<WizardOutcome> {
        self.ensure_occ_available()?;

        let draft = self.collect()?;
        if !self.confirm(&draft)? {
            self.reporter.info("Aborted", "Nothing was created.");
            return Ok(WizardOutcome::Aborted);
        }

        let password = self.create_account(&draft)?;
        match &password {
            Some(password) => self.reporter.info(
                "Generated credentials",
                &format!(
                    "Username: {}\nPassword: {}\n\nCopy this password now.\nIt will not be shown again.",
                    draft.username, password
                ),
            ),
            None => self.reporter.info(
                "Success",
                &format!("Account {} created successfully.", draft.username),
            ),
        }

        self.set_pronouns(&draft)?;
        self.set_app_order(&draft.username)?;

        let mut assigner = WebmailAssigner::new(
            self.config,
            self.catalog,
            self.occ,
            &mut *self.prompter,
            self.reporter,
        );
        assigner.select_main_account(Some(draft.username.clone()))?;

        Ok(WizardOutcome::Created {
            username: draft.username,
            password,
        })
    }

    /// A missing PHP or occ script must fail before any questions are
    /// asked.
    fn ensure_occ_available(&self) -> Result<()> {
        self.occ
            .run(&["--version"], false, true, "occ availability check")?;
        Ok(())
    }

    fn collect(&mut self) -> Result<AccountDraft> {
        let full_name = self.prompter.text("Full name", None, &prompt::any)?;
        let full_name = full_name.trim().to_string();
        if full_name.is_empty() {
            bail!("Aborted: the full name cannot be empty.");
        }

        let username = self.prompter.text(
            "Username",
            Some(&sanitize_username(&full_name)),
            &valid_username,
        )?;

        let email = self.prompter.text(
            "Email address",
            Some(&build_email(&username, &self.config.email_domain)),
            &prompt::any,
        )?;

        let pronouns = self.select_pronouns()?;

        Ok(AccountDraft {
            full_name,
            username,
            email,
            pronouns,
        })
    }

    fn select_pronouns(&mut self) -> Result<Option<String>> {
        let choices: Vec<String> = PRONOUN_CHOICES.iter().map(|s| s.to_string()).collect();
        let choice = self.prompter.select("Pronouns", &choices)?;
        Ok(match choice.as_str() {
            "custom" => {
                let custom = self.prompter.text("Enter pronouns", None, &prompt::any)?;
                let custom = custom.trim().to_string();
                (!custom.is_empty()).then_some(custom)
            }
            "prefer not to say" => None,
            chosen => Some(chosen.to_string()),
        })
    }

    fn confirm(&mut self, draft: &AccountDraft) -> Result<bool> {
        self.reporter.info(
            "Confirm account details",
            &format!(
                "Full name: {}\nUsername:  {}\nEmail:     {}\nPronouns:  {}",
                draft.full_name,
                draft.username,
                draft.email,
                draft.pronouns.as_deref().unwrap_or("-")
            ),
        );
        self.prompter.confirm("Create this account?", true)
    }

    fn create_account(&mut self, draft: &AccountDraft) -> Result<Option<String>> {
        tracing::debug!(user = %draft.username, "will-create");

        let mut args: Vec<&str> = vec![
            "user:add",
            "--display-name",
            &draft.full_name,
            "--email",
            &draft.email,
            "--generate-password",
        ];
        if self.config.structured_output {
            args.push("--output=json");
        }
        args.push(&draft.username);

        let out = self.occ.run(&args, true, true, "user creation")?;
        let stdout = out.and_then(|o| o.stdout).unwrap_or_default();

        let password = extract_generated_password(&stdout);
        if password.is_none() {
            self.reporter.warning(
                "No credential recovered",
                "The account was created, but no password could be read from the output.\nYour Nextcloud version may not support --generate-password.",
            );
        }
        Ok(password)
    }

    /// Non-fatal: a failed pronoun write leaves the account otherwise
    /// intact and the run continues.
    fn set_pronouns(&mut self, draft: &AccountDraft) -> Result<()> {
        let pronouns = match &draft.pronouns {
            Some(pronouns) => pronouns,
            None => return Ok(()),
        };
        self.occ.run(
            &[
                "user:setting",
                &draft.username,
                "profile",
                "pronouns",
                pronouns,
            ],
            false,
            false,
            "setting pronouns",
        )?;
        Ok(())
    }

    fn set_app_order(&mut self, username: &str) -> Result<()> {
        let order = default_app_order().to_string();
        self.occ.run(
            &["user:setting", username, "core", "apporder", &order],
            false,
            true,
            "setting the default app order",
        )?;
        Ok(())
    }
}

/// Fixed default menu ordering applied to every new account.
fn default_app_order() -> serde_json::Value {
    serde_json::json!({
        "dashboard": { "order": 0, "app": "dashboard" },
        "snappymail": { "order": 1, "app": "snappymail" },
        "collectives": { "order": 2, "app": "collectives" },
        "tables_application_1": { "order": 3 },
        "calendar": { "order": 4, "app": "calendar" },
        "files": { "order": 5, "app": "files" },
        "contacts": { "order": 6, "app": "contacts" },
        "polls": { "order": 7, "app": "polls" },
        "tables": { "order": 8, "app": "tables" },
        "passwords": { "order": 9, "app": "passwords" },
        "mail": { "order": 10, "app": "mail" },
        "occweb": { "order": 11, "app": "occweb" }
    })
}
