mod config;
mod identity;
mod mailboxes;
mod occ;
mod prompt;
mod provision;
mod report;
mod signature;
mod webmail;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use config::read_config;
use mailboxes::MailboxCatalog;
use occ::OccClient;
use prompt::TermPrompter;
use provision::Wizard;
use report::ConsoleReporter;
use webmail::WebmailAssigner;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    #[clap(
        short,
        long,
        env = "MAJORDOME_CONFIG",
        default_value = "majordome.toml"
    )]
    /// Path to the main Majordome configuration file
    config_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Guided creation of a Nextcloud account, including its mailbox
    /// identities
    CreateUser,

    /// Bind primary and extra SnappyMail mailboxes for an existing account
    Webmail {
        #[clap(short, long)]
        account: Option<String>,
    },
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "main=warn,majordome=warn")
    }

    // Abort on panic (same behavior as in Go)
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{}", panic_info);
        eprintln!("{:?}", backtrace::Backtrace::new());
        std::process::abort();
    }));

    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = read_config(args.config_file.clone()).context(format!(
        "'{:?}' must be a majordome configuration file",
        args.config_file
    ))?;
    let catalog = MailboxCatalog::load(&config.mailboxes, &config.email_domain)
        .context("unable to load the shared-mailbox catalog")?;

    let reporter = ConsoleReporter;
    let occ = OccClient::new(&config, &reporter);
    let mut prompter = TermPrompter;

    match args.command {
        Command::CreateUser => {
            let mut wizard = Wizard::new(&config, &catalog, &occ, &mut prompter, &reporter);
            wizard.run()?;
        }
        Command::Webmail { account } => {
            let mut assigner =
                WebmailAssigner::new(&config, &catalog, &occ, &mut prompter, &reporter);
            assigner.run(account)?;
        }
    }

    Ok(())
}
