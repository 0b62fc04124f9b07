pub mod file_lock;
pub mod logging;
pub mod prompt;

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use log::debug;

use eapnm::eap::parse_with;
use eapnm::{
    CaTrust, Configurator, MaterialStore, NmSettings, ParseOptions, ProfileOptions, ProviderInfo,
    StateFile, validity_days,
};

use crate::file_lock::acquire_app_lock;
use crate::prompt::TerminalPrompt;

const APP_NAME: &str = "eapnm";

#[derive(Parser, Debug)]
#[command(name = "eapnm")]
#[command(about = "Install EAP-config networks into NetworkManager")]
#[command(disable_version_flag = true)]
#[command(version)]
struct Args {
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    /// EAP-config file to install
    #[arg(short = 'l', long = "local", value_name = "FILE")]
    local: Option<PathBuf>,

    /// Reference the CA chain as a single PEM file instead of a hashed directory
    #[arg(long = "ca-file", action = ArgAction::SetTrue)]
    ca_file: bool,

    /// Log at debug level
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    debug: bool,

    /// Print provider details before installing
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Show the installed profiles and certificate validity
    Status,
}

/// Locale for provider texts, from `$LC_ALL` or `$LANG`.
fn locale_from_env(lc_all: Option<String>, lang: Option<String>) -> Option<String> {
    lc_all
        .into_iter()
        .chain(lang)
        .find(|l| !l.is_empty() && l != "C" && l != "POSIX")
}

fn print_provider(provider: &ProviderInfo) {
    let fields = [
        ("Provider", &provider.display_name),
        ("Description", &provider.description),
        ("Helpdesk e-mail", &provider.helpdesk.email),
        ("Helpdesk phone", &provider.helpdesk.phone),
        ("Helpdesk web", &provider.helpdesk.web),
        ("Terms of use", &provider.terms),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            println!("{label}: {value}");
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.version {
        println!("eapnm {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let store = MaterialStore::default_location(APP_NAME);
    let data_dir = store.ensure().ok().map(|_| store.root());
    logging::init(args.debug, data_dir);

    let _lock = acquire_app_lock(store.root())?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(async {
        match &args.command {
            Some(Command::Status) => status(store).await,
            None => configure(&args, store).await,
        }
    })
}

async fn configure(args: &Args, store: MaterialStore) -> anyhow::Result<()> {
    let Some(path) = &args.local else {
        bail!("no EAP-config given, pass --local <FILE>");
    };
    let document =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let locale = locale_from_env(std::env::var("LC_ALL").ok(), std::env::var("LANG").ok());
    debug!("Using locale {locale:?}");
    let parse = ParseOptions { locale };

    if args.verbose {
        print_provider(&parse_with(&document, &parse)?.provider);
    }

    let ca_trust = if args.ca_file {
        CaTrust::File
    } else {
        CaTrust::Directory
    };
    let service = NmSettings::system()
        .await
        .context("failed to connect to NetworkManager")?;
    let state = StateFile::in_store(&store);
    let prompt = TerminalPrompt;

    let outcome = Configurator::new(&service, &state, store)
        .profile_options(
            ProfileOptions::default()
                .with_app_name(APP_NAME)
                .with_ca_trust(ca_trust),
        )
        .parse_options(parse)
        .credential_prompt(&prompt)
        .certificate_prompt(&prompt)
        .configure(&document)
        .await?;

    println!("Installed {} connection profile(s)", outcome.uuids.len());
    if args.verbose {
        for uuid in &outcome.uuids {
            println!("  {uuid}");
        }
    }
    if let Some(warning) = &outcome.warning {
        eprintln!("warning: not every network could be installed: {warning}");
    }
    if let Some(validity) = outcome.validity {
        println!(
            "Your certificate is valid until {} ({} days)",
            validity.format("%Y-%m-%d"),
            validity_days(validity, Utc::now())
        );
    }
    Ok(())
}

async fn status(store: MaterialStore) -> anyhow::Result<()> {
    let service = NmSettings::system()
        .await
        .context("failed to connect to NetworkManager")?;
    let state = StateFile::in_store(&store);
    let status = Configurator::new(&service, &state, store).status().await?;

    if status.record.uuids.is_empty() {
        println!("No profiles installed");
        return Ok(());
    }
    for uuid in &status.record.uuids {
        let presence = if status.live.contains(uuid) {
            "installed"
        } else {
            "missing"
        };
        println!("{uuid} {presence}");
    }
    if let Some(validity) = status.record.validity {
        let days = validity_days(validity, Utc::now());
        if days == 0 {
            println!("Certificate expired on {}", validity.format("%Y-%m-%d"));
        } else {
            println!(
                "Certificate valid until {} ({days} days)",
                validity.format("%Y-%m-%d")
            );
        }
    }
    Ok(())
}
