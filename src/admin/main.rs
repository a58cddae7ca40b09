//! Command-line administration for the license document.
//!
//! Runs the same operations as the bot without going through Telegram, and
//! can check the stored document for inconsistencies.

use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wg_license_bot::config::StoreConfig;
use wg_license_bot::license::{DocumentReport, LicenseError, LicenseStore};

/// License document administration.
#[derive(Parser, Debug)]
#[command(name = "license_admin")]
#[command(about = "Issue, ban, unban and check license keys stored in a GitHub repository")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env", global = true)]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a new key bound to a hardware ID.
    Gen {
        /// Hardware ID of the first device.
        hwid: String,

        /// Maximum number of devices.
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        allowed_devices: u32,

        /// Days until the key expires. Omit for a key that never expires.
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Ban a key.
    Ban {
        /// License key.
        key: String,
    },

    /// Unban a key.
    Unban {
        /// License key.
        key: String,
    },

    /// Check the license document for inconsistencies.
    Check {
        /// List the affected keys.
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store = match LicenseStore::new(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Command::Gen {
            hwid,
            allowed_devices,
            days,
        } => gen_key(&store, &hwid, allowed_devices, days).await,
        Command::Ban { key } => set_banned(&store, &key, true).await,
        Command::Unban { key } => set_banned(&store, &key, false).await,
        Command::Check { verbose } => return check(&store, verbose).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {e}");
            if matches!(e, LicenseError::Conflict) {
                eprintln!("  Run the command again to apply it to the latest document.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn gen_key(
    store: &LicenseStore,
    hwid: &str,
    allowed_devices: u32,
    days: Option<u32>,
) -> Result<(), LicenseError> {
    let issued = store.issue(hwid, allowed_devices, days).await?;

    println!("✓ License created");
    println!("  Key:         {}", issued.key);
    println!("  First HWID:  {}", issued.hwid());
    println!("  Max devices: {}", issued.record.allowed_devices);
    match issued.record.expire_at {
        Some(date) => println!("  Expires:     {date}"),
        None => println!("  Expires:     never"),
    }

    Ok(())
}

async fn set_banned(store: &LicenseStore, key: &str, banned: bool) -> Result<(), LicenseError> {
    store.set_banned(key, banned).await?;
    println!("✓ Key {key} {}", if banned { "banned" } else { "unbanned" });
    Ok(())
}

async fn check(store: &LicenseStore, verbose: bool) -> ExitCode {
    let (document, revision) = match store.fetch().await {
        Ok(fetched) => fetched,
        Err(e) => {
            eprintln!("✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = DocumentReport::build(&document, store.key_prefix(), Utc::now().date_naive());

    println!("License document at revision {revision}");
    println!("  Keys:    {}", report.total);
    println!("  Active:  {}", report.active);
    println!("  Banned:  {}", report.banned);
    println!("  Expired: {}", report.expired);

    let problems = [
        ("malformed key", &report.malformed_keys),
        ("more devices than allowed", &report.over_limit),
        ("device limit of zero", &report.zero_limit),
    ];

    for (label, keys) in problems {
        if keys.is_empty() {
            continue;
        }
        println!("  ✗ {} key(s) with {label}", keys.len());
        if verbose {
            for key in keys {
                println!("      {key}");
            }
        }
    }

    if !report.unreadable.is_empty() {
        println!("  ✗ {} key(s) with an unreadable record", report.unreadable.len());
        if verbose {
            for (key, reason) in &report.unreadable {
                println!("      {key}: {reason}");
            }
        }
    }

    if report.is_consistent() {
        println!("\n✓ Document is consistent");
        ExitCode::SUCCESS
    } else {
        println!("\n✗ Document has problems");
        ExitCode::FAILURE
    }
}
