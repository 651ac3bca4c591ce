//! `transit-cli` — operator binary for the transit façade.
//!
//! Startup sequence:
//! 1. Load and validate configuration from `VAULT_*` environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Run the requested operation and print its result to stdout.
//!
//! ```text
//! transit-cli mount
//! transit-cli encrypt <key> <plaintext>
//! transit-cli decrypt <key> <ciphertext>
//! transit-cli rewrap <key> <ciphertext>
//! transit-cli rotate <key>
//! transit-cli set-min-decryption-version <key> <version>
//! ```

mod telemetry;

use anyhow::{bail, Context, Result};
use tracing::info;
use transit::Transit;

const USAGE: &str = "usage: transit-cli <mount|encrypt|decrypt|rewrap|rotate|set-min-decryption-version> [<key> [<value>]]";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let transit = Transit::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init("info")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        enabled = transit.config().enabled,
        "transit-cli starting"
    );

    // -----------------------------------------------------------------------
    // 3. Operation
    // -----------------------------------------------------------------------
    match args.first().map(String::as_str) {
        Some("mount") => {
            transit.mount_transit().await?;
            println!("transit engine mounted");
        }
        Some("encrypt") => {
            let (key, plaintext) = key_and_value(&args)?;
            println!("{}", transit.encrypt(key, plaintext).await?);
        }
        Some("decrypt") => {
            let (key, ciphertext) = key_and_value(&args)?;
            println!("{}", transit.decrypt(key, ciphertext).await?);
        }
        Some("rewrap") => {
            let (key, ciphertext) = key_and_value(&args)?;
            println!("{}", transit.rewrap(key, ciphertext).await?);
        }
        Some("rotate") => {
            let key = key_only(&args)?;
            transit.rotate(key).await?;
            println!("rotated {key}");
        }
        Some("set-min-decryption-version") => {
            let (key, version) = key_and_value(&args)?;
            let version: u64 = version
                .parse()
                .context("minimum decryption version must be an integer")?;
            transit.set_min_decryption_version(key, version).await?;
            println!("minimum decryption version for {key} set to {version}");
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn key_only(args: &[String]) -> Result<&str> {
    match args.get(1) {
        Some(key) => Ok(key.as_str()),
        None => bail!(USAGE),
    }
}

fn key_and_value(args: &[String]) -> Result<(&str, &str)> {
    match (args.get(1), args.get(2)) {
        (Some(key), Some(value)) => Ok((key.as_str(), value.as_str())),
        _ => bail!(USAGE),
    }
}
