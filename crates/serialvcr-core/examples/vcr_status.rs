//! Deck identity and status check
//!
//! Usage:
//!   cargo run --example vcr_status -- PORT
//!   cargo run --example vcr_status -- --config vcr.json
//!
//! Set RUST_LOG=serialvcr_core=debug to see every exchange.

use anyhow::{bail, Context, Result};
use serialvcr_core::protocol::{Vcr, VcrConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1).map(String::as_str) {
        Some("--config") | Some("-c") => {
            let path = args.get(2).context("--config needs a file path")?;
            VcrConfig::from_file(path)?
        }
        Some(port) => VcrConfig::new(port),
        None => bail!("usage: vcr_status PORT | --config FILE"),
    };

    let mut vcr = Vcr::open(&config)
        .with_context(|| format!("failed to open {}", config.port_name))?;

    if vcr.is_a_vcr()? {
        println!("Yes, it is a VCR");
        let device_type = vcr.device_type()?;
        let rom_version = vcr.rom_version()?;
        let rom_hex: String = rom_version.iter().map(|b| format!("{:02x}", b)).collect();
        println!(
            "It's a {} running rom version {}",
            String::from_utf8_lossy(&device_type),
            rom_hex
        );
    } else {
        println!("WARNING: NOT A VCR!");
    }

    vcr.power_on()?;
    println!("{}", vcr.status_sense()?);
    Ok(())
}
