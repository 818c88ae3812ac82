pub mod config;
pub mod history;
pub mod project;
pub mod session;
pub mod stats;

use deepwork_core::{Config, Store};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config and open the store seeded from it.
pub fn open_store() -> Result<(Config, Store), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = Store::open(&config.seed_project)?;
    Ok((config, store))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
