//! The `cortex counts` command.

use anyhow::{bail, Result};
use comfy_table::{Cell, Table};

use cortex_core::config::CortexConfig;
use cortex_core::model::{Region, Scope, System};
use cortex_core::navigator::{format_options, region_options, system_options, SelectionOption};
use cortex_core::persistence::ProgressStore;

use super::{load_content, open_storage};

pub fn execute(config: &CortexConfig, region: Option<String>, system: Option<String>) -> Result<()> {
    let content = load_content(config)?;

    let region: Option<Scope<Region>> = region.map(|r| r.parse()).transpose().map_err(anyhow::Error::msg)?;
    let system: Option<Scope<System>> = system.map(|s| s.parse()).transpose().map_err(anyhow::Error::msg)?;

    match (region, system) {
        (None, None) => {
            println!("Regions:");
            print_options(&region_options(&content));
            if ProgressStore::new(open_storage(config)).exists() {
                println!("A saved quiz is waiting: run `cortex quiz --resume` to continue.");
            }
        }
        (Some(region), None) => {
            println!("Systems in {region}:");
            print_options(&system_options(&content, region));
        }
        (Some(region), Some(system)) => {
            println!("Formats for {region} - {system}:");
            print_options(&format_options(&content, region, system));
        }
        (None, Some(_)) => bail!("--system needs --region"),
    }
    Ok(())
}

fn print_options<T>(options: &[SelectionOption<T>]) {
    let mut table = Table::new();
    table.set_header(vec!["Choice", "Questions", "Available"]);
    for option in options {
        table.add_row(vec![
            Cell::new(&option.label),
            Cell::new(option.count),
            Cell::new(if option.enabled { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
}
