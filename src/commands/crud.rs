//! Single-item commands
//!
//! - `show` - Read one tracked item from the server
//! - `import` - Start tracking an item that already exists

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::{ResourceCodec, diff_fields};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::Context;
use crate::engine::Session;
use crate::resource::{self, HttpItemConfig};
use crate::ui;

/// `[item_http.<name>]` table for pasting into the config file
#[derive(Serialize)]
struct Snippet<'a> {
    item_http: BTreeMap<&'a str, &'a HttpItemConfig>,
}

/// Render a config as a TOML table under its address
fn to_snippet(name: &str, config: &HttpItemConfig) -> Result<String> {
    let snippet = Snippet {
        item_http: BTreeMap::from([(name, config)]),
    };
    toml::to_string_pretty(&snippet).context("Failed to render item as TOML")
}

// ============================================================================
// Show Command
// ============================================================================

pub fn show(ctx: &Context, address: &str) -> Result<()> {
    let (_, name) = resource::parse_address(address)?;

    let session = Session::open(ctx)?;
    let Some(tracked) = session.state.get(address) else {
        bail!("{address} is not tracked. Use 'itemctl import {address} <itemid>' to adopt it");
    };

    let current = session
        .reconciler()
        .read(&tracked.id)
        .with_context(|| format!("Failed to read {address}"))?;

    ui::header(address);
    ui::kv("Item ID", &tracked.id);
    ui::kv(
        "Last synced",
        &tracked.last_synced.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    println!();
    for line in to_snippet(name, &current)?.lines() {
        println!("  {line}");
    }

    // Compare the server against the config file, if the item is configured
    if let Some(desired) = session.config.item_http.get(name) {
        let desired = session.codec.materialize(desired);
        let drift = diff_fields(Some(&current), Some(&desired));
        ui::section("Configuration");
        if drift.is_empty() {
            println!("  {} Matches the config file", "✓".green());
        } else {
            for change in drift {
                println!(
                    "  {} {}: {} → {}",
                    "~".yellow(),
                    change.field,
                    ui::show_value(change.from.as_deref()).dimmed(),
                    ui::show_value(change.to.as_deref())
                );
            }
        }
    } else {
        println!();
        ui::warn(&format!("{address} is tracked but not in the config file; apply will delete it"));
    }

    Ok(())
}

// ============================================================================
// Import Command
// ============================================================================

pub fn import(ctx: &Context, address: &str, itemid: &str) -> Result<()> {
    let (_, name) = resource::parse_address(address)?;
    if itemid.trim().is_empty() {
        bail!("Item ID must not be empty");
    }

    ui::header(&format!("Importing {address}"));

    let mut session = Session::open(ctx)?;
    if let Some(existing) = session.state.get(address) {
        bail!("{address} is already tracked as item {}", existing.id);
    }
    if let Some((other, _)) = session
        .state
        .tracked()
        .into_iter()
        .find(|(_, id)| id == itemid)
    {
        bail!("Item {itemid} is already tracked as {other}");
    }

    let config = session
        .reconciler()
        .read(itemid)
        .with_context(|| format!("Failed to read item {itemid}"))?;
    session.state.record(address, itemid, config.clone());
    session.save_state()?;

    ui::success(&format!("Now tracking item {itemid} as {address}"));
    ui::dim("Run 'itemctl plan' to compare it with the config file");
    if !session.config.item_http.contains_key(name) {
        println!();
        ui::info("Add this to the config file to keep it managed:");
        println!();
        for line in to_snippet(name, &config)?.lines() {
            println!("  {line}");
        }
    }
    Ok(())
}
