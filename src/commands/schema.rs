//! Offline commands
//!
//! - `schema` - Print the `item_http` field reference
//! - `validate` - Check the config file without contacting the server

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::{DefaultValue, FieldKind, FieldSpec};

use crate::Context;
use crate::config::Config;
use crate::resource::{HttpItemCodec, item_http, preprocessing};
use crate::state::ItemState;
use crate::ui;

fn kind_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::String => "string".to_string(),
        FieldKind::Bool => "bool".to_string(),
        FieldKind::Enum { .. } => "enum".to_string(),
        FieldKind::List { item } => format!("list of {item}"),
    }
}

fn requirement(field: &FieldSpec) -> String {
    match (&field.default, field.required) {
        (_, true) => "required".to_string(),
        (Some(DefaultValue::String(s)), _) => format!("default {s:?}"),
        (Some(DefaultValue::Bool(b)), _) => format!("default {b}"),
        (None, false) => "optional".to_string(),
    }
}

// ============================================================================
// Schema Command
// ============================================================================

pub fn schema(json: bool) -> Result<()> {
    let schema = item_http::schema();

    if json {
        let out = serde_json::to_string_pretty(&schema).context("Failed to render schema")?;
        println!("{out}");
        return Ok(());
    }

    ui::header(&format!("[{}.<name>]", schema.resource_type));
    let width = schema.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in &schema.fields {
        println!(
            "  {}  {:<24} {} {}",
            format!("{:width$}", field.name).bold(),
            kind_label(&field.kind),
            format!("{:<16}", requirement(field)).dimmed(),
            field.description
        );
        if let FieldKind::Enum { symbols } = &field.kind {
            println!("  {:width$}  {}", "", symbols.join(", ").dimmed());
        }
    }

    ui::section("[[preprocessor]]");
    ui::kv("type", &preprocessing::STEP_TYPES.symbols().join(", "));
    ui::kv("params", "Step parameters, newline separated");
    ui::kv(
        "error_handler",
        &format!(
            "{} (default {:?})",
            preprocessing::ERROR_HANDLERS.symbols().join(", "),
            preprocessing::DEFAULT_ERROR_HANDLER
        ),
    );
    ui::kv("error_handler_params", "Value or message for custom handlers");
    Ok(())
}

// ============================================================================
// Validate Command
// ============================================================================

pub fn validate(ctx: &Context) -> Result<()> {
    let config_path = Config::path(ctx.config_path.as_deref())?;
    let config = Config::load(&config_path)?;
    let codec = HttpItemCodec::new();

    let mut errors = config.validate(&codec);

    // Resolve credentials without logging in
    if let Err(e) = config.api.credentials() {
        errors.push(e.to_string());
    }

    let state_path = ItemState::path(ctx.state_path.as_deref())?;
    let state = ItemState::load(&state_path)?;
    let orphans: Vec<_> = state
        .resources
        .keys()
        .filter_map(|address| address.strip_prefix("item_http."))
        .filter(|name| !config.item_http.contains_key(*name))
        .collect();

    if !errors.is_empty() {
        for e in &errors {
            ui::error(e);
        }
        bail!("{} in {}", ui::count(errors.len(), "error"), config_path.display());
    }

    if !ctx.quiet {
        ui::success(&format!(
            "{} is valid ({})",
            config_path.display(),
            ui::count(config.item_http.len(), "item")
        ));
        for name in orphans {
            ui::warn(&format!("item_http.{name} is tracked but not configured; apply will delete it"));
        }
    }
    Ok(())
}
