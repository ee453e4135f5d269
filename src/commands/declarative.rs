//! Declarative commands
//!
//! - `plan` - Preview what apply would change
//! - `apply` - Make the server match the configuration
//! - `destroy` - Delete tracked items
//! - `refresh` - Re-read tracked items into the state file

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    AutoConfirm, ExecuteOptions, ExecuteReport, ExecutionPlan, ReadOutcome, build_plan, execute,
};
use std::collections::BTreeMap;

use crate::Context;
use crate::engine::{Session, differ};
use crate::progress::{self, BarProgress, PromptConfirm};
use crate::resource::HttpItemConfig;
use crate::ui;

type Plan = ExecutionPlan<HttpItemConfig>;

/// Re-read every tracked item and diff it against `desired`
fn build(
    ctx: &Context,
    session: &Session,
    desired: &BTreeMap<String, HttpItemConfig>,
    target: Option<&str>,
) -> Result<Plan> {
    let tracked = session.state.tracked();
    let pb = (!ctx.quiet && !tracked.is_empty()).then(|| {
        progress::spinner(&format!(
            "Refreshing {}...",
            ui::count(tracked.len(), "tracked item")
        ))
    });
    let plan = build_plan(&session.reconciler(), desired, &tracked);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let plan = plan.map_err(|e| {
        let invalid = e.is_codec_error();
        let err = anyhow::Error::new(e);
        if invalid {
            err.context("The config file is invalid, run 'itemctl validate' for details")
        } else {
            err
        }
    })?;
    Ok(plan.filter_by_target(target))
}

fn run(
    ctx: &Context,
    session: &Session,
    plan: Plan,
    opts: &ExecuteOptions,
    yes: bool,
) -> ExecuteReport<HttpItemConfig> {
    let mut progress = BarProgress::new(ctx.quiet);
    let reconciler = session.reconciler();
    if yes {
        execute(&reconciler, plan, opts, &mut progress, &mut AutoConfirm)
    } else {
        execute(&reconciler, plan, opts, &mut progress, &mut PromptConfirm)
    }
}

/// Record outcomes, save, and turn failures into an error
fn finish(session: &mut Session, report: &ExecuteReport<HttpItemConfig>, dry_run: bool) -> Result<()> {
    if !dry_run {
        let changed = session.state.apply_outcomes(&report.outcomes);
        session.save_state()?;
        log::debug!("Updated {changed} state records");
    }

    differ::print_summary(&report.summary);
    differ::print_failures(report);
    if !report.summary.is_success() {
        bail!(
            "{} of {} failed",
            report.summary.failed,
            ui::count(report.summary.total(), "change")
        );
    }
    Ok(())
}

// ============================================================================
// Plan Command
// ============================================================================

pub fn plan(ctx: &Context, target: Option<&str>) -> Result<()> {
    ui::header("Execution Plan");

    let session = Session::open(ctx)?;
    let desired = session.config.http_items();
    let plan = build(ctx, &session, &desired, target)?;
    differ::display_plan(&plan, ctx.verbose > 0);
    Ok(())
}

// ============================================================================
// Apply Command
// ============================================================================

pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool, yes: bool, jobs: usize) -> Result<()> {
    ui::header("Applying Configuration");

    if dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let mut session = Session::open(ctx)?;
    let desired = session.config.http_items();
    let plan = build(ctx, &session, &desired, target)?;
    differ::display_plan(&plan, ctx.verbose > 0);
    let has_changes = plan.summary().has_changes();

    let opts = ExecuteOptions {
        dry_run,
        jobs,
        verbose: ctx.verbose > 0,
    };
    println!();
    let report = run(ctx, &session, plan, &opts, yes);
    if !has_changes {
        if !dry_run {
            session.state.apply_outcomes(&report.outcomes);
            session.save_state()?;
        }
        return Ok(());
    }
    finish(&mut session, &report, dry_run)
}

// ============================================================================
// Destroy Command
// ============================================================================

pub fn destroy(ctx: &Context, target: Option<&str>, yes: bool) -> Result<()> {
    ui::header("Destroying Items");

    let mut session = Session::open(ctx)?;
    let plan = build(ctx, &session, &BTreeMap::new(), target)?;
    if plan.summary().removals == 0 {
        ui::info("Nothing to destroy");
        return Ok(());
    }
    differ::display_plan(&plan, ctx.verbose > 0);

    println!();
    let report = run(ctx, &session, plan, &ExecuteOptions::default(), yes);
    finish(&mut session, &report, false)
}

// ============================================================================
// Refresh Command
// ============================================================================

pub fn refresh(ctx: &Context) -> Result<()> {
    ui::header("Refreshing State");

    let mut session = Session::open(ctx)?;
    let tracked = session.state.tracked();
    if tracked.is_empty() {
        ui::info("No tracked items");
        return Ok(());
    }

    let mut results = Vec::with_capacity(tracked.len());
    {
        let reconciler = session.reconciler();
        for (address, id) in &tracked {
            results.push((address, id, reconciler.refresh(id)));
        }
    }

    let mut failed = 0;
    for (address, id, result) in results {
        match result {
            Ok(ReadOutcome::Present(config)) => {
                let drifted = session
                    .state
                    .get(address)
                    .is_some_and(|r| r.config != config);
                session.state.record(address, id, config);
                if drifted {
                    println!("  {} {} {}", "~".yellow(), address, "(changed on server)".dimmed());
                } else if !ctx.quiet {
                    println!("  {} {}", "✓".green(), address);
                }
            }
            Ok(ReadOutcome::Gone) => {
                session.state.forget(address);
                println!(
                    "  {} {} {}",
                    "-".red(),
                    address,
                    format!("({id} no longer exists, forgotten)").dimmed()
                );
            }
            Err(e) => {
                failed += 1;
                ui::error(&format!("{address}: {e}"));
            }
        }
    }

    session.save_state()?;
    if failed > 0 {
        bail!("{} could not be refreshed", ui::count(failed, "item"));
    }
    println!();
    ui::success(&format!("Refreshed {}", ui::count(tracked.len(), "item")));
    Ok(())
}
