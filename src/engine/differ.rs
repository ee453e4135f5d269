//! Plan and result display

use crate::resource::HttpItemConfig;
use crate::ui;
use colored::{ColoredString, Colorize};
use declarative::{Action, ExecuteReport, ExecuteSummary, ExecutionPlan, FieldChange, PlannedChange};

fn symbol<C>(action: &Action<C>) -> ColoredString {
    let s = action.symbol();
    match action {
        Action::Create { .. } => s.green(),
        Action::Recreate { .. } => s.magenta(),
        Action::Update { .. } => s.yellow(),
        Action::Delete { .. } | Action::Forget { .. } => s.red(),
        Action::NoChange { .. } => s.dimmed(),
    }
}

fn headline<C>(change: &PlannedChange<C>) -> String {
    let note = match &change.action {
        Action::Create { .. } => "will be created".to_string(),
        Action::Recreate { stale_id, .. } => {
            format!("{stale_id} was deleted outside itemctl, will be created again")
        }
        Action::Update { id, .. } => format!("{id} will be updated in place"),
        Action::Delete { id } => format!("{id} will be deleted"),
        Action::Forget { id } => format!("{id} is already gone, will be forgotten"),
        Action::NoChange { id, .. } => format!("{id} is up to date"),
    };
    format!(
        "  {} {} {}",
        symbol(&change.action),
        change.address.bold(),
        format!("({note})").dimmed()
    )
}

fn field_line(change: &FieldChange) -> String {
    if change.is_addition() {
        format!(
            "      {} {} = {}",
            "+".green(),
            change.field,
            ui::show_value(change.to.as_deref())
        )
    } else if change.is_removal() {
        format!(
            "      {} {} = {}",
            "-".red(),
            change.field,
            ui::show_value(change.from.as_deref()).dimmed()
        )
    } else {
        format!(
            "      {} {}: {} → {}",
            "~".yellow(),
            change.field,
            ui::show_value(change.from.as_deref()).dimmed(),
            ui::show_value(change.to.as_deref())
        )
    }
}

/// Lines describing a plan; unchanged resources only when verbose
pub fn render_plan<C>(plan: &ExecutionPlan<C>, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for change in &plan.changes {
        if !change.action.is_change() && !verbose {
            continue;
        }
        lines.push(headline(change));
        if matches!(change.action, Action::Update { .. }) || verbose {
            lines.extend(change.changes.iter().map(field_line));
        }
    }
    lines
}

/// Print a plan followed by its one-line summary
pub fn display_plan(plan: &ExecutionPlan<HttpItemConfig>, verbose: bool) {
    let summary = plan.summary();
    if !summary.has_changes() {
        println!();
        println!(
            "  {} No changes. {} match the configuration.",
            "✓".green(),
            ui::count(summary.unchanged, "item")
        );
        return;
    }

    println!();
    for line in render_plan(plan, verbose) {
        println!("{line}");
    }
    println!();
    println!(
        "  {} {} to add, {} to change, {} to destroy.",
        "Plan:".bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Configuration applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Configuration applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", ui::count(summary.created, "item"));
    }
    if summary.modified > 0 {
        println!("    • {} modified", ui::count(summary.modified, "item"));
    }
    if summary.removed > 0 {
        println!("    • {} removed", ui::count(summary.removed, "item"));
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", ui::count(summary.skipped, "item"));
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}

/// Print failed addresses with their errors
pub fn print_failures<C>(report: &ExecuteReport<C>) {
    for (address, error) in report.failures() {
        ui::error(&format!("{address}: {error}"));
    }
}
