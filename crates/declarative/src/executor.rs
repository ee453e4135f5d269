//! Execution engine - applies a plan with bounded parallelism
//!
//! Each planned change targets a distinct remote object, so changes can run
//! on a thread pool. The reconciler itself stays single-operation and
//! stateless; the only shared pieces are the codec tables and the API client.

use crate::client::{RemoteApi, RemoteEntity};
use crate::codec::ResourceCodec;
use crate::context::{ConfirmCallback, ProgressCallback};
use crate::error::Error;
use crate::planner::{Action, ExecutionPlan, PlannedChange};
use crate::reconciler::Reconciler;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceState};
use rayon::prelude::*;

/// How the host should update its record of one address
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate<C> {
    /// Leave the last synchronized record untouched
    Keep,
    /// Replace the record
    Set(ResourceState<C>),
}

/// Outcome of one planned change
#[derive(Debug, Clone)]
pub struct ChangeOutcome<C> {
    pub address: String,
    pub result: ApplyResult,
    pub state: StateUpdate<C>,
}

/// Everything an execution produced
#[derive(Debug, Clone)]
pub struct ExecuteReport<C> {
    pub summary: ExecuteSummary,
    pub outcomes: Vec<ChangeOutcome<C>>,
}

impl<C> ExecuteReport<C> {
    fn from_outcomes(outcomes: Vec<ChangeOutcome<C>>) -> Self {
        let mut summary = ExecuteSummary::default();
        for outcome in &outcomes {
            summary.add_result(&outcome.result);
        }
        Self { summary, outcomes }
    }

    /// Outcomes that failed, with their error messages
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            ApplyResult::Failed { error } => Some((o.address.as_str(), error.as_str())),
            _ => None,
        })
    }
}

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `reconciler` - Reconciler used for every remote call
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, jobs, verbose)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, asked once before any write
///
/// # Returns
/// Per-address outcomes in plan order, plus a summary
pub fn execute<Co, A, P, K>(
    reconciler: &Reconciler<'_, Co, A>,
    plan: ExecutionPlan<Co::Config>,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut K,
) -> ExecuteReport<Co::Config>
where
    Co: ResourceCodec,
    Co::Entity: RemoteEntity,
    A: RemoteApi<Entity = Co::Entity>,
    P: ProgressCallback,
    K: ConfirmCallback,
{
    let (pending, unchanged): (Vec<_>, Vec<_>) = plan
        .changes
        .into_iter()
        .partition(|c| c.action.is_change());

    let mut outcomes: Vec<ChangeOutcome<Co::Config>> =
        unchanged.into_iter().map(unchanged_outcome).collect();

    if pending.is_empty() {
        return ExecuteReport::from_outcomes(outcomes);
    }

    let skip_reason = if opts.dry_run {
        Some("dry run")
    } else if pending.iter().any(|c| c.action.needs_remote_call())
        && !confirm.confirm(&format!("Apply {} changes?", pending.len()))
    {
        Some("declined")
    } else {
        None
    };
    if let Some(reason) = skip_reason {
        outcomes.extend(pending.into_iter().map(|c| ChangeOutcome {
            address: c.address,
            result: ApplyResult::Skipped {
                reason: reason.to_string(),
            },
            state: StateUpdate::Keep,
        }));
        return ExecuteReport::from_outcomes(outcomes);
    }

    progress.on_batch_start(pending.len());
    let applied = if opts.jobs <= 1 || pending.len() == 1 {
        execute_sequential(reconciler, &pending, opts.verbose, progress)
    } else {
        execute_parallel(reconciler, &pending, opts.jobs, opts.verbose, progress)
    };
    progress.on_batch_complete();

    outcomes.extend(applied);
    outcomes.sort_by(|a, b| a.address.cmp(&b.address));
    ExecuteReport::from_outcomes(outcomes)
}

fn execute_sequential<Co, A, P>(
    reconciler: &Reconciler<'_, Co, A>,
    changes: &[PlannedChange<Co::Config>],
    verbose: bool,
    progress: &mut P,
) -> Vec<ChangeOutcome<Co::Config>>
where
    Co: ResourceCodec,
    Co::Entity: RemoteEntity,
    A: RemoteApi<Entity = Co::Entity>,
    P: ProgressCallback,
{
    let mut outcomes = Vec::with_capacity(changes.len());
    for change in changes {
        progress.on_resource_start(&change.address, describe(&change.action));
        let outcome = apply_change(reconciler, change, verbose);
        progress.on_resource_complete(&outcome.address, &outcome.result);
        outcomes.push(outcome);
    }
    outcomes
}

/// Execute changes in parallel using rayon
fn execute_parallel<Co, A, P>(
    reconciler: &Reconciler<'_, Co, A>,
    changes: &[PlannedChange<Co::Config>],
    jobs: usize,
    verbose: bool,
    progress: &mut P,
) -> Vec<ChangeOutcome<Co::Config>>
where
    Co: ResourceCodec,
    Co::Entity: RemoteEntity,
    A: RemoteApi<Entity = Co::Entity>,
    P: ProgressCallback,
{
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("Failed to create thread pool ({e}), applying sequentially");
            return execute_sequential(reconciler, changes, verbose, progress);
        }
    };

    // The progress callback is not thread-safe; report after the batch.
    let outcomes: Vec<_> = pool.install(|| {
        changes
            .par_iter()
            .map(|change| apply_change(reconciler, change, verbose))
            .collect()
    });

    for outcome in &outcomes {
        progress.on_resource_complete(&outcome.address, &outcome.result);
    }
    outcomes
}

fn unchanged_outcome<C>(change: PlannedChange<C>) -> ChangeOutcome<C> {
    let state = match change.action {
        Action::NoChange { id, current } => StateUpdate::Set(ResourceState::Managed {
            id,
            config: current,
        }),
        _ => StateUpdate::Keep,
    };
    ChangeOutcome {
        address: change.address,
        result: ApplyResult::NoChange,
        state,
    }
}

fn describe<C>(action: &Action<C>) -> &'static str {
    match action {
        Action::Create { .. } => "create",
        Action::Recreate { .. } => "recreate",
        Action::Update { .. } => "update",
        Action::Delete { .. } => "delete",
        Action::Forget { .. } => "forget",
        Action::NoChange { .. } => "no change",
    }
}

/// Apply a single change; `verbose` logs each field it touches
fn apply_change<Co, A>(
    reconciler: &Reconciler<'_, Co, A>,
    change: &PlannedChange<Co::Config>,
    verbose: bool,
) -> ChangeOutcome<Co::Config>
where
    Co: ResourceCodec,
    Co::Entity: RemoteEntity,
    A: RemoteApi<Entity = Co::Entity>,
{
    let address = change.address.clone();
    if verbose {
        for field in &change.changes {
            log::info!(
                "{address} ({}): {} {:?} -> {:?}",
                describe(&change.action),
                field.field,
                field.from,
                field.to
            );
        }
    }
    let (result, state) = match &change.action {
        Action::Create { config } | Action::Recreate { config, .. } => {
            match reconciler.create(config) {
                Ok(state) => (ApplyResult::Created, StateUpdate::Set(state)),
                Err(e) => failed(&address, &e, Some(config)),
            }
        }
        Action::Update { id, config, .. } => match reconciler.update(id, config) {
            Ok(state) => (ApplyResult::Modified, StateUpdate::Set(state)),
            Err(e) => failed(&address, &e, None),
        },
        Action::Delete { id } => match reconciler.delete(id) {
            Ok(state) => (ApplyResult::Removed, StateUpdate::Set(state)),
            Err(e) => failed(&address, &e, None),
        },
        Action::Forget { id } => {
            log::info!("Forgetting {address} ({id} was deleted out-of-band)");
            (ApplyResult::Removed, StateUpdate::Set(ResourceState::Unmanaged))
        }
        Action::NoChange { .. } => (ApplyResult::NoChange, StateUpdate::Keep),
    };
    ChangeOutcome {
        address,
        result,
        state,
    }
}

/// Map an error to a failed result. A create whose object exists but could
/// not be read back is still recorded, so the next plan can converge it.
fn failed<C: Clone>(
    address: &str,
    error: &Error,
    submitted: Option<&C>,
) -> (ApplyResult, StateUpdate<C>) {
    log::warn!("{address}: {error}");
    let state = match (error.orphaned_id(), submitted) {
        (Some(id), Some(config)) => StateUpdate::Set(ResourceState::managed(id, config.clone())),
        _ => StateUpdate::Keep,
    };
    (
        ApplyResult::Failed {
            error: error.to_string(),
        },
        state,
    )
}
