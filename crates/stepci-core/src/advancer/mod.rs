//! Sequencing state machine driving a unit through its steps.
//!
//! The only state is the order annotation of the unit. Each pass reads it together with
//! the observed container statuses and decides at most one transition:
//!
//! ```text
//!   0 ──(phase Running)──▶ 1 ──(step 1 exit 0)──▶ 2 ─ … ─▶ N
//!                          │                      │
//!                          └──(exit ≠ 0)──▶ -1 ◀──┘
//! ```
//!
//! `-1` and a `Succeeded` phase are terminal. Everything else is a no-op until the
//! container holding the gate terminates.
use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};

use stepci_model::{ORDER_FAILED, TaskOrder, UnitPhase, WorkloadUnit};

use crate::{
    context::BuildContext,
    error::CoreError,
    metrics::MetricsHandle,
    plane::ControlPlane,
};

/// Outcome of one advancer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing to do; no write was performed.
    Unchanged,
    /// The unit started running; the gate of step 1 was opened.
    Started,
    /// Step `from` exited 0; the gate of step `to` was opened.
    Advanced { from: usize, to: usize },
    /// Step `step` exited non-zero; the unit is marked failed for good.
    Failed { step: usize, exit_code: i32 },
}

impl Advance {
    /// Order change this outcome persists, if any.
    pub fn transition(&self) -> Option<(TaskOrder, TaskOrder)> {
        match *self {
            Advance::Unchanged => None,
            Advance::Started => Some((TaskOrder::NotStarted, TaskOrder::Step(1))),
            Advance::Advanced { from, to } => Some((TaskOrder::Step(from), TaskOrder::Step(to))),
            Advance::Failed { step, .. } => Some((TaskOrder::Step(step), TaskOrder::Failed)),
        }
    }
}

/// Decide the next transition of `unit` without touching the control plane.
///
/// Checks, in order: `Succeeded` phase, sticky failure, annotation validity, `Running`
/// phase, then the status of the container holding the gate. A missing or out-of-domain
/// annotation is an error and is never repaired.
pub fn next_transition(unit: &WorkloadUnit) -> Result<Advance, CoreError> {
    let phase = unit.phase();
    if phase == UnitPhase::Succeeded {
        trace!("unit succeeded");
        return Ok(Advance::Unchanged);
    }
    if unit.raw_order() == Some(ORDER_FAILED) {
        trace!("unit already failed");
        return Ok(Advance::Unchanged);
    }

    let order = unit.order().map_err(|source| CoreError::Annotation {
        unit: unit.metadata.key(),
        source,
    })?;
    if phase != UnitPhase::Running {
        trace!(%phase, "unit not running");
        return Ok(Advance::Unchanged);
    }

    let steps = unit.spec.containers.len();
    match order {
        TaskOrder::NotStarted => Ok(Advance::Started),
        TaskOrder::Failed => Ok(Advance::Unchanged),
        TaskOrder::Step(k) if order.is_last(steps) => {
            trace!(step = k, "last step released");
            Ok(Advance::Unchanged)
        }
        TaskOrder::Step(k) => {
            let container = &unit.spec.containers[k - 1];
            let exit_code = unit
                .container_status(&container.name)
                .and_then(|status| status.exit_code());
            match exit_code {
                None => {
                    trace!(step = k, container = %container.name, "step still running");
                    Ok(Advance::Unchanged)
                }
                Some(0) => Ok(Advance::Advanced { from: k, to: k + 1 }),
                Some(exit_code) => Ok(Advance::Failed { step: k, exit_code }),
            }
        }
    }
}

/// Applies [`next_transition`] to stored units.
pub struct SequenceAdvancer {
    plane: Arc<dyn ControlPlane>,
    metrics: MetricsHandle,
}

impl SequenceAdvancer {
    pub fn new(plane: Arc<dyn ControlPlane>, ctx: &BuildContext) -> Self {
        Self {
            plane,
            metrics: ctx.metrics().clone(),
        }
    }

    /// Run one pass over `unit` as read from the control plane.
    ///
    /// A transition costs exactly one `update`, carrying the resource version of `unit`.
    /// A concurrent writer makes it fail with a conflict, which is returned as is.
    #[instrument(level = "debug", skip_all, fields(unit = %unit.metadata.key()))]
    pub async fn advance(&self, unit: WorkloadUnit) -> Result<Advance, CoreError> {
        let advance = next_transition(&unit)?;
        let Some((from, to)) = advance.transition() else {
            return Ok(advance);
        };

        let key = unit.metadata.key();
        let mut next = unit;
        next.set_order(to);
        self.plane
            .update(&next)
            .await
            .map_err(|source| CoreError::Update {
                unit: key.clone(),
                source,
            })?;
        self.metrics.record_transition(from, to);

        let steps = next.spec.containers.len();
        match advance {
            Advance::Failed { step, exit_code } => {
                warn!(unit = %key, step, exit_code, "step failed, unit halted")
            }
            Advance::Advanced { to: step, .. } if to.is_last(steps) => {
                info!(unit = %key, step, "last step released")
            }
            _ => debug!(unit = %key, %from, %to, "order advanced"),
        }
        Ok(advance)
    }
}
