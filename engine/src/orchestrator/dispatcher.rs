//! Capability dispatcher
//!
//! Runs one task per workflow entry on a [`JoinSet`], each under its own
//! timeout, and waits for all of them. Whatever a capability does (return an
//! error, panic, stall, or produce a non-numeric confidence) it ends up as
//! exactly one [`CapabilityResult`] for its entry.
//!
//! Dropping the future returned by [`Dispatcher::dispatch`] drops the
//! `JoinSet`, which aborts every capability still running.

use super::types::{panic_message, CapabilityResult, WorkflowEntry};
use crate::capabilities::CapabilityRegistry;
use futures::FutureExt;
use indexmap::IndexMap;
use sdk::{clamp_unit, CapabilityOutput};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Capability results keyed by id, in workflow order
pub type CapabilityOutputs = IndexMap<String, CapabilityResult>;

pub const DEFAULT_CAPABILITY_TIMEOUT: Duration = Duration::from_secs(60);

pub const ERR_TIMED_OUT: &str = "timed out";
pub const ERR_NOT_REGISTERED: &str = "capability not registered";
pub const ERR_ABORTED: &str = "task aborted";

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run every workflow entry concurrently and collect one result each
    pub async fn dispatch(&self, text: Arc<str>, workflow: &[WorkflowEntry]) -> CapabilityOutputs {
        let mut slots: Vec<Option<CapabilityResult>> = (0..workflow.len()).map(|_| None).collect();
        let mut set = JoinSet::new();

        for (idx, entry) in workflow.iter().enumerate() {
            let Some(capability) = self.registry.get(&entry.capability_id) else {
                tracing::warn!(capability = %entry.capability_id, "Capability not registered");
                slots[idx] = Some(CapabilityResult::unavailable(
                    &entry.capability_id,
                    ERR_NOT_REGISTERED,
                    Duration::ZERO,
                ));
                continue;
            };

            let text = Arc::clone(&text);
            let context = entry.task_context();
            let id = entry.capability_id.clone();
            let limit = self.timeout;

            set.spawn(async move {
                let started = Instant::now();
                let run = AssertUnwindSafe(capability.run(&text, &context)).catch_unwind();
                let outcome = tokio::time::timeout(limit, run).await;
                let elapsed = started.elapsed();

                let result = match outcome {
                    Err(_) => CapabilityResult::unavailable(&id, ERR_TIMED_OUT, elapsed),
                    Ok(Err(panic)) => CapabilityResult::unavailable(
                        &id,
                        format!("capability panicked: {}", panic_message(panic.as_ref())),
                        elapsed,
                    ),
                    Ok(Ok(Err(e))) => CapabilityResult::unavailable(&id, e.to_string(), elapsed),
                    Ok(Ok(Ok(output))) => match check_output(output) {
                        Ok(output) => CapabilityResult::success(&id, output, elapsed),
                        Err(reason) => CapabilityResult::unavailable(&id, reason, elapsed),
                    },
                };

                (idx, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    log_result(&result);
                    slots[idx] = Some(result);
                }
                Err(e) => tracing::warn!(%e, "Capability task failed to join"),
            }
        }

        workflow
            .iter()
            .zip(slots)
            .map(|(entry, slot)| {
                let result = slot.unwrap_or_else(|| {
                    CapabilityResult::unavailable(&entry.capability_id, ERR_ABORTED, Duration::ZERO)
                });
                (entry.capability_id.clone(), result)
            })
            .collect()
    }
}

/// Reject non-finite confidences and clamp the rest to [0, 1]
fn check_output(mut output: CapabilityOutput) -> Result<CapabilityOutput, String> {
    match output.confidence {
        Some(confidence) if !confidence.is_finite() => {
            Err("malformed output: confidence is not a number".to_string())
        }
        _ => {
            output.confidence = output.confidence.map(clamp_unit);
            Ok(output)
        }
    }
}

fn log_result(result: &CapabilityResult) {
    let elapsed_ms = result.execution_time.as_millis() as u64;
    match &result.error {
        None => tracing::debug!(
            capability = %result.capability_id,
            elapsed_ms,
            confidence = ?result.confidence,
            "Capability succeeded"
        ),
        Some(error) => tracing::warn!(
            capability = %result.capability_id,
            elapsed_ms,
            error = %error,
            "Capability unavailable"
        ),
    }
}
