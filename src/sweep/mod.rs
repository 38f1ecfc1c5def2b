//! The retraining sweep.
//!
//! Walks every workspace once, rewrites the description of its first
//! intent (or first entity), and records the workspaces whose update
//! failed so they can be retrained by hand. A [`Throttle`] keeps the
//! sweep inside the service's rate limit.

pub mod retry_log;
pub mod throttle;

pub use retry_log::{RETRY_LOG_FILE, RetryLog};
pub use throttle::Throttle;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use opentelemetry::KeyValue;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Instrument, error, info, warn};

use crate::assistant::Assistant;
use crate::error::Result;
use crate::model::{FailureReason, Outcome, Trainable, Workspace};
use crate::telemetry::{metrics, sweep as spans};

/// Tunables for a sweep. The defaults match the service's limits.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Workspaces processed per rate-limit window.
    pub limit: u32,
    /// Cooldown once `limit` is reached.
    pub window: Duration,
    /// Descriptions exactly this long are uppercased instead of extended.
    pub character_limit: usize,
    /// Token appended to descriptions.
    pub suffix: String,
    /// Update status treated as success.
    pub success_status: u16,
    pub retry_log: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            limit: 30,
            window: Duration::from_secs(1800),
            character_limit: 128,
            suffix: "RETRAINED".to_string(),
            success_status: 200,
            retry_log: PathBuf::from(RETRY_LOG_FILE),
        }
    }
}

/// What a sweep did, workspace ids grouped by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub retrained: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
    /// Cooldowns taken during this sweep.
    pub pauses: u32,
    /// Throttle counter when the sweep finished.
    pub counter: u32,
}

impl SweepReport {
    fn record(&mut self, workspace_id: &str, outcome: &Outcome) {
        let bucket = match outcome {
            Outcome::Retrained { .. } => &mut self.retrained,
            Outcome::Failed { .. } => &mut self.failed,
            Outcome::Skipped => &mut self.skipped,
        };
        bucket.push(workspace_id.to_string());
    }

    /// Workspaces that made an update call, successful or not.
    pub fn processed(&self) -> usize {
        self.retrained.len() + self.failed.len()
    }
}

/// Description that triggers a retrain without growing past the field limit.
///
/// A description already at `character_limit` characters is uppercased;
/// anything else gets ` <suffix>` appended.
pub fn new_description(current: &str, character_limit: usize, suffix: &str) -> String {
    if current.chars().count() == character_limit {
        current.to_uppercase()
    } else {
        format!("{current} {suffix}")
    }
}

/// First intent of the workspace, else its first entity, else nothing.
pub async fn select_trainable<A: Assistant>(
    assistant: &A,
    workspace_id: &str,
) -> Result<Option<Trainable>> {
    if let Some(intent) = assistant.list_intents(workspace_id).await?.into_iter().next() {
        return Ok(Some(Trainable::Intent(intent)));
    }

    warn!(workspace_id, "workspace has no intents, trying entities");
    Ok(assistant
        .list_entities(workspace_id)
        .await?
        .into_iter()
        .next()
        .map(Trainable::Entity))
}

/// The retraining sweep. Owns the throttle and the retry log.
pub struct Sweep {
    config: SweepConfig,
    throttle: Throttle,
    retry_log: RetryLog,
    progress: ProgressBar,
}

impl Sweep {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            throttle: Throttle::new(config.limit, config.window),
            retry_log: RetryLog::new(config.retry_log.clone()),
            progress: ProgressBar::hidden(),
            config,
        }
    }

    /// Draw a progress bar on stdout while sweeping.
    ///
    /// Log lines go to stderr, so the bar and the logs don't overwrite
    /// each other.
    pub fn show_progress(mut self) -> Self {
        let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        self.progress = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout())
            .with_style(style);
        self
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    pub fn retry_log(&self) -> &RetryLog {
        &self.retry_log
    }

    /// Run one sweep over every workspace the directory lists.
    ///
    /// Update failures are recorded and the sweep moves on. Errors from
    /// listing workspaces, intents or entities, or from writing the retry
    /// log, end the sweep.
    pub async fn run<A: Assistant>(&mut self, assistant: &A) -> Result<SweepReport> {
        let workspaces = assistant.list_workspaces().await?;
        info!(count = workspaces.len(), "retraining workspaces");

        self.progress.set_length(workspaces.len() as u64);
        let mut report = SweepReport::default();

        for workspace in &workspaces {
            let workspace_id = workspace.workspace_id.as_str();
            self.progress
                .set_message(format!("processing workspace {workspace_id}"));

            let span = spans::start_workspace_span(workspace);
            let outcome = self
                .process(assistant, workspace)
                .instrument(span.clone())
                .await?;
            spans::record_outcome(&span, &outcome);
            metrics::workspaces_processed().add(1, &[KeyValue::new("outcome", outcome.label())]);
            report.record(workspace_id, &outcome);

            if outcome.counts_toward_limit() && self.throttle.tick().await {
                report.pauses += 1;
            }
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        report.counter = self.throttle.count();

        info!(
            retrained = report.retrained.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            pauses = report.pauses,
            "sweep finished"
        );
        Ok(report)
    }

    async fn process<A: Assistant>(&self, assistant: &A, workspace: &Workspace) -> Result<Outcome> {
        let workspace_id = workspace.workspace_id.as_str();

        let Some(target) = select_trainable(assistant, workspace_id).await? else {
            warn!(workspace_id, "workspace has neither intents nor entities, skipping");
            return Ok(Outcome::Skipped);
        };

        let description = new_description(
            target.description(),
            self.config.character_limit,
            &self.config.suffix,
        );

        let result = match &target {
            Trainable::Intent(intent) => {
                assistant
                    .update_intent(workspace_id, &intent.intent, &description)
                    .await
            }
            Trainable::Entity(entity) => {
                assistant
                    .update_entity(workspace_id, &entity.entity, &description)
                    .await
            }
        };

        let outcome = match result {
            Ok(resp) if resp.status_code == self.config.success_status => Outcome::Retrained {
                kind: target.kind(),
                name: target.name().to_string(),
            },
            Ok(resp) => Outcome::Failed {
                reason: FailureReason::Status(resp.status_code),
            },
            Err(e) => {
                error!(workspace_id, error = %e, "update call failed");
                Outcome::Failed {
                    reason: FailureReason::Error(e.to_string()),
                }
            }
        };

        if let Outcome::Failed { reason } = &outcome {
            warn!(
                workspace_id,
                %reason,
                retry_log = %self.retry_log.path().display(),
                "could not update workspace, adding it to the manual retry log"
            );
            self.retry_log.record(workspace_id).await?;
        }

        Ok(outcome)
    }
}

impl Default for Sweep {
    fn default() -> Self {
        Self::new(SweepConfig::default())
    }
}
