//! Per-workspace span helpers for the sweep.

use tracing::Span;

use crate::model::{Outcome, Workspace};

/// Start a span for processing one workspace.
///
/// The `sweep.outcome` field is declared empty and filled by
/// [`record_outcome`] once the workspace is done.
pub fn start_workspace_span(workspace: &Workspace) -> Span {
    tracing::info_span!(
        "sweep.workspace",
        "workspace.id" = workspace.workspace_id.as_str(),
        "workspace.name" = workspace.name.as_deref().unwrap_or(""),
        "workspace.language" = workspace.language.as_deref().unwrap_or(""),
        "sweep.outcome" = tracing::field::Empty,
    )
}

/// Record how the workspace ended up on its span.
pub fn record_outcome(span: &Span, outcome: &Outcome) {
    span.record("sweep.outcome", outcome.label());
    if let Outcome::Retrained { kind, name } = outcome {
        span.in_scope(|| {
            tracing::info!(%kind, name = name.as_str(), "retrain triggered");
        });
    }
}
