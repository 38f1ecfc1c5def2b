//! Core data model.
//!
//! Workspaces, intents and entities are records owned by the assistant
//! service. The sweep only ever reads them and rewrites one description.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// A remote assistant workspace. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Workspace {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            name: None,
            language: None,
            description: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Intents and entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: String,
    #[serde(default)]
    pub description: String,
}

impl Intent {
    pub fn new(intent: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    #[serde(default)]
    pub description: String,
}

impl Entity {
    pub fn new(entity: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            description: description.into(),
        }
    }
}

/// The one object per workspace whose description gets rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trainable {
    Intent(Intent),
    Entity(Entity),
}

impl Trainable {
    pub fn kind(&self) -> TrainableKind {
        match self {
            Trainable::Intent(_) => TrainableKind::Intent,
            Trainable::Entity(_) => TrainableKind::Entity,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Trainable::Intent(intent) => &intent.intent,
            Trainable::Entity(entity) => &entity.entity,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Trainable::Intent(intent) => &intent.description,
            Trainable::Entity(entity) => &entity.description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainableKind {
    Intent,
    Entity,
}

impl std::fmt::Display for TrainableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrainableKind::Intent => "intent",
            TrainableKind::Entity => "entity",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Update response
// ---------------------------------------------------------------------------

/// What the service answered to a description update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResponse {
    pub status_code: u16,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of processing one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The description update was accepted.
    Retrained { kind: TrainableKind, name: String },
    /// The update was rejected or never completed. Recorded for manual retraining.
    Failed { reason: FailureReason },
    /// No intents and no entities. Nothing was touched.
    Skipped,
}

impl Outcome {
    /// Skipped workspaces made no update call and don't consume rate-limit budget.
    pub fn counts_toward_limit(&self) -> bool {
        !matches!(self, Outcome::Skipped)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Retrained { .. } => "retrained",
            Outcome::Failed { .. } => "failed",
            Outcome::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The service answered with something other than the success status.
    Status(u16),
    /// The call itself failed (transport, auth, serialization).
    Error(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Status(code) => write!(f, "status {code}"),
            FailureReason::Error(msg) => write!(f, "{msg}"),
        }
    }
}
