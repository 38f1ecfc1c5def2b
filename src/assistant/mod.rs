//! The assistant service as seen by the sweep.
//!
//! [`Assistant`] is the seam between the sweep and the remote service:
//! a workspace directory, an intent/entity accessor and the two
//! description updates. [`AssistantClient`] implements it over the
//! Watson Assistant v1 REST API; tests implement it in memory.

pub mod client;
pub mod iam;

pub use client::AssistantClient;
pub use iam::IamAuthenticator;

use crate::error::Result;
use crate::model::{Entity, Intent, UpdateResponse, Workspace};
use std::future::Future;

/// Operations the sweep needs from the assistant service.
///
/// List calls fail with an error on any non-success answer. Update calls
/// return the answer's status in [`UpdateResponse`] and only fail when the
/// exchange itself could not complete.
pub trait Assistant {
    /// Every workspace on the instance, in service order.
    fn list_workspaces(&self) -> impl Future<Output = Result<Vec<Workspace>>> + Send;

    fn list_intents(&self, workspace_id: &str) -> impl Future<Output = Result<Vec<Intent>>> + Send;

    fn list_entities(&self, workspace_id: &str)
    -> impl Future<Output = Result<Vec<Entity>>> + Send;

    fn update_intent(
        &self,
        workspace_id: &str,
        intent: &str,
        new_description: &str,
    ) -> impl Future<Output = Result<UpdateResponse>> + Send;

    fn update_entity(
        &self,
        workspace_id: &str,
        entity: &str,
        new_description: &str,
    ) -> impl Future<Output = Result<UpdateResponse>> + Send;
}
