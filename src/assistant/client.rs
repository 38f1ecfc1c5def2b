//! REST client for the Watson Assistant v1 API.
//!
//! Only the handful of endpoints the sweep touches are wrapped here.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wksp_retrain::assistant::{Assistant, AssistantClient};
//! use wksp_retrain::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let client = AssistantClient::new(&config)?;
//!     let workspaces = client.list_workspaces().await?;
//!     println!("{} workspaces", workspaces.len());
//!     Ok(())
//! }
//! ```

use super::Assistant;
use super::iam::IamAuthenticator;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Entity, Intent, UpdateResponse, Workspace};
use reqwest::Url;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct WorkspaceCollection {
    workspaces: Vec<Workspace>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct IntentCollection {
    intents: Vec<Intent>,
}

#[derive(Debug, Deserialize)]
struct EntityCollection {
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct DescriptionUpdate<'a> {
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// Authenticated client for one assistant service instance.
pub struct AssistantClient {
    base_url: Url,
    version: String,
    auth: IamAuthenticator,
    http: reqwest::Client,
}

impl AssistantClient {
    /// Build a client from loaded configuration. Makes no network calls.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("wksp-retrain/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.instance_url).map_err(|e| {
            Error::Config(format!("invalid instance url {}: {e}", config.instance_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "instance url {} cannot carry a path",
                config.instance_url
            )));
        }

        let auth = IamAuthenticator::new(config.api_key.clone(), &config.auth_url, http.clone());

        Ok(Self {
            base_url,
            version: config.api_version.clone(),
            auth,
            http,
        })
    }

    /// `{instance}/v1/<segments...>`, with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::Other(format!("cannot extend url {}", self.base_url)))?;
            path.pop_if_empty().push("v1").extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        debug!(%url, "GET");
        let token = self.auth.token().await?;
        let resp = self
            .http
            .get(url)
            .query(&[("version", self.version.as_str())])
            .query(query)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(api_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn post_description(&self, url: Url, new_description: &str) -> Result<UpdateResponse> {
        debug!(%url, "POST description");
        let token = self.auth.token().await?;
        let resp = self
            .http
            .post(url)
            .query(&[("version", self.version.as_str())])
            .bearer_auth(token.expose_secret())
            .json(&DescriptionUpdate {
                description: new_description,
            })
            .send()
            .await?;

        Ok(UpdateResponse {
            status_code: resp.status().as_u16(),
        })
    }
}

async fn api_error(resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or(body);
    Error::Api { status, message }
}

impl Assistant for AssistantClient {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        let url = self.endpoint(&["workspaces"])?;
        let mut workspaces = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let query: Vec<(&str, &str)> = match cursor.as_deref() {
                Some(c) => vec![("cursor", c)],
                None => Vec::new(),
            };
            let page: WorkspaceCollection = self.get_json(url.clone(), &query).await?;
            workspaces.extend(page.workspaces);

            match page.pagination.and_then(|p| p.next_cursor) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(workspaces)
    }

    async fn list_intents(&self, workspace_id: &str) -> Result<Vec<Intent>> {
        let url = self.endpoint(&["workspaces", workspace_id, "intents"])?;
        let page: IntentCollection = self.get_json(url, &[]).await?;
        Ok(page.intents)
    }

    async fn list_entities(&self, workspace_id: &str) -> Result<Vec<Entity>> {
        let url = self.endpoint(&["workspaces", workspace_id, "entities"])?;
        let page: EntityCollection = self.get_json(url, &[]).await?;
        Ok(page.entities)
    }

    async fn update_intent(
        &self,
        workspace_id: &str,
        intent: &str,
        new_description: &str,
    ) -> Result<UpdateResponse> {
        let url = self.endpoint(&["workspaces", workspace_id, "intents", intent])?;
        self.post_description(url, new_description).await
    }

    async fn update_entity(
        &self,
        workspace_id: &str,
        entity: &str,
        new_description: &str,
    ) -> Result<UpdateResponse> {
        let url = self.endpoint(&["workspaces", workspace_id, "entities", entity])?;
        self.post_description(url, new_description).await
    }
}
