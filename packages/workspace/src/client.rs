//! [`RemoteAuthority`] over HTTP, talking to [`crate::server`].

use crate::server::AUTHOR_HEADER;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use splice_editor::timeline::Timeline;
use splice_editor::{
    AuthorityError, Checkpoint, Committed, Mutation, MutationRequest, RemoteAuthority,
    ReplaceRequest, RollbackRequest, Snapshot,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpAuthority {
    base_url: String,
    author: String,
    client: reqwest::Client,
}

impl HttpAuthority {
    pub fn new(
        base_url: impl Into<String>,
        author: impl Into<String>,
    ) -> Result<Self, AuthorityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(transport)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            author: author.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ids of every timeline the server holds
    pub async fn list(&self) -> Result<Vec<String>, AuthorityError> {
        let response = self
            .client
            .get(format!("{}/timelines", self.base_url))
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    pub async fn checkpoints(&self, timeline_id: &str) -> Result<Vec<Checkpoint>, AuthorityError> {
        let response = self
            .client
            .get(format!("{}/timelines/{}/checkpoints", self.base_url, timeline_id))
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    pub async fn approve(
        &self,
        timeline_id: &str,
        version: u64,
    ) -> Result<Checkpoint, AuthorityError> {
        self.post(
            &format!("/timelines/{}/checkpoints/{}/approve", timeline_id, version),
            &serde_json::json!({}),
        )
        .await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, AuthorityError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .header(AUTHOR_HEADER, &self.author)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }
}

fn transport(e: reqwest::Error) -> AuthorityError {
    AuthorityError::Transport(e.to_string())
}

/// Successful bodies decode as `T`; error bodies carry an [`AuthorityError`]
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthorityError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| AuthorityError::Malformed(format!("unexpected response body: {}", e)));
    }

    let body = response.text().await.map_err(transport)?;
    Err(serde_json::from_str::<AuthorityError>(&body)
        .unwrap_or_else(|_| AuthorityError::Transport(format!("{}: {}", status, body))))
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn fetch(
        &self,
        timeline_id: &str,
        version: Option<u64>,
    ) -> Result<Snapshot, AuthorityError> {
        let mut request = self.client.get(format!("{}/timelines/{}", self.base_url, timeline_id));
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }
        decode(request.send().await.map_err(transport)?).await
    }

    async fn apply(
        &self,
        timeline_id: &str,
        mutation: &Mutation,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError> {
        let body = MutationRequest {
            mutation: mutation.clone(),
            expected_version,
        };
        self.post(&format!("/timelines/{}/{}", timeline_id, mutation.name()), &body)
            .await
    }

    async fn replace(
        &self,
        timeline_id: &str,
        document: Timeline,
        expected_version: Option<u64>,
    ) -> Result<Committed, AuthorityError> {
        let body = ReplaceRequest {
            document,
            expected_version,
        };
        self.post(&format!("/timelines/{}/replace-timeline", timeline_id), &body)
            .await
    }

    async fn rollback(
        &self,
        timeline_id: &str,
        target_version: u64,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError> {
        let body = RollbackRequest {
            target_version,
            expected_version,
        };
        self.post(&format!("/timelines/{}/rollback", timeline_id), &body)
            .await
    }

    async fn ping(&self) -> Result<(), AuthorityError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(transport)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthorityError::Transport(format!("health check returned {}", response.status())))
        }
    }
}
