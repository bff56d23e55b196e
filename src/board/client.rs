//! HTTP client for the Trello REST API.
//!
//! Requests authenticate with the key/token pair as query parameters.
//! Configuration comes from [`crate::config::Config`]:
//! - `SPRINT_TRACKER_TRELLO_URL` - Base URL (default: `https://api.trello.com/1`)
//! - `SPRINT_TRACKER_TRELLO_KEY` / `SPRINT_TRACKER_TRELLO_TOKEN` - Credentials

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use super::{BoardApi, HostError};
use crate::models::*;

/// Default URL of the public Trello API.
pub const DEFAULT_TRELLO_URL: &str = "https://api.trello.com/1";

/// Connection settings for [`TrelloClient`].
#[derive(Debug, Clone)]
pub struct TrelloConfig {
    pub base_url: String,
    pub api_key: String,
    pub token: String,
    /// Per-request timeout. A timed out request fails like any other.
    pub timeout: Duration,
}

/// [`BoardApi`] backed by the Trello REST API.
#[derive(Debug, Clone)]
pub struct TrelloClient {
    base_url: String,
    api_key: String,
    token: String,
    client: Client,
}

impl TrelloClient {
    pub fn new(config: TrelloConfig) -> Result<Self, HostError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            token: config.token,
            client,
        })
    }

    /// Build a request with the credential query parameters.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .query(&[("key", self.api_key.as_str()), ("token", self.token.as_str())])
    }

    /// Handle response, converting HTTP errors to HostError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, HostError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    /// Handle a mutation whose response body is not needed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), HostError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    async fn status_error(status: StatusCode, response: reqwest::Response) -> HostError {
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => HostError::NotFound(body),
            StatusCode::BAD_REQUEST => HostError::BadRequest(body),
            StatusCode::UNAUTHORIZED => HostError::Unauthorized,
            _ => HostError::Server(format!("{}: {}", status, body)),
        }
    }
}

#[async_trait]
impl BoardApi for TrelloClient {
    async fn attribute_definitions(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<AttributeDefinition>, HostError> {
        let response = self
            .request(Method::GET, &format!("/boards/{}/customFields", workspace_id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn card(&self, card_id: &str) -> Result<Card, HostError> {
        let response = self
            .request(Method::GET, &format!("/cards/{}", card_id))
            .query(&[
                ("fields", "name,idList,idBoard,idMembers"),
                ("customFieldItems", "true"),
            ])
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn collections(&self, workspace_id: &str) -> Result<Vec<Collection>, HostError> {
        let response = self
            .request(Method::GET, &format!("/boards/{}/lists", workspace_id))
            .query(&[("filter", "open"), ("fields", "name,idBoard")])
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn workspaces(&self) -> Result<Vec<Workspace>, HostError> {
        let response = self
            .request(Method::GET, "/members/me/boards")
            .query(&[("filter", "open"), ("fields", "name")])
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn current_member(&self) -> Result<Member, HostError> {
        let response = self
            .request(Method::GET, "/members/me")
            .query(&[("fields", "username,fullName")])
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn write_attribute(
        &self,
        card_id: &str,
        definition_id: &str,
        payload: &AttributePayload,
    ) -> Result<(), HostError> {
        let response = self
            .request(
                Method::PUT,
                &format!("/cards/{}/customField/{}/item", card_id, definition_id),
            )
            .json(&serde_json::json!({ "value": payload }))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    async fn clear_attribute(&self, card_id: &str, definition_id: &str) -> Result<(), HostError> {
        let response = self
            .request(
                Method::PUT,
                &format!("/cards/{}/customField/{}/item", card_id, definition_id),
            )
            .json(&serde_json::json!({ "value": "" }))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    async fn move_card(&self, card_id: &str, target: &CardMove) -> Result<(), HostError> {
        let mut body = serde_json::json!({
            "idList": target.collection_id,
            "pos": "top",
        });
        if let Some(ref workspace_id) = target.workspace_id {
            body["idBoard"] = serde_json::Value::String(workspace_id.clone());
        }
        let response = self
            .request(Method::PUT, &format!("/cards/{}", card_id))
            .json(&body)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    async fn add_member(&self, card_id: &str, member_id: &str) -> Result<(), HostError> {
        let response = self
            .request(Method::POST, &format!("/cards/{}/idMembers", card_id))
            .json(&serde_json::json!({ "value": member_id }))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    async fn attach(&self, card_id: &str, attachment: &Attachment) -> Result<(), HostError> {
        let response = self
            .request(Method::POST, &format!("/cards/{}/attachments", card_id))
            .json(attachment)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> TrelloConfig {
        TrelloConfig {
            base_url: base_url.to_string(),
            api_key: "key".to_string(),
            token: "token".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = TrelloClient::new(config("https://api.trello.com/1/")).unwrap();
        assert_eq!(client.base_url, "https://api.trello.com/1");
    }

    #[test]
    fn requests_carry_credentials() {
        let client = TrelloClient::new(config(DEFAULT_TRELLO_URL)).unwrap();
        let request = client
            .request(Method::GET, "/members/me")
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.trello.com/1/members/me?key=key&token=token"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let client = TrelloClient::new(TrelloConfig {
            timeout: Duration::from_millis(200),
            ..config("http://127.0.0.1:9")
        })
        .unwrap();
        let result = client.current_member().await;
        assert!(matches!(result, Err(HostError::Http(_))));
    }
}
