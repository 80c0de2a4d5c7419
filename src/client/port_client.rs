use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::constants::USER_AGENT;
use crate::error::{SyncError, SyncResult};
use crate::logging::log_debug;
use crate::models::port::{AccessTokenRequest, AccessTokenResponse};
use crate::models::{BearerToken, EntityBatch, PortCredentials, UpsertResult};

use super::governor::{Governor, HttpReply};

/// REST client for the Port catalog.
pub struct PortClient {
    client: Client,
    api_url: String,
    blueprint: String,
    governor: Governor,
}

impl PortClient {
    pub fn new(
        api_url: &str,
        blueprint: &str,
        timeout: Duration,
        governor: Governor,
    ) -> SyncResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            blueprint: blueprint.to_string(),
            governor,
        })
    }

    pub fn blueprint(&self) -> &str {
        &self.blueprint
    }

    /// `{api}/blueprints/{blueprint}/entities`, with the blueprint id escaped as one path segment.
    fn entities_url(&self) -> SyncResult<Url> {
        let mut url = Url::parse(&self.api_url).map_err(|e| {
            SyncError::ConfigError(format!("invalid Port API URL '{}': {}", self.api_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SyncError::ConfigError(format!(
                    "Port API URL '{}' cannot take a path",
                    self.api_url
                ))
            })?
            .pop_if_empty()
            .extend(["blueprints", self.blueprint.as_str(), "entities"]);
        Ok(url)
    }

    /// Exchange the client credential pair for a short-lived access token.
    pub async fn authenticate(&self, credentials: &PortCredentials) -> SyncResult<BearerToken> {
        let url = format!("{}/auth/access_token", self.api_url);
        let body = AccessTokenRequest {
            client_id: &credentials.client_id,
            client_secret: &credentials.client_secret,
        };

        let reply = self
            .governor
            .send("port access token", || self.client.post(&url).json(&body).send())
            .await
            .map_err(|e| match e {
                SyncError::TransportError(msg) => SyncError::AuthError(msg),
                other => other,
            })?;

        if !reply.is_success() {
            return Err(SyncError::AuthError(format!(
                "credentials rejected with status {}{}",
                reply.status,
                server_message(&reply)
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default()
            )));
        }

        let token: AccessTokenResponse = reply
            .json()
            .map_err(|_| SyncError::AuthError("unreadable access token response".to_string()))?;

        match token.access_token {
            Some(token) if !token.is_empty() => Ok(BearerToken::new(token)),
            _ => Err(SyncError::AuthError("response did not contain an access token".to_string())),
        }
    }

    /// Upsert the whole batch in one request.
    pub async fn upsert(
        &self,
        token: &BearerToken,
        batch: &EntityBatch,
    ) -> SyncResult<UpsertResult> {
        let url = self.entities_url()?;
        let payload = batch.to_payload(&self.blueprint);

        log_debug(&format!(
            "Upserting {} entities into blueprint '{}'",
            payload.entities.len(),
            self.blueprint
        ));

        let reply = self
            .governor
            .send("port upsert", || {
                self.client
                    .post(url.clone())
                    .query(&[("upsert", "true")])
                    .bearer_auth(token.secret())
                    .json(&payload)
                    .send()
            })
            .await?;

        if !reply.is_success() {
            return Err(SyncError::CatalogWriteError {
                status: reply.status.as_u16(),
                body: reply.body.trim().to_string(),
            });
        }

        // The write already succeeded; the body is informational only.
        let body = reply.body.trim();
        let response = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
        };

        Ok(UpsertResult {
            entities: payload.entities.len(),
            response,
        })
    }
}

fn server_message(reply: &HttpReply) -> Option<String> {
    let value: Value = serde_json::from_str(&reply.body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
