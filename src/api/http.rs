use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::Deserialize;
use std::time::Duration;

use super::{ActionError, AdminAction, AdminBackend};
use crate::model::ConfigSnapshot;

const ACTION_PATH: &str = "/api/admin/user";
const CONFIG_PATH: &str = "/api/admin/config";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// reqwest-backed client for the admin API.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    action_url: String,
    config_url: String,
    cookie: Option<String>,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        cookie: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ActionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("usrcfg-admin/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ActionError::Network(e.to_string()))?;
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            action_url: format!("{base}{ACTION_PATH}"),
            config_url: format!("{base}{CONFIG_PATH}"),
            cookie,
        })
    }

    pub fn action_url(&self) -> &str {
        &self.action_url
    }

    fn with_cookie(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cookie {
            Some(c) => req.header(COOKIE, c),
            None => req,
        }
    }
}

/// Turn a failed response into a rejection, using `{ "error": ... }` when present.
async fn rejection(response: reqwest::Response) -> ActionError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.error);
    ActionError::rejected(status, message)
}

#[async_trait]
impl AdminBackend for HttpBackend {
    async fn submit(&self, action: &AdminAction) -> Result<(), ActionError> {
        tracing::debug!(action = action.name(), url = %self.action_url, "posting admin action");
        let response = self
            .with_cookie(self.client.post(&self.action_url))
            .header(CONTENT_TYPE, "application/json")
            .json(action)
            .send()
            .await
            .map_err(|e| ActionError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let err = rejection(response).await;
            tracing::warn!(action = action.name(), error = %err, "admin action rejected");
            Err(err)
        }
    }

    async fn fetch_config(&self) -> Result<ConfigSnapshot, ActionError> {
        let response = self
            .with_cookie(self.client.get(&self.config_url))
            .send()
            .await
            .map_err(|e| ActionError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        response
            .json::<ConfigSnapshot>()
            .await
            .map_err(|e| ActionError::Decode(e.to_string()))
    }
}
