use super::{ControlPlaneApi, ControlPlaneError};
use async_trait::async_trait;
use fleetmail_protocol::{
    events::{AccountStatus, PaymentStatus},
    model::ControlStatus,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpControlPlaneClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpControlPlaneClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn account_url(&self, account_id: &str, path: &str) -> String {
        format!("{}/accounts/{}/{}", self.base_url, account_id, path)
    }
}

#[async_trait]
impl ControlPlaneApi for HttpControlPlaneClient {
    async fn get_status(&self) -> Result<ControlStatus, ControlPlaneError> {
        fetch_json(self.client.get(format!("{}/status", self.base_url))).await
    }

    async fn check_account_allowed(
        &self,
        account_id: &str,
    ) -> Result<AccountStatus, ControlPlaneError> {
        let request = self.client.get(self.account_url(account_id, "status"));
        match fetch_json(request).await {
            Err(ControlPlaneError::Status(404)) => Ok(AccountStatus {
                exists: false,
                paused: false,
            }),
            other => other,
        }
    }

    async fn check_payment(&self, account_id: &str) -> Result<PaymentStatus, ControlPlaneError> {
        fetch_json(self.client.get(self.account_url(account_id, "payment"))).await
    }

    async fn activate_trial(&self, account_id: &str) -> Result<PaymentStatus, ControlPlaneError> {
        fetch_json(self.client.post(self.account_url(account_id, "trial"))).await
    }
}

async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ControlPlaneError> {
    let response = request
        .send()
        .await
        .map_err(|err| ControlPlaneError::Transport(err.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(ControlPlaneError::Status(status.as_u16()));
    }

    response
        .json()
        .await
        .map_err(|err| ControlPlaneError::Decode(err.to_string()))
}
