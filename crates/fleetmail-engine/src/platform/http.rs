use super::{PlatformApi, PlatformError, Session};
use crate::account::Credentials;
use async_trait::async_trait;
use fleetmail_protocol::{
    events::{LoginRequest, LoginResponse, SendRequest, SendResponse, SendabilityResponse},
    model::{Category, InboundMessage, Mode, Recipient},
};
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Platform collaborator speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlatformClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn account_url(&self, session: &Session, path: &str) -> String {
        format!("{}/accounts/{}/{}", self.base_url, session.account_id, path)
    }

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.header(AUTHORIZATION, format!("Bearer {}", session.token))
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn login(&self, credentials: &Credentials) -> Result<String, PlatformError> {
        let request = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest {
                login: credentials.login.clone(),
                password: credentials.password.clone(),
            });

        let response: LoginResponse = read_json(dispatch(request).await?).await?;
        Ok(response.token)
    }

    async fn list_recipients(
        &self,
        session: &Session,
        mode: Mode,
        category: Category,
    ) -> Result<Vec<Recipient>, PlatformError> {
        let request = self
            .authorized(self.client.get(self.account_url(session, "recipients")), session)
            .query(&[("category", category.as_str()), ("mode", mode.as_str())]);

        read_json(dispatch(request).await?).await
    }

    async fn check_sendable(
        &self,
        session: &Session,
        mode: Mode,
        recipient_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        let path = format!("recipients/{recipient_id}/sendable");
        let request = self
            .authorized(self.client.get(self.account_url(session, &path)), session)
            .query(&[("mode", mode.as_str())]);

        let response: SendabilityResponse = read_json(dispatch(request).await?).await?;
        Ok(response.token.filter(|token| !token.is_empty()))
    }

    async fn send(&self, session: &Session, request: SendRequest) -> Result<(), PlatformError> {
        let builder = self
            .authorized(self.client.post(self.account_url(session, "messages")), session)
            .json(&request);

        let response: SendResponse = read_json(dispatch(builder).await?).await?;
        if response.ok {
            return Ok(());
        }

        Err(PlatformError::Rejected(
            response.reason.unwrap_or_else(|| "unspecified".to_string()),
        ))
    }

    async fn list_inbox(&self, session: &Session) -> Result<Vec<InboundMessage>, PlatformError> {
        let request = self
            .authorized(self.client.get(self.account_url(session, "inbox")), session)
            .query(&[("unreplied", "true")]);

        read_json(dispatch(request).await?).await
    }
}

async fn dispatch(request: RequestBuilder) -> Result<Response, PlatformError> {
    let response = request
        .send()
        .await
        .map_err(|err| PlatformError::Transport(err.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
    response
        .json()
        .await
        .map_err(|err| PlatformError::Transport(format!("malformed response: {err}")))
}

fn classify_status(status: StatusCode, body: &str) -> PlatformError {
    if status == StatusCode::UNAUTHORIZED {
        return PlatformError::Unauthorized;
    }

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return PlatformError::Transport(format!("status {}", status.as_u16()));
    }

    let reason = body.trim();
    if reason.is_empty() {
        PlatformError::Rejected(format!("status {}", status.as_u16()))
    } else {
        PlatformError::Rejected(reason.chars().take(200).collect())
    }
}
