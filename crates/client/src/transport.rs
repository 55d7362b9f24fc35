use crate::config::AgentConfig;
use crate::error::{ClientError, Result};
use cyt_models::{
    ActiveSessionResponse, ErrorResponse, LoginRequest, LoginResponse, LogoutRequest,
    VerifyRequest, VerifyResponse,
};
use serde::de::DeserializeOwned;
use std::future::Future;

/// Calls the agent makes against the session endpoints.
pub trait SessionApi: Send + Sync + 'static {
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<LoginResponse>> + Send;

    /// `Ok(false)` only when the server explicitly answered `valid: false`.
    fn verify(&self, request: &VerifyRequest) -> impl Future<Output = Result<bool>> + Send;

    fn logout(&self, device_id: &str) -> impl Future<Output = Result<()>> + Send;

    fn has_active_session(
        &self,
        exclude_device_id: Option<&str>,
    ) -> impl Future<Output = Result<bool>> + Send;
}

pub struct HttpSessionApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSessionApi {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        // Backstop only; the agent bounds each call with its own timeout.
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/admin/session/{}", self.base_url, path)
    }
}

impl SessionApi for HttpSessionApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let resp = self
            .http
            .post(self.url("login"))
            .json(request)
            .send()
            .await
            .map_err(map_transport)?;
        handle_response(resp).await
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<bool> {
        let resp = self
            .http
            .post(self.url("verify"))
            .json(request)
            .send()
            .await
            .map_err(map_transport)?;
        let body: VerifyResponse = handle_response(resp).await?;
        Ok(body.valid)
    }

    async fn logout(&self, device_id: &str) -> Result<()> {
        let request = LogoutRequest {
            device_id: Some(device_id.to_string()),
        };
        let resp = self
            .http
            .post(self.url("logout"))
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;
        let _: serde_json::Value = handle_response(resp).await?;
        Ok(())
    }

    async fn has_active_session(&self, exclude_device_id: Option<&str>) -> Result<bool> {
        let mut req = self.http.get(self.url("verify"));
        if let Some(device_id) = exclude_device_id {
            req = req.query(&[("excludeDeviceId", device_id)]);
        }
        let resp = req.send().await.map_err(map_transport)?;
        let body: ActiveSessionResponse = handle_response(resp).await?;
        Ok(body.has_active_session)
    }
}

fn map_transport(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Transport(err)
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    resp.json().await.map_err(map_transport)
}
