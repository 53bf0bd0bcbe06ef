//! services/client/src/adapters/http.rs
//!
//! The `HttpClient` port over `reqwest`. Attaches the bearer token and turns a 401
//! into an expired session.

use async_trait::async_trait;
use jobs_dashboard_core::ports::{HttpClient, HttpResponse, PortError, PortResult};
use jobs_dashboard_core::query::QueryParams;
use jobs_dashboard_core::session::SessionManager;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::error::ClientError;

pub struct ReqwestHttpClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionManager,
}

impl ReqwestHttpClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SessionManager,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> PortResult<HttpResponse> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PortError::network(e.to_string()))?;
        self.read(response).await
    }

    async fn read(&self, response: Response) -> PortResult<HttpResponse> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(PortError::Unauthorized);
        }

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(PortError::from_response(status.as_u16(), &body));
        }
        debug!(status = status.as_u16(), bytes = body.len(), "Response received");
        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, path: &str, params: &QueryParams) -> PortResult<HttpResponse> {
        debug!(path, "GET");
        let request = self.client.get(self.url(path)).query(&params.to_pairs());
        self.send(request).await
    }

    async fn post(&self, path: &str, body: &Value) -> PortResult<HttpResponse> {
        debug!(path, "POST");
        let request = self.client.post(self.url(path)).json(body);
        self.send(request).await
    }
}
