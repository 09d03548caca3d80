//! `AuthApi` over `reqwest` for the native front end.
//!
//! ERROR HANDLING
//! ==============
//! Anything that stops a response from arriving (DNS, refused connection,
//! timeout) is `AuthError::Transport`. Responses are classified with the
//! core's `check_status` so the CLI and the browser agree on every status.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tavolo::api::{self, AuthApi};
use tavolo::config::ApiConfig;
use tavolo::error::AuthError;
use tavolo::types::{Credentials, Identity, Token};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    http: reqwest::Client,
    config: ApiConfig,
}

impl HttpAuthApi {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, AuthError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;
        api::check_status(status, body)
    }
}

fn transport(e: reqwest::Error) -> AuthError {
    AuthError::Transport(e.to_string())
}

#[async_trait::async_trait(?Send)]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<Token, AuthError> {
        let request = self
            .http
            .post(self.config.endpoint(api::LOGIN_PATH))
            .header(CONTENT_TYPE, api::FORM_CONTENT_TYPE)
            .body(api::login_form_body(credentials));
        let body = self.send(request).await?;
        api::parse_token_response(&body)
    }

    async fn me(&self, token: &Token) -> Result<Identity, AuthError> {
        let request = self
            .http
            .get(self.config.endpoint(api::ME_PATH))
            .header(AUTHORIZATION, api::bearer(token));
        let body = self.send(request).await?;
        api::parse_identity(&body)
    }

    async fn get(&self, path: &str, token: Option<&Token>) -> Result<String, AuthError> {
        let mut request = self.http.get(self.config.endpoint(path));
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, api::bearer(token));
        }
        self.send(request).await
    }
}
