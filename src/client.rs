//! HTTP client for a running directory server; backs the `client` subcommand.

use derive_more::Display;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::employee::{EmployeeListResponse, ListParams, MessageResponse};
use crate::model::employee::{Employee, EmployeeInput};

#[derive(Debug, Display)]
pub enum ClientError {
    #[display(fmt = "HTTP error: {}", _0)]
    Http(reqwest::Error),

    #[display(fmt = "Validation error: {}", _0)]
    Validation(String),

    #[display(fmt = "Not found: {}", _0)]
    NotFound(String),

    #[display(fmt = "Server error: {}", _0)]
    Server(String),
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct EmployeeClient {
    client: Client,
    base_url: String,
}

impl EmployeeClient {
    /// `base_url` is the collection root, e.g. `http://localhost:5000/api/employees`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    pub async fn list(&self, params: &ListParams) -> ClientResult<EmployeeListResponse> {
        let response = self.client.get(&self.base_url).query(params).send().await?;
        Self::handle_response(response).await
    }

    pub async fn get(&self, id: &str) -> ClientResult<Employee> {
        let response = self.client.get(self.url(id)).send().await?;
        Self::handle_response(response).await
    }

    pub async fn create(&self, input: &EmployeeInput) -> ClientResult<Employee> {
        self.send_json(self.client.post(&self.base_url), input).await
    }

    pub async fn update(&self, id: &str, input: &EmployeeInput) -> ClientResult<Employee> {
        self.send_json(self.client.put(self.url(id)), input).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<MessageResponse> {
        let response = self.client.delete(self.url(id)).send().await?;
        Self::handle_response(response).await
    }

    async fn send_json<T, B>(&self, request: reqwest::RequestBuilder, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = request.json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(error_for(status, &text));
        }

        response.json().await.map_err(Into::into)
    }
}

/// Prefers the server's `{message}`; falls back to the raw body.
fn error_for(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<MessageResponse>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Server(message),
    }
}
