//! JSON request wrapper shared by every gateway

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::FetchError;

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Merged over the default `Content-Type: application/json`.
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

/// Issues JSON requests and maps every failure to a [`FetchError`].
/// Errors are never swallowed here.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        options: RequestOptions,
    ) -> Result<T, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.extend(options.headers);

        let mut request = self
            .client
            .request(options.method, url.clone())
            .headers(headers);

        if let Some(body) = options.body {
            request = request.body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::transport(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::transport(url, err))?;

        serde_json::from_slice(&bytes).map_err(|err| FetchError::transport(url, err))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        self.fetch_json(url, RequestOptions::default()).await
    }

    pub async fn send_json<B, T>(
        &self,
        method: Method,
        url: &Url,
        body: &B,
    ) -> Result<T, FetchError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|err| FetchError::transport(url, err))?;
        let options = RequestOptions {
            method,
            body: Some(body),
            ..Default::default()
        };

        self.fetch_json(url, options).await
    }
}
