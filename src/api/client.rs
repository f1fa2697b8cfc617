// src/api/client.rs
//! Blocking HTTP client for the Power BI and Fabric REST APIs.
//!
//! A thin wrapper around reqwest: authentication, endpoint routing and
//! response decoding. No parsing or business logic lives here.

use super::{ApiResponse, MetadataApi};
use crate::constants::POWERBI_ENDPOINT_PREFIX;
use crate::error::{AppError, ConfigError};
use crate::types::AccessToken;
use reqwest::blocking::{Client, Response};
use reqwest::header;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// A thin wrapper around reqwest's blocking client.
#[derive(Clone)]
pub struct FabricHttpClient {
    client: Client,
    powerbi_base: Url,
    fabric_base: Url,
}

impl FabricHttpClient {
    /// Creates a client authenticated with `token` against the two base URLs.
    pub fn new(token: &AccessToken, powerbi_base: &str, fabric_base: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(token)?)
            .build()?;
        Ok(Self {
            client,
            powerbi_base: parse_base(powerbi_base)?,
            fabric_base: parse_base(fabric_base)?,
        })
    }

    fn create_headers(token: &AccessToken) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", token.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                ConfigError::Missing(format!("Invalid access token format: {}", e))
            })?,
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Resolves an endpoint to a full URL.
    ///
    /// Absolute URLs pass through; `v1.0/myorg/...` goes to Power BI and
    /// everything else to Fabric.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, AppError> {
        if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
            return Url::parse(endpoint)
                .map_err(|e| AppError::MalformedResponse(format!("Invalid URL '{}': {}", endpoint, e)));
        }
        let path = endpoint.trim_start_matches('/');
        let base = if path.starts_with(POWERBI_ENDPOINT_PREFIX) {
            &self.powerbi_base
        } else {
            &self.fabric_base
        };
        base.join(path)
            .map_err(|e| AppError::MalformedResponse(format!("Invalid endpoint '{}': {}", endpoint, e)))
    }

    fn into_api_response(response: Response) -> Result<ApiResponse, AppError> {
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let text = response.text()?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if (200..300).contains(&status) => return Err(e.into()),
                Err(_) => {
                    log::debug!("Non-JSON body on HTTP {}", status);
                    Value::Null
                }
            }
        };

        Ok(ApiResponse {
            status,
            body,
            location,
            retry_after,
        })
    }
}

impl MetadataApi for FabricHttpClient {
    fn get(&self, endpoint: &str) -> Result<ApiResponse, AppError> {
        let url = self.resolve(endpoint)?;
        log::debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        Self::into_api_response(response)
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<ApiResponse, AppError> {
        let url = self.resolve(endpoint)?;
        log::debug!("POST {}", url);
        let response = self.client.post(url).json(body).send()?;
        Self::into_api_response(response)
    }
}

fn parse_base(base: &str) -> Result<Url, AppError> {
    let mut normalized = base.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| {
        ConfigError::InvalidBaseUrl {
            url: base.to_string(),
            cause: e.to_string(),
        }
        .into()
    })
}
