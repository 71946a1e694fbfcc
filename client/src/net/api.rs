//! REST client for the hub's `/api/v1` surface.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`, each raced against
//! a timeout. Native builds get the same signatures returning
//! [`ApiError::Network`] so feature modules compile and test without a
//! browser.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become [`ApiError::Status`] carrying the server's
//! `{message}` (or `{error}`) text. Plain calls never retry; callers that
//! want retries opt in through [`Api::retrying`].

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use wire::rest::{self, ConfigFile, ConfigList, ConfigName, ConfigOp, NewSensor};
use wire::{Sensor, SensorId, SensorPatch, Sink, SinkId};

use crate::config::ClientConfig;

/// Failure of one REST call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("Request timeout")]
    Timeout,
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build the error for a non-2xx response body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Status { status, message: rest::error_message(status, body) }
    }

    /// Whether repeating the same request could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
#[must_use]
pub fn retry_delay_ms(attempt: u32, base_ms: u32) -> u32 {
    let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base_ms.saturating_mul(factor)
}

/// Parse a response body that may be empty.
fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

enum Body {
    Empty,
    Json(Value),
    Text(String),
}

impl Body {
    fn json(value: &impl Serialize) -> Result<Self, ApiError> {
        serde_json::to_value(value).map(Self::Json).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Handle for REST calls with a fixed base and timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Api {
    base: String,
    timeout_ms: u32,
    retries: u32,
    retry_base_ms: u32,
}

impl Api {
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base: config.api_base.clone(),
            timeout_ms: config.request_timeout_ms,
            retries: config.retry_attempts,
            retry_base_ms: config.reconnect_base_ms,
        }
    }

    /// Run `op` under this client's retry policy. Only idempotent reads
    /// should opt in.
    ///
    /// # Errors
    ///
    /// See [`retry_with_backoff`].
    pub async fn retrying<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        retry_with_backoff(self.retries, self.retry_base_ms, pause, op).await
    }

    /// Absolute request path for a `wire::rest` path, rebased onto this
    /// client's API base.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        let tail = path.strip_prefix(rest::API_PREFIX).unwrap_or(path);
        format!("{}{tail}", self.base.trim_end_matches('/'))
    }

    // --- Sensors ---

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn list_sensors(&self) -> Result<Vec<Sensor>, ApiError> {
        parse_body(&self.call(Method::Get, &rest::sensors_path(), Body::Empty).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn get_sensor(&self, id: &SensorId) -> Result<Sensor, ApiError> {
        parse_body(&self.call(Method::Get, &rest::sensor_path(id), Body::Empty).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn create_sensor(&self, sensor: &NewSensor) -> Result<Value, ApiError> {
        parse_body(&self.call(Method::Post, &rest::sensors_path(), Body::json(sensor)?).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn update_sensor(&self, id: &SensorId, patch: &SensorPatch) -> Result<Value, ApiError> {
        parse_body(&self.call(Method::Patch, &rest::sensor_path(id), Body::json(patch)?).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn delete_sensor(&self, id: &SensorId) -> Result<(), ApiError> {
        self.call(Method::Delete, &rest::sensor_path(id), Body::Empty).await.map(drop)
    }

    // --- Sinks ---

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn list_sinks(&self) -> Result<Vec<Sink>, ApiError> {
        parse_body(&self.call(Method::Get, &rest::sinks_path(), Body::Empty).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn create_sink(&self, sink: &Sink) -> Result<Value, ApiError> {
        parse_body(&self.call(Method::Post, &rest::sinks_path(), Body::json(sink)?).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn update_sink(&self, id: &SinkId, sink: &Sink) -> Result<Value, ApiError> {
        parse_body(&self.call(Method::Patch, &rest::sink_path(id), Body::json(sink)?).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn delete_sink(&self, id: &SinkId) -> Result<(), ApiError> {
        self.call(Method::Delete, &rest::sink_path(id), Body::Empty).await.map(drop)
    }

    // --- Configs ---

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn list_configs(&self) -> Result<Vec<ConfigFile>, ApiError> {
        let list: ConfigList = parse_body(&self.call(Method::Get, &rest::configs_path(ConfigOp::List), Body::Empty).await?)?;
        Ok(list.into_files())
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn save_config(&self, name: &str) -> Result<Value, ApiError> {
        let body = Body::json(&ConfigName::normalized(name))?;
        parse_body(&self.call(Method::Post, &rest::configs_path(ConfigOp::Save), body).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn load_config(&self, name: &str) -> Result<Value, ApiError> {
        let body = Body::json(&ConfigName::normalized(name))?;
        parse_body(&self.call(Method::Post, &rest::configs_path(ConfigOp::Load), body).await?)
    }

    /// Current configuration as YAML text.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn export_config(&self) -> Result<String, ApiError> {
        self.call(Method::Get, &rest::configs_path(ConfigOp::Export), Body::Empty).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn import_config(&self, yaml: &str) -> Result<Value, ApiError> {
        let body = Body::Text(yaml.to_owned());
        parse_body(&self.call(Method::Post, &rest::configs_path(ConfigOp::Import), body).await?)
    }

    /// Send one request and return the body text of a 2xx response.
    async fn call(&self, method: Method, path: &str, body: Body) -> Result<String, ApiError> {
        let url = self.url(path);
        log::debug!("{method:?} {url}");
        #[cfg(feature = "hydrate")]
        {
            use futures::future::{Either, select};
            use gloo_net::http::Request;

            let builder = match method {
                Method::Get => Request::get(&url),
                Method::Post => Request::post(&url),
                Method::Patch => Request::patch(&url),
                Method::Delete => Request::delete(&url),
            };
            let request = match body {
                Body::Empty => builder.build(),
                Body::Json(value) => builder.json(&value),
                Body::Text(text) => builder.header("Content-Type", "text/plain").body(text),
            }
            .map_err(|e| ApiError::Network(e.to_string()))?;

            let timeout = gloo_timers::future::TimeoutFuture::new(self.timeout_ms);
            let resp = match select(Box::pin(request.send()), Box::pin(timeout)).await {
                Either::Left((result, _)) => result.map_err(|e| ApiError::Network(e.to_string()))?,
                Either::Right(_) => return Err(ApiError::Timeout),
            };
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            if !resp.ok() {
                return Err(ApiError::from_response(status, &text));
            }
            Ok(text)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (body, self.timeout_ms);
            Err(ApiError::Network(format!("{method:?} {url}: not available outside the browser")))
        }
    }
}

/// Run `op` until it succeeds, retrying transient failures up to `retries`
/// times with exponential backoff from `base_ms`. `sleep` waits between
/// attempts.
///
/// # Errors
///
/// The last error once retries are exhausted, or the first non-transient one.
pub async fn retry_with_backoff<T, F, Fut, S, SF>(
    retries: u32,
    base_ms: u32,
    sleep: S,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    S: Fn(u32) -> SF,
    SF: Future<Output = ()>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries && err.is_transient() => {
                let delay = retry_delay_ms(attempt, base_ms);
                log::info!("request failed (attempt {}/{}): {err}; retrying in {delay} ms", attempt + 1, retries + 1);
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn pause(ms: u32) {
    #[cfg(feature = "hydrate")]
    gloo_timers::future::TimeoutFuture::new(ms).await;
    #[cfg(not(feature = "hydrate"))]
    log::trace!("no timer outside the browser; skipping {ms} ms pause");
}
