//! HTTP Webhook Notifier
//!
//! ## Overview
//!
//! Delivers alerts to any HTTP endpoint that accepts a JSON message, such as
//! a chat webhook, an email relay, or a notification service's REST
//! publish API. Each publish becomes one POST:
//!
//! ```json
//! { "topic": "smartgrow-alerts",
//!   "subject": "[SmartGrow] Plot P1 out of range",
//!   "message": "Plot ID: P1\n..." }
//! ```
//!
//! ## Retries
//!
//! Transport errors, `429` and `5xx` responses are retried with exponential
//! backoff (`100ms * 2^attempt`) up to `max_retries`. Other `4xx` responses
//! fail immediately. The pipeline treats every failure as "not delivered"
//! and moves on, so retrying here is the only retry an alert gets.
//!
//! ## Example Usage
//!
//! ```rust
//! use smartgrow_connectors::http::{HttpConfig, HttpNotifier};
//!
//! let config = HttpConfig::new("https://hooks.example.com/smartgrow")
//!     .bearer_token("your-api-token")
//!     .timeout_secs(10);
//!
//! let notifier = HttpNotifier::new(config)?;
//! # Ok::<(), smartgrow_connectors::http::HttpError>(())
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use smartgrow_core::{Notifier, NotifyError};

use crate::ConnectionStats;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server returned error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// HTTP configuration
#[derive(Clone)]
pub struct HttpConfig {
    /// Endpoint receiving the POST
    pub url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// Retry attempts after the first failure
    pub max_retries: u32,
    /// User agent string
    pub user_agent: String,
}

/// Authentication methods
#[derive(Clone)]
pub enum AuthMethod {
    None,
    Bearer(String),
    Basic { username: String, password: String },
    /// API key in a custom header
    ApiKey { header: String, value: String },
}

impl HttpConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
            auth: AuthMethod::None,
            headers: HashMap::new(),
            max_retries: 3,
            user_agent: format!("SmartGrow-AlertProcessor/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    pub fn api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    topic: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Webhook notifier on the `ureq` blocking client
pub struct HttpNotifier {
    config: HttpConfig,
    agent: ureq::Agent,
    stats: Arc<Mutex<ConnectionStats>>,
}

impl HttpNotifier {
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(HttpError::Config("URL must start with http:// or https://".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
        })
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Build request with authentication and headers
    fn build_request(&self) -> ureq::Request {
        let mut request = self.agent.post(&self.config.url);

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::Basic { username, password } => {
                let credentials = STANDARD.encode(format!("{}:{}", username, password));
                request = request.set("Authorization", &format!("Basic {}", credentials));
            }
            AuthMethod::ApiKey { header, value } => {
                request = request.set(header, value);
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
    }

    /// POST `json` with retry on transport errors, 429 and 5xx
    async fn send_with_retry(&self, json: String) -> Result<(), HttpError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * (1 << attempt));
                debug!("Retrying webhook delivery in {:?} (attempt {})", delay, attempt);
                tokio::time::sleep(delay).await;
            }

            let request = self.build_request();
            let body = json.clone();
            let response = tokio::task::spawn_blocking(move || request.send_string(&body))
                .await
                .map_err(|e| HttpError::Request(e.to_string()))?;

            match response {
                Ok(_) => {
                    let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
                    stats.messages_sent += 1;
                    stats.bytes_sent += json.len() as u64;
                    return Ok(());
                }
                Err(ureq::Error::Status(code, resp)) => {
                    let error = HttpError::ServerError {
                        status: code,
                        message: resp.into_string().unwrap_or_default(),
                    };
                    if code >= 500 || code == 429 {
                        warn!("Webhook returned {}; will retry", code);
                        last_error = Some(error);
                        continue;
                    }
                    return Err(self.record_failure(error));
                }
                Err(ureq::Error::Transport(e)) => {
                    warn!("Webhook transport error: {}", e);
                    last_error = Some(HttpError::Request(e.to_string()));
                }
            }
        }

        let error = last_error.unwrap_or_else(|| HttpError::Request("Unknown error".into()));
        Err(self.record_failure(error))
    }

    fn record_failure(&self, error: HttpError) -> HttpError {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.messages_failed += 1;
        stats.last_error = Some(error.to_string());
        error
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let json = serde_json::to_string(&WebhookMessage {
            topic,
            subject,
            message: body,
        })
        .map_err(|e| NotifyError::Rejected(HttpError::Serialization(e.to_string()).to_string()))?;

        self.send_with_retry(json)
            .await
            .map_err(|e| NotifyError::Delivery {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}
