// Production transport: reqwest against the backend.
//
// Auth is a session cookie obtained out of band (the web login flow); the
// transport just forwards it verbatim. No timeout is set beyond reqwest's
// defaults, and requests are never aborted once issued.

use anyhow::{anyhow, Result};
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use kette_common::protocol::{FriendAction, Mutation, MutationAck, UserSearch};
use kette_common::types::{Friend, FriendMatch, HabitDetail, PendingRequest, Snapshot};

use crate::transport::{ApiError, ApiTransport};

/// HTTP transport bound to one server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    session_cookie: Option<String>,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport for the given base URL.
    ///
    /// Requires https; http is allowed only for loopback hosts (local
    /// development servers).
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = validate_base_url(base_url)?;
        Ok(Self { base_url: parsed, session_cookie: None, client: reqwest::Client::new() })
    }

    /// Attach the session cookie sent with every request.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|error| ApiError::Transport(format!("invalid path `{path}`: {error}")))?;
        let mut builder = self.client.request(method, url);
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(COOKIE, cookie.clone());
        }
        Ok(builder)
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self
            .request(reqwest::Method::GET, path)?
            .send()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        response.json().await.map_err(|error| ApiError::Transport(error.to_string()))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(reqwest::Method::POST, path)?
            .json(body)
            .send()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        response.json().await.map_err(|error| ApiError::Transport(error.to_string()))
    }

    async fn post_acked<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let ack: MutationAck = self.post_json(path, body).await?;
        if ack.success {
            Ok(())
        } else {
            Err(ApiError::Rejected)
        }
    }
}

impl ApiTransport for HttpTransport {
    async fn fetch_state(&self) -> Result<Snapshot, ApiError> {
        self.get_json("/api/state").await
    }

    async fn fetch_habit_detail(&self, id: i64) -> Result<HabitDetail, ApiError> {
        self.get_json(&format!("/habit/{id}")).await
    }

    async fn fetch_friends(&self) -> Result<Vec<Friend>, ApiError> {
        self.get_json("/api/get_friends").await
    }

    async fn fetch_pending_requests(&self) -> Result<Vec<PendingRequest>, ApiError> {
        self.get_json("/api/get_pending_requests").await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<FriendMatch>, ApiError> {
        self.post_json("/api/search_users", &UserSearch { query: query.to_string() }).await
    }

    async fn send_friend_action(&self, action: &FriendAction) -> Result<(), ApiError> {
        self.post_acked(action.endpoint(), action).await
    }

    async fn submit(&self, mutation: &Mutation) -> Result<(), ApiError> {
        self.post_acked(mutation.endpoint(), mutation).await
    }
}

fn validate_base_url(value: &str) -> Result<Url> {
    let parsed =
        Url::parse(value).map_err(|error| anyhow!("invalid server url `{value}`: {error}"))?;
    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if is_loopback_host(parsed.host_str()) => Ok(parsed),
        _ => Err(anyhow!("server url must use https (http is allowed only for localhost)")),
    }
}

fn is_loopback_host(host: Option<&str>) -> bool {
    match host {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}
