//! Session acquisition and authenticated transport.
//!
//! The storefront's AJAX endpoints only answer requests that look like they
//! come from an in-page script: session cookies from the root page, the
//! anti-forgery token echoed in a header, and an `X-Requested-With` marker.
//! The session is primed once per run and never refreshed; every later
//! request only reads it.

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use reqwest::header;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::debug;
use url::Url;

use crate::config::TargetConfig;
use crate::crawler::error::TransportError;
use crate::crawler::rate_gate::RateGate;

/// Cookie the storefront stores its anti-forgery token in.
pub const ANTIFORGERY_COOKIE: &str = "XSRF-TOKEN";
/// Header the token is echoed back in.
pub const ANTIFORGERY_HEADER: &str = "X-XSRF-TOKEN";

// ── Session ───────────────────────────────────────────────────────────────────

/// Cookie jar + anti-forgery token captured while priming. Immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub cookies: BTreeMap<String, String>,
    pub anti_forgery_token: Option<String>,
}

impl Session {
    /// Build the jar from raw `Set-Cookie` header values: first `k=v` pair of
    /// each header, last-write-wins on repeated names. Headers without an `=`
    /// are skipped.
    pub fn from_set_cookie_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cookies = BTreeMap::new();

        for raw in headers {
            let Some(pair) = raw.split(';').next() else {
                continue;
            };
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies.insert(name.to_string(), value.trim().to_string());
        }

        let anti_forgery_token = cookies.get(ANTIFORGERY_COOKIE).map(|raw| {
            percent_decode_str(raw)
                .decode_utf8()
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| raw.clone())
        });

        Self {
            cookies,
            anti_forgery_token,
        }
    }

    /// Serialize the jar into a single `Cookie` header value.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Raw HTTP outcome. Non-2xx statuses are handed back as data; the caller
/// decides whether a bad status aborts its branch.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam between the hierarchy walk and the network. The production
/// implementation is [`SessionClient`]; tests script their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError>;

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<RawResponse, TransportError>;
}

// ── SessionClient ─────────────────────────────────────────────────────────────

pub struct SessionClient {
    http: reqwest::Client,
    base: Url,
    session: Session,
    gate: RateGate,
    max_retries: usize,
    retry_base_ms: u64,
}

impl SessionClient {
    /// Issue one GET against the site root and capture the session it hands
    /// out. The reqwest builder's own cookie store stays off; the manual jar
    /// built here is the only session state for the rest of the run.
    pub async fn prime(config: &TargetConfig, gate: RateGate) -> Result<Self, TransportError> {
        let base = Url::parse(&config.base_url)?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()?;

        let resp = http.get(base.clone()).send().await?;

        let set_cookies: Vec<&str> = resp
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        let session = Session::from_set_cookie_headers(set_cookies);
        debug!(
            "Primed session: {} cookies, token {}",
            session.cookies.len(),
            if session.anti_forgery_token.is_some() { "present" } else { "absent" },
        );

        Ok(Self {
            http,
            base,
            session,
            gate,
            max_retries: config.max_retries,
            retry_base_ms: config.retry_base_ms,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn dispatch(
        &self,
        path: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<RawResponse, TransportError> {
        self.gate.wait().await;

        let url = self.base.join(path)?;
        let mut req = match form {
            None => self.http.get(url.clone()),
            Some(fields) => self.http.post(url.clone()).form(&fields),
        };

        req = req
            .header(header::ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::REFERER, self.base.as_str())
            .header(header::COOKIE, self.session.cookie_header());

        if let Some(token) = &self.session.anti_forgery_token {
            req = req.header(ANTIFORGERY_HEADER, token);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());

        Ok(RawResponse { status, body })
    }

    /// Bounded retry on transport failures, disabled by default. Every attempt
    /// still passes the rate gate, so retrying cannot shrink the politeness gap.
    async fn dispatch_with_retry(
        &self,
        path: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<RawResponse, TransportError> {
        if self.max_retries == 0 {
            return self.dispatch(path, form).await;
        }

        let backoff = ExponentialBackoff::from_millis(self.retry_base_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.max_retries);

        Retry::spawn(backoff, || self.dispatch(path, form)).await
    }
}

#[async_trait]
impl Transport for SessionClient {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.dispatch_with_retry(path, None).await
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<RawResponse, TransportError> {
        self.dispatch_with_retry(path, Some(form)).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
