//! SSRF-hardened HTTP access.
//!
//! Every outbound request the digest makes (feeds, article pages, arXiv
//! renderings) goes through [`SafeFetcher`]. Feed content is attacker
//! influenced, so a link or `<img src>` could point at an internal service;
//! the fetcher refuses those targets before a connection is opened.
//!
//! # Request lifecycle
//!
//! 1. Parse the URL and require an `http`/`https` scheme
//! 2. Resolve the host and reject the request if **any** address is blocked
//! 3. Pin the connection to the validated addresses
//! 4. On a 3xx response, resolve `Location` and start over from step 1
//! 5. Stream the body with a hard byte cap
//! 6. Decode using the declared charset, lossy UTF-8 otherwise
//!
//! The [`PageFetch`] trait is the seam used by the extractor and the source
//! adapters, which keeps them testable without a network.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use futures::{Stream, StreamExt};
use reqwest::header::{self, HeaderMap};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::{Host, Url};

/// Hard cap on a single response body.
pub const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024;

/// Errors produced by the fetcher.
///
/// None of these reach the top level of a run: callers turn them into an
/// empty summary or a missing image and log the failure.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The scheme or one of the resolved addresses fails the SSRF policy.
    #[error("blocked URL {url}: {reason}")]
    BlockedUrl { url: String, reason: String },

    /// The body grew past the configured cap.
    #[error("response exceeded {limit} bytes")]
    TooLarge { limit: usize },

    /// Connection, TLS, timeout or body read failure.
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("gave up after {0} redirects")]
    TooManyRedirects(usize),
}

fn blocked(url: &Url, reason: impl Into<String>) -> FetchError {
    FetchError::BlockedUrl {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Limits applied to every request.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Connect timeout, total request timeout, and DNS timeout.
    pub timeout: Duration,
    /// Body size cap in bytes.
    pub max_bytes: usize,
    /// Maximum number of redirect hops.
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_bytes: MAX_RESPONSE_BYTES,
            max_redirects: 5,
            user_agent: concat!("ai_daily_digest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A fully downloaded response body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it.
    pub url: Url,
    pub body: Vec<u8>,
    /// `charset` parameter of the `Content-Type` header, if any.
    pub charset: Option<String>,
}

impl FetchedPage {
    /// Decode the body to text. Never fails.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.charset.as_deref())
    }
}

/// Anything that can download a page for the extractor.
pub trait PageFetch {
    /// Download `url` and return the raw body.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// Download `url` and decode it to text.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.fetch(url).await?.text())
    }
}

/// Returns `true` if `ip` belongs to a range the fetcher must never contact.
///
/// Covers loopback, link-local, RFC1918, shared-carrier NAT (100.64/10),
/// unspecified addresses, IPv6 unique-local, and IPv4-mapped IPv6 forms of
/// all of the above.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_blocked_v4(v4),
            None => is_blocked_v6(v6),
        },
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || (a == 100 && (64..=127).contains(&b))
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique-local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (first & 0xffc0) == 0xfe80
}

/// Check the scheme, resolve the host, and validate every address.
///
/// Returns the validated socket addresses so the caller can pin the
/// connection to them. Resolution failure counts as blocked.
#[instrument(level = "debug", skip_all, fields(url = %url))]
pub async fn resolve_safe(url: &Url, timeout: Duration) -> Result<Vec<SocketAddr>, FetchError> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(blocked(url, format!("scheme {other:?} is not allowed"))),
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let addrs: Vec<SocketAddr> = match url.host() {
        None => return Err(blocked(url, "missing host")),
        Some(Host::Ipv4(ip)) => vec![SocketAddr::new(IpAddr::V4(ip), port)],
        Some(Host::Ipv6(ip)) => vec![SocketAddr::new(IpAddr::V6(ip), port)],
        Some(Host::Domain(domain)) => {
            match tokio::time::timeout(timeout, tokio::net::lookup_host((domain, port))).await {
                Ok(Ok(resolved)) => resolved.collect(),
                Ok(Err(e)) => return Err(blocked(url, format!("resolution failed: {e}"))),
                Err(_) => return Err(blocked(url, "resolution timed out")),
            }
        }
    };

    if addrs.is_empty() {
        return Err(blocked(url, "host resolved to no addresses"));
    }
    if let Some(bad) = addrs.iter().find(|addr| is_blocked_ip(addr.ip())) {
        return Err(blocked(url, format!("{} is in a blocked range", bad.ip())));
    }

    debug!(count = addrs.len(), "Resolved addresses passed policy");
    Ok(addrs)
}

/// Collect a byte stream into memory, failing once it exceeds `limit`.
///
/// The stream is dropped as soon as the cap is crossed, so at most
/// `limit` plus one chunk is ever held.
pub async fn read_capped<S, B, E>(stream: S, limit: usize) -> Result<Vec<u8>, FetchError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    FetchError: From<E>,
{
    let mut stream = std::pin::pin!(stream);
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(chunk?.as_ref());
        if body.len() > limit {
            return Err(FetchError::TooLarge { limit });
        }
    }
    Ok(body)
}

/// Extract the `charset` parameter from a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"').to_string())
        })
        .filter(|charset| !charset.is_empty())
}

fn charset_from_headers(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    charset_from_content_type(content_type)
}

/// Decode `body` with the declared charset, or UTF-8 when the label is
/// missing or unknown. Undecodable bytes become U+FFFD.
pub fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, had_errors) = encoding.decode(body);
    if had_errors {
        debug!(encoding = encoding.name(), "Replaced undecodable bytes");
    }
    text.into_owned()
}

/// The production [`PageFetch`] implementation.
#[derive(Debug, Clone, Default)]
pub struct SafeFetcher {
    config: FetchConfig,
}

impl SafeFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Build a client for one hop, pinned to the validated addresses.
    fn client_for(&self, url: &Url, addrs: &[SocketAddr]) -> Result<Client, FetchError> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(self.config.timeout)
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.as_str());
        if let Some(Host::Domain(domain)) = url.host() {
            builder = builder.resolve_to_addrs(domain, addrs);
        }
        Ok(builder.build()?)
    }
}

impl PageFetch for SafeFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let start = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let (current, response) = self
            .follow_redirects(start, move |target, addrs| async move {
                let client = self.client_for(&target, &addrs)?;
                let response = client.get(target).send().await?;
                Ok::<_, FetchError>((response.status(), response.headers().clone(), response))
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: current.to_string(),
            });
        }

        let limit = self.config.max_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { limit });
        }

        let charset = charset_from_headers(response.headers());
        let body = read_capped(response.bytes_stream(), limit).await?;
        info!(final_url = %current, bytes = body.len(), "Fetched page");
        Ok(FetchedPage {
            url: current,
            body,
            charset,
        })
    }
}

impl SafeFetcher {
    /// Run the redirect chain starting at `start`.
    ///
    /// Every hop, the first included, is resolved and checked against the
    /// blocked ranges before `send` is called with the validated addresses.
    /// Returns the final URL with the first non-redirect response.
    async fn follow_redirects<R, S, Fut>(
        &self,
        start: Url,
        mut send: S,
    ) -> Result<(Url, R), FetchError>
    where
        S: FnMut(Url, Vec<SocketAddr>) -> Fut,
        Fut: Future<Output = Result<(StatusCode, HeaderMap, R), FetchError>>,
    {
        let mut current = start;
        for hop in 0..=self.config.max_redirects {
            let addrs = resolve_safe(&current, self.config.timeout).await?;
            let (status, headers, response) = send(current.clone(), addrs).await?;
            match next_hop(&current, status, &headers)? {
                Some(next) => {
                    debug!(hop, from = %current, to = %next, "Following redirect");
                    current = next;
                }
                None => return Ok((current, response)),
            }
        }

        Err(FetchError::TooManyRedirects(self.config.max_redirects))
    }
}

/// Target of a redirect response, `None` for any other status.
///
/// A 3xx without a usable `Location` is reported as a status error.
fn next_hop(
    current: &Url,
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<Option<Url>, FetchError> {
    if !status.is_redirection() {
        return Ok(None);
    }
    let location = headers
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| FetchError::Status {
            status: status.as_u16(),
            url: current.to_string(),
        })?;
    current
        .join(location)
        .map(Some)
        .map_err(|e| FetchError::InvalidUrl {
            url: location.to_string(),
            reason: e.to_string(),
        })
}
