//! Outbound HTTP client shared by the REST delegates.

use std::time::Duration;

use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, Url};

use crate::config::ServerConfig;
use crate::delegates::UpstreamError;

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("health-gateway/", env!("CARGO_PKG_VERSION"));

/// Redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Build a client with the configured request timeout.
///
/// One client is built at startup and cloned into every delegate so that
/// they share its connection pool. Redirects are only followed within the
/// origin of the first request.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(Policy::custom(same_origin_redirects))
        .build()
}

fn same_origin_redirects(attempt: Attempt) -> reqwest::redirect::Action {
    let allowed = attempt.previous().len() <= MAX_REDIRECTS
        && attempt
            .previous()
            .first()
            .is_some_and(|first| same_origin(first, attempt.url()));
    if allowed {
        attempt.follow()
    } else {
        tracing::warn!(location = %attempt.url(), "Not following redirect");
        attempt.stop()
    }
}

/// Build the client described by `config`.
pub fn client_from_config(config: &ServerConfig) -> reqwest::Result<Client> {
    tracing::debug!(
        timeout_secs = config.http_client_timeout.as_secs(),
        "Building outbound HTTP client"
    );
    build_http_client(config.http_client_timeout)
}

/// Join a base URL and a path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Append `segments` to the path of `base`, percent-encoding each one.
///
/// Identifiers taken from callers go through here so that `/`, `?` and
/// `..` cannot leave their segment.
pub fn segment_url(base: &str, segments: &[&str]) -> Result<Url, UpstreamError> {
    let mut url = Url::parse(base).map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|()| UpstreamError::InvalidUrl(format!("{}: cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Whether `candidate` has the same scheme, host and port as `origin`.
pub fn same_origin(origin: &Url, candidate: &Url) -> bool {
    origin.scheme() == candidate.scheme()
        && origin.host_str() == candidate.host_str()
        && origin.port_or_known_default() == candidate.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/", "/b"), "http://a/b");
        assert_eq!(join_url("http://a", "b/c"), "http://a/b/c");
    }

    #[test]
    fn test_segment_url_encodes_segments() {
        let url = segment_url("http://a/api/", &["personal-accounts", "../x/y?z=1"]).unwrap();
        assert_eq!(url.as_str(), "http://a/api/personal-accounts/..%2Fx%2Fy%3Fz=1");
        assert_eq!(url.path_segments().unwrap().count(), 3);

        let url = segment_url("http://a/api", &["immunizations", "HDID 1"]).unwrap();
        assert_eq!(url.as_str(), "http://a/api/immunizations/HDID%201");
    }

    #[test]
    fn test_segment_url_rejects_bad_base() {
        assert!(matches!(
            segment_url("not a url", &["x"]),
            Err(UpstreamError::InvalidUrl(_))
        ));
        assert!(matches!(
            segment_url("mailto:someone@example.com", &["x"]),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_same_origin() {
        let origin = Url::parse("https://bcmp.example.com/api").unwrap();
        let same = |s: &str| same_origin(&origin, &Url::parse(s).unwrap());
        assert!(same("https://bcmp.example.com/assets/1"));
        assert!(same("https://bcmp.example.com:443/assets/1"));
        assert!(!same("http://bcmp.example.com/assets/1"));
        assert!(!same("https://bcmp.example.com:8443/assets/1"));
        assert!(!same("https://169.254.169.254/latest/meta-data"));
        assert!(!same("https://bcmp.example.com.evil.test/assets/1"));
    }

    #[tokio::test]
    async fn test_redirects_stay_on_origin() {
        use axum::{Router, response::Redirect, routing::get};

        let other = crate::test_support::spawn_upstream(
            Router::new().route("/x", get(|| async { "other" })),
        )
        .await;
        let away = format!("{}/x", other);
        let base = crate::test_support::spawn_upstream(
            Router::new()
                .route("/x", get(|| async { "home" }))
                .route("/local", get(|| async { Redirect::temporary("/x") }))
                .route("/away", get(move || async move { Redirect::temporary(&away) })),
        )
        .await;
        let client = build_http_client(Duration::from_secs(5)).unwrap();

        let local = client.get(format!("{}/local", base)).send().await.unwrap();
        assert_eq!(local.text().await.unwrap(), "home");

        let away = client.get(format!("{}/away", base)).send().await.unwrap();
        assert!(away.status().is_redirection());
    }

    #[tokio::test]
    async fn test_timeout_applies() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept but never answer.
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = build_http_client(Duration::from_millis(200)).unwrap();
        let err = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
