use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// Credentials of a signed-in user.
///
/// Obtained elsewhere (the login flow is not handled here) and handed to
/// whichever client talks to the catalog service.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Value of the `Authorization` header for this session.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// An [`HttpClient`] wrapper that sends `Authorization: Bearer <token>`
/// with every request.
pub struct Authenticated<C> {
    pub inner: C,
    pub session: Session,
}

impl<C> Authenticated<C> {
    pub fn new(inner: C, session: Session) -> Self {
        Self { inner, session }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for Authenticated<C> {
    async fn execute(&self, mut req: reqwest::Request) -> Result<reqwest::Response> {
        let value = HeaderValue::from_str(&self.session.authorization())
            .context("Session token is not a valid header value")?;
        req.headers_mut().insert(AUTHORIZATION, value);
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records the Authorization header it sees, then refuses the request.
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl HttpClient for Recorder {
        async fn execute(&self, req: reqwest::Request) -> Result<reqwest::Response> {
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            *self.seen.lock().unwrap() = header;
            Err(anyhow::anyhow!("offline"))
        }
    }

    fn request() -> reqwest::Request {
        reqwest::Request::new(
            reqwest::Method::GET,
            "http://localhost:8080/api/diplomas/diplomas".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_bearer_header_injected() {
        let recorder = Recorder::default();
        let client = Authenticated::new(recorder.clone(), Session::new("abc123"));

        let result = client.execute(request()).await;

        assert!(result.is_err());
        assert_eq!(
            recorder.seen.lock().unwrap().as_deref(),
            Some("Bearer abc123")
        );
    }

    #[tokio::test]
    async fn test_invalid_token_is_an_error() {
        let recorder = Recorder::default();
        let client = Authenticated::new(recorder.clone(), Session::new("bad\ntoken"));

        let err = client.execute(request()).await.unwrap_err();

        assert!(err.to_string().contains("not a valid header value"));
        assert!(recorder.seen.lock().unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", Session::new("secret"));
        assert!(!rendered.contains("secret"));
    }
}
