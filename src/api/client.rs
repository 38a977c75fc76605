use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Error surface for every REST call.
///
/// Server rejections carry the body's `message` field verbatim when the
/// body is JSON with one; anything else degrades to a generic text so
/// callers always have something human-readable to show.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request never completed (connection refused, DNS, timeout, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    /// Status code for server rejections, `None` for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Network(_) => None,
        }
    }
}

/// Shape of the server's JSON error bodies.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the notification API: one reqwest client, a base URL,
/// and the bearer credential attached to every request.
///
/// Constructed once at the composition root and handed to the store —
/// never a process-wide global.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `https://rewards.example.edu`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/notifications{path}", self.base_url)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        decode(response).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .put(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// PUT with a JSON body whose response body is irrelevant.
    pub(crate) async fn put_no_response<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .put(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        check(response).await.map(drop)
    }

    pub(crate) async fn put_empty(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .put(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(response).await.map(drop)
    }

    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        decode(response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(response).await.map(drop)
    }
}

/// Reject non-success responses, extracting the server's `message` when
/// the body allows it.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| format!("request failed with status {status}"));
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = check(response).await?;
    Ok(response.json::<T>().await?)
}
