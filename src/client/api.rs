use async_trait::async_trait;
use reqwest::{StatusCode, Url, header::RETRY_AFTER};
use std::time::Duration;

use super::ClientError;
use crate::models::{CountResponse, ErrorBody, LikeOp, LikeRequest, LikeResponse};

// Abort a like/unlike or count request after this long
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// Used when a 429 arrives without a readable Retry-After
const FALLBACK_RETRY_AFTER_SECS: u64 = 60;

/// Transport the like widget talks to.
#[async_trait]
pub trait LikeApi: Send + Sync {
    async fn get_count(&self, post_id: &str) -> Result<u64, ClientError>;

    /// Like or unlike; returns the server's canonical count.
    async fn mutate(&self, post_id: &str, op: LikeOp) -> Result<u64, ClientError>;
}

#[derive(Clone)]
pub struct HttpLikeApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLikeApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl LikeApi for HttpLikeApi {
    async fn get_count(&self, post_id: &str) -> Result<u64, ClientError> {
        let url = Url::parse_with_params(&self.url("/like/count"), &[("postId", post_id)])
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(error_from_response(res).await);
        }
        let body: CountResponse = res.json().await?;
        Ok(body.count)
    }

    async fn mutate(&self, post_id: &str, op: LikeOp) -> Result<u64, ClientError> {
        let request = LikeRequest {
            post_id: post_id.to_string(),
            op,
        };

        let res = self
            .client
            .post(self.url("/like"))
            .json(&request)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(error_from_response(res).await);
        }

        let body: LikeResponse = res.json().await?;
        if !body.success {
            return Err(ClientError::Decode("success flag not set".to_string()));
        }
        Ok(body.count)
    }
}

async fn error_from_response(res: reqwest::Response) -> ClientError {
    let status = res.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = res
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(FALLBACK_RETRY_AFTER_SECS);
        return ClientError::RateLimited { retry_after_secs };
    }

    match res.json::<ErrorBody>().await {
        Ok(body) => ClientError::Server {
            status: status.as_u16(),
            code: Some(body.code),
            message: body.error,
        },
        Err(_) => ClientError::Server {
            status: status.as_u16(),
            code: None,
            message: status.canonical_reason().unwrap_or("error").to_string(),
        },
    }
}
