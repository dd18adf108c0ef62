//! HTTP seam shared by the remote API client and the Pushover notifier

use async_trait::async_trait;

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP verbs watchpost needs, mockable in tests
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// GET `url`
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// POST a JSON document
    async fn post_json(&self, url: &str, body: &str) -> crate::Result<HttpResponse>;

    /// POST `params` form-encoded
    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> crate::Result<HttpResponse>;

    /// DELETE `url`
    async fn delete(&self, url: &str) -> crate::Result<HttpResponse>;
}

/// reqwest-backed client used outside tests
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    async fn finish(
        method: &str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> crate::Result<HttpResponse> {
        let response = request.send().await.map_err(|e| {
            crate::WatchpostError::Http(format!("{} {} failed: {}", method, url, e))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::WatchpostError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        Self::finish("GET", url, self.client.get(url)).await
    }

    async fn post_json(&self, url: &str, body: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {} (json)", url);
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        Self::finish("POST", url, request).await
    }

    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        Self::finish("POST", url, self.client.post(url).form(params)).await
    }

    async fn delete(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("DELETE {}", url);
        Self::finish("DELETE", url, self.client.delete(url)).await
    }
}
