//! HTTP client for the Pecha API

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};

use super::error::ApiError;
use super::models::DetailsQuery;
use crate::text::{ContentPage, TableOfContents};

/// Anything that can serve text content to a reading session
pub trait ContentSource {
    /// Fetch one page of text details
    fn text_details(
        &self,
        text_id: &str,
        query: &DetailsQuery,
    ) -> impl Future<Output = Result<ContentPage, ApiError>> + Send;

    /// Fetch the table of contents for a text
    fn table_of_contents(
        &self,
        text_id: &str,
    ) -> impl Future<Output = Result<TableOfContents, ApiError>> + Send;
}

/// Pecha REST API client
#[derive(Debug, Clone)]
pub struct PechaClient {
    /// HTTP client
    client: Client,
    /// API base URL, without a trailing slash
    base_url: Url,
}

impl PechaClient {
    /// Create a client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, text_id: &str, tail: &str) -> String {
        format!("{}/texts/{}/{}", self.base_url.as_str().trim_end_matches('/'), text_id, tail)
    }

    /// Map non-success statuses to errors
    async fn check_status(response: Response, what: &str) -> Result<Response, ApiError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::ApiError { status: status.as_u16(), message });
        }

        Ok(response)
    }
}

impl ContentSource for PechaClient {
    async fn text_details(
        &self,
        text_id: &str,
        query: &DetailsQuery,
    ) -> Result<ContentPage, ApiError> {
        let url = self.endpoint(text_id, "details");
        tracing::debug!(%url, ?query, "fetching text details");

        let response = self.client.post(&url).json(query).send().await?;
        let response = Self::check_status(response, text_id).await?;

        let body = response.text().await?;
        let page: ContentPage = serde_json::from_str(&body)?;
        Ok(page)
    }

    async fn table_of_contents(&self, text_id: &str) -> Result<TableOfContents, ApiError> {
        let url = self.endpoint(text_id, "contents");
        tracing::debug!(%url, "fetching table of contents");

        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response, text_id).await?;

        let body = response.text().await?;
        let toc: TableOfContents = serde_json::from_str(&body)?;
        Ok(toc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client =
            PechaClient::new("https://api.example.org/api/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint("t1", "details"), "https://api.example.org/api/v1/texts/t1/details");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = PechaClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }
}
