use crate::config::Settings;
use crate::scraping::error::ScrapeError;
use crate::types::month::Month;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::future::Future;

/// Something that can produce the diary page for a month.
pub trait PageSource {
    /// Address of the page for `month`, used in log lines.
    fn url(&self, month: Month) -> String;

    fn fetch_page(&self, month: Month) -> impl Future<Output = Result<String, ScrapeError>> + Send;
}

/// Fetches diary pages over HTTP with a fixed browser-like user agent.
pub struct PageFetcher {
    client: Client,
    url_prefix: String,
}

impl PageFetcher {
    pub fn new(settings: &Settings) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        if let Ok(agent) = HeaderValue::from_str(&settings.user_agent) {
            headers.insert(USER_AGENT, agent);
        } else {
            warn!(
                "Ignoring user agent '{}': not a valid header value",
                settings.user_agent
            );
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ScrapeError::ClientBuild)?;

        Ok(Self {
            client,
            url_prefix: settings.month_url_prefix(),
        })
    }
}

impl PageSource for PageFetcher {
    fn url(&self, month: Month) -> String {
        format!("{}/{}/{:02}/", self.url_prefix, month.year(), month.month())
    }

    fn fetch_page(&self, month: Month) -> impl Future<Output = Result<String, ScrapeError>> + Send {
        let url = self.url(month);
        async move {
            debug!("Downloading diary page {}", url);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| ScrapeError::NetworkRequest(url.clone(), e))?;

            let response = match response.error_for_status() {
                Ok(resp) => resp,
                Err(e) => {
                    return Err(if let Some(status) = e.status() {
                        ScrapeError::HttpStatus {
                            url,
                            status,
                            source: e,
                        }
                    } else {
                        ScrapeError::NetworkRequest(url, e)
                    });
                }
            };

            let body = response
                .text()
                .await
                .map_err(|e| ScrapeError::Body(url.clone(), e))?;
            debug!("Received {} bytes from {}", body.len(), url);
            Ok(body)
        }
    }
}
