use chrono::NaiveDate;
use tracing::{debug, info};
use url::Url;

use crate::datetime::format_us_date;
use crate::{Error, Result};

/// Retrieves the schedule page for a date range from the booking system.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    upstream: Url,
    start_param: String,
    end_param: String,
}

impl Fetcher {
    pub fn new(upstream: &str, start_param: impl Into<String>, end_param: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            upstream: Url::parse(upstream)?,
            start_param: start_param.into(),
            end_param: end_param.into(),
        })
    }

    /// Origin of the upstream site, used to resolve relative detail links.
    pub fn origin(&self) -> String {
        self.upstream.origin().ascii_serialization()
    }

    pub fn url(&self, start: NaiveDate, end: NaiveDate) -> Url {
        let mut url = self.upstream.clone();
        url.query_pairs_mut()
            .append_pair(&self.start_param, &format_us_date(start))
            .append_pair(&self.end_param, &format_us_date(end));
        url
    }

    /// Fetches the page; any non-2xx answer is an error.
    pub async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<String> {
        let url = self.url(start, end);

        info!(url = %url, "fetching schedule page");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!(bytes = html.len(), "received schedule page");
        Ok(html)
    }
}
