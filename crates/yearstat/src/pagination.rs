//! Best-effort pagination over `page`/`per_page` endpoints.
//!
//! Pages are fetched in order until one comes back empty or its `Link` header
//! no longer advertises `rel="next"`. A failure mid-sequence stops the walk
//! and keeps whatever was already collected.

use serde::de::DeserializeOwned;

use crate::client::StatsClient;
use crate::error::FailureReason;

/// Whether a `Link` header advertises a `rel="next"` relation.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/user/123/repos?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn has_next_page(link_header: &str) -> bool {
    link_header.split(',').any(|part| {
        part.split(';')
            .filter_map(|segment| segment.trim().strip_prefix("rel="))
            .any(|rel| rel.trim_matches('"') == "next")
    })
}

/// Items collected by [`StatsClient::paginated_get`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageCollection<T> {
    /// Every item, in page order then within-page order.
    pub items: Vec<T>,
    /// Set when a page failed and the walk stopped early.
    pub interrupted: Option<FailureReason>,
}

impl StatsClient {
    /// Collect every item of a paginated listing.
    ///
    /// `params` are sent on every page alongside `per_page` and `page`.
    pub async fn paginated_get<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> PageCollection<T> {
        let mut collected = PageCollection {
            items: Vec::new(),
            interrupted: None,
        };
        let per_page = self.config().page_size.to_string();
        let mut page = 1u32;

        loop {
            let mut page_params: Vec<(&str, String)> = params.to_vec();
            page_params.push(("per_page", per_page.clone()));
            page_params.push(("page", page.to_string()));

            let response = match self.fetch(url, &page_params).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(url, page, error = %e, "Pagination stopped on transport error");
                    collected.interrupted = Some(e.into());
                    break;
                }
            };

            if !response.is_ok() {
                tracing::warn!(url, page, status = response.status, "Pagination stopped on error status");
                collected.interrupted = Some(FailureReason::from_response(&response));
                break;
            }

            let items: Vec<T> = match response.json() {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(url, page, error = %e, "Pagination stopped on undecodable page");
                    collected.interrupted = Some(e.into());
                    break;
                }
            };

            if items.is_empty() {
                break;
            }

            collected.items.extend(items);
            tracing::debug!(url, page, total_so_far = collected.items.len(), "Fetched page");

            if !response.header("link").is_some_and(has_next_page) {
                break;
            }

            page += 1;
        }

        collected
    }
}
