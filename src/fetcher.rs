use crate::error::UpstreamFetchError;
use crate::github::{self, GitHubApi, ListParams};
use serde_json::Value;

/// Default page size for paginated collection reads.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Fetches every page of a collection resource, in order.
///
/// Pages are requested one at a time starting at page 1. The loop stops on an
/// empty page or on a page holding fewer than `per_page` items. Any failing page
/// fails the whole fetch and the items gathered so far are dropped.
pub async fn fetch_all_pages(
    api: &dyn GitHubApi,
    route: &str,
    per_page: u32,
) -> Result<Vec<Value>, UpstreamFetchError> {
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let params = ListParams::per_page(per_page).page(page);
        let batch = github::get_array(api, route, &params).await?;
        let batch_len = batch.len();

        if batch_len == 0 {
            break;
        }

        items.extend(batch);
        page += 1;

        if batch_len < per_page as usize {
            break;
        }
    }

    tracing::debug!(route, pages = page - 1, items = items.len(), "Fetched all pages");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoId;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves pre-built pages and records every requested page number.
    struct PagedSource {
        pages: Vec<Value>,
        requested: Mutex<Vec<u32>>,
    }

    impl PagedSource {
        fn new(pages: Vec<Value>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GitHubApi for PagedSource {
        async fn get_json(
            &self,
            _route: &str,
            params: &ListParams,
        ) -> Result<Value, UpstreamFetchError> {
            let page = params.page.unwrap_or(1);
            self.requested.lock().unwrap().push(page);
            Ok(self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_else(|| json!([])))
        }

        async fn pull_request_diff(
            &self,
            _repo_id: &RepoId,
            _pull_number: u64,
        ) -> Result<String, UpstreamFetchError> {
            unreachable!("not used by the fetcher")
        }
    }

    fn page_of(start: usize, len: usize) -> Value {
        Value::Array((start..start + len).map(|i| json!({ "id": i })).collect())
    }

    #[tokio::test]
    async fn test_full_page_then_empty_page() {
        let source = PagedSource::new(vec![page_of(0, 100), json!([])]);

        let items = fetch_all_pages(&source, "/users/octocat/repos", 100)
            .await
            .unwrap();

        assert_eq!(items.len(), 100);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_short_page_stops_without_extra_request() {
        let source = PagedSource::new(vec![page_of(0, 100), page_of(100, 42)]);

        let items = fetch_all_pages(&source, "/users/octocat/repos", 100)
            .await
            .unwrap();

        assert_eq!(items.len(), 142);
        assert_eq!(source.requested(), vec![1, 2]);
        // Source order is preserved across pages.
        assert_eq!(items[0]["id"], 0);
        assert_eq!(items[141]["id"], 141);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let source = PagedSource::new(vec![]);

        let items = fetch_all_pages(&source, "/users/nobody/repos", 100)
            .await
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(source.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_non_array_page_fails_whole_fetch() {
        let source = PagedSource::new(vec![
            page_of(0, 100),
            json!({ "message": "API rate limit exceeded" }),
        ]);

        let result = fetch_all_pages(&source, "/users/octocat/repos", 100).await;

        assert!(matches!(
            result,
            Err(UpstreamFetchError::NotAnArray { ref route }) if route == "/users/octocat/repos"
        ));
    }
}
