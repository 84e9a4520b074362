use crate::client::envelope::ResultEnvelope;
use crate::client::executor::RequestExecutor;
use crate::constants::pagination::{TOKEN_FIELD, VALUE_FIELD};
use crate::services::logger::Logger;
use serde_json::Value;
use url::Url;

#[derive(Clone)]
pub struct PaginationContinuer {
    logger: Logger,
    executor: RequestExecutor,
    max_pages: usize,
}

impl PaginationContinuer {
    pub fn new(executor: RequestExecutor) -> Self {
        let max_pages = executor.config().max_pages;
        Self {
            logger: executor.logger().child("pagination"),
            executor,
            max_pages,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub async fn continue_pages(&self, initial: ResultEnvelope) -> ResultEnvelope {
        let Some(first) = initial.data.as_ref() else {
            return initial;
        };
        let Some(token_value) = first.get(TOKEN_FIELD) else {
            return initial;
        };
        let Some(origin) = initial.origin.clone() else {
            self.logger
                .warn("Continuation token without originating request", None);
            return initial;
        };

        let mut items = page_items(first);
        let mut token = next_token(token_value);
        let mut requested = 0usize;

        while let Some(current) = token.take() {
            if requested >= self.max_pages {
                self.logger.warn(
                    "Pagination stopped at page limit",
                    Some(&serde_json::json!({ "max_pages": self.max_pages })),
                );
                break;
            }
            let url = match continuation_url(&origin.url, &current) {
                Ok(url) => url,
                Err(err) => {
                    self.logger.error(&format!("Pagination failed: {}", err), None);
                    break;
                }
            };

            let page = self.executor.follow(&origin, &url).await;
            requested += 1;
            if !page.success {
                self.logger.error(
                    &format!("Pagination failed: {}", page.error_text()),
                    Some(&serde_json::json!({
                        "status": page.status_code,
                        "pages_fetched": requested,
                    })),
                );
                break;
            }
            let Some(body) = page.data else {
                self.logger.error(
                    "Pagination failed: page body is empty or not JSON",
                    Some(&serde_json::json!({ "pages_fetched": requested })),
                );
                break;
            };

            items.extend(page_items(&body));
            token = body.get(TOKEN_FIELD).and_then(next_token);
        }

        self.logger.debug(
            "Pagination finished",
            Some(&serde_json::json!({ "requests": requested, "items": items.len() })),
        );
        ResultEnvelope::paginated(items, initial.headers, initial.origin)
    }
}

fn page_items(body: &Value) -> Vec<Value> {
    body.get(VALUE_FIELD)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn next_token(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

pub fn continuation_url(original: &str, token: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(original)?;
    url.set_query(None);
    url.query_pairs_mut().append_pair(TOKEN_FIELD, token);
    Ok(url.to_string())
}
