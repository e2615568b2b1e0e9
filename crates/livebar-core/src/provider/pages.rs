//! Cursor pagination over Helix list endpoints.

use serde_json::Value;

use super::ProviderClient;
use crate::domain::Result;
use crate::ports::Method;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub data: Vec<Value>,
    pub cursor: Option<String>,
}

impl Page {
    pub fn from_body(mut body: Value) -> Self {
        let data = match body.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let cursor = body
            .pointer("/pagination/cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Self { data, cursor }
    }
}

/// Lazily walks a list endpoint page by page.
///
/// The first call uses the caller's params; each following call adds
/// `after=<cursor>` from the previous page. Ends when a page has no cursor.
/// There is no way to resume from the middle: start a new paginator instead.
pub struct Paginator<'a> {
    client: &'a ProviderClient,
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    cursor: Option<String>,
    finished: bool,
}

impl<'a> Paginator<'a> {
    pub(crate) fn new(
        client: &'a ProviderClient,
        method: Method,
        path: impl Into<String>,
        params: Vec<(String, String)>,
    ) -> Self {
        Self {
            client,
            method,
            path: path.into(),
            params,
            cursor: None,
            finished: false,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.finished {
            return Ok(None);
        }

        let mut params = self.params.clone();
        if let Some(cursor) = &self.cursor {
            params.push(("after".to_string(), cursor.clone()));
        }

        let body = self.client.request(self.method, &self.path, &params).await?;
        let page = Page::from_body(body);
        self.cursor = page.cursor.clone();
        self.finished = self.cursor.is_none();
        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_reads_data_and_cursor() {
        let page = Page::from_body(json!({"data": [1, 2], "pagination": {"cursor": "c1"}}));
        assert_eq!(page.data, vec![json!(1), json!(2)]);
        assert_eq!(page.cursor.as_deref(), Some("c1"));
    }

    #[test]
    fn empty_pagination_means_last_page() {
        let page = Page::from_body(json!({"data": [], "pagination": {}}));
        assert!(page.data.is_empty());
        assert_eq!(page.cursor, None);

        let page = Page::from_body(json!({"data": [3], "pagination": {"cursor": ""}}));
        assert_eq!(page.cursor, None);
    }
}
