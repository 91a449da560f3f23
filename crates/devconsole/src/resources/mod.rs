//! Typed records of the developers backend and the client that queries them.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod client;
mod models;

pub use client::{ApiError, ResourceClient};
pub use models::{
    ApiCredential, ApiEvent, ApiRequestLog, Dated, WebhookEndpoint, WebhookRequestLog,
    WebhookStatus,
};

/// A record type served under a REST collection.
pub trait Resource: Serialize + DeserializeOwned {
    /// Collection path relative to the API base, e.g. `api-credentials`.
    const PATH: &'static str;
    /// Envelope key of a single record, e.g. `api_credential`.
    const SINGULAR_KEY: &'static str;
    /// Envelope key of a list, e.g. `api_credentials`.
    const PLURAL_KEY: &'static str;

    fn id(&self) -> Option<&str>;
}

/// Query parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub page: Option<u32>,
    /// `-1` requests every record.
    pub limit: Option<i64>,
    /// Field to sort on; a leading `-` sorts descending.
    pub sort: Option<String>,
    pub query: Option<String>,
    pub columns: Vec<String>,
    pub filters: BTreeMap<String, String>,
}

impl ResourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults of the request log and event screens.
    pub fn paged() -> Self {
        Self {
            page: Some(1),
            limit: Some(40),
            sort: Some("-id".to_string()),
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self::new().limit(-1)
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Free-text search. Searching always restarts from the first page;
    /// an empty query removes the search.
    pub fn search(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = if query.trim().is_empty() {
            None
        } else {
            Some(query)
        };
        self.page = Some(1);
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Query string pairs in a stable order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(query) = &self.query {
            pairs.push(("query".to_string(), query.clone()));
        }
        for column in &self.columns {
            pairs.push(("columns[]".to_string(), column.clone()));
        }
        for (field, value) in &self.filters {
            pairs.push((field.clone(), value.clone()));
        }
        pairs
    }
}

/// Pagination metadata returned next to a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub total: Option<u64>,
    pub per_page: Option<u64>,
    pub current_page: Option<u64>,
    pub last_page: Option<u64>,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

/// One page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub meta: Option<PageMeta>,
}

impl<R> Page<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_next(&self) -> bool {
        match &self.meta {
            Some(PageMeta {
                current_page: Some(current),
                last_page: Some(last),
                ..
            }) => current < last,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_resets_page() {
        let query = ResourceQuery::paged().page(4).search("orders");
        assert_eq!(query.page, Some(1));
        assert_eq!(query.query.as_deref(), Some("orders"));
        assert_eq!(ResourceQuery::paged().search("  ").query, None);
    }

    #[test]
    fn pairs_are_ordered() {
        let query = ResourceQuery::paged()
            .column("uuid")
            .column("created_at")
            .filter("method", "POST")
            .filter("key", "abc");

        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "40".to_string()),
                ("sort".to_string(), "-id".to_string()),
                ("columns[]".to_string(), "uuid".to_string()),
                ("columns[]".to_string(), "created_at".to_string()),
                ("key".to_string(), "abc".to_string()),
                ("method".to_string(), "POST".to_string()),
            ]
        );
    }

    #[test]
    fn has_next_page() {
        let page: Page<()> = Page {
            records: vec![],
            meta: Some(PageMeta {
                current_page: Some(1),
                last_page: Some(3),
                ..Default::default()
            }),
        };
        assert!(page.has_next());
    }
}
