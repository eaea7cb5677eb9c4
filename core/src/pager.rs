//! Follows `<collection>_links` relation links across a paginated listing.
//!
//! # Design
//! `Pager` is an iterator: each `next()` issues exactly one GET through the
//! retry wrapper, and nothing is fetched ahead of consumption. The first
//! request uses the initial path and query; every later request keeps the
//! initial path and takes its query from the relation link's `href`.
//!
//! Iteration stops when the page has no link in the configured direction,
//! when the link's query equals the query just sent (a server pointing at
//! itself, in any URL form), or after the first error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::executor::{Call, Executor};
use crate::retry::{retry_request, RetryPolicy, Sleeper};

/// Which relation link to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Next,
    Previous,
}

impl Direction {
    pub fn rel(self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub links: Vec<Link>,
}

impl Page {
    /// Read `body[collection]` and `body["{collection}_links"]`.
    pub fn from_body(collection: &str, body: &Value) -> Result<Self, ApiError> {
        let items = body
            .get(collection)
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                ApiError::DeserializationError(format!(
                    "response has no {collection:?} array"
                ))
            })?;
        let links = body
            .get(format!("{collection}_links"))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<Link>(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self { items, links })
    }

    pub fn link(&self, direction: Direction) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == direction.rel())
    }
}

/// Lazy sequence of pages from one listing endpoint.
pub struct Pager<'a> {
    executor: &'a Executor,
    policy: RetryPolicy,
    sleeper: &'a dyn Sleeper,
    collection: String,
    path: String,
    query: Vec<(String, String)>,
    direction: Direction,
    done: bool,
}

impl<'a> Pager<'a> {
    /// Pages always raise on retry exhaustion.
    pub fn new(
        executor: &'a Executor,
        policy: RetryPolicy,
        sleeper: &'a dyn Sleeper,
        collection: impl Into<String>,
        path: impl Into<String>,
        query: Vec<(String, String)>,
    ) -> Self {
        Self {
            executor,
            policy: policy.raising(),
            sleeper,
            collection: collection.into(),
            path: path.into(),
            query,
            direction: Direction::Next,
            done: false,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Drain every page into one collection, in server order.
    pub fn collect_all(self) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::new();
        for page in self {
            items.extend(page?.items);
        }
        Ok(items)
    }

    fn fetch(&mut self) -> Result<Page, ApiError> {
        let call = Call::get(self.path.clone()).queries(self.query.iter().cloned());
        let request = self.executor.build_request(&call)?;
        let response = retry_request(self.executor, &request, &self.policy, self.sleeper)?
            .ok_or_else(|| ApiError::ConnectionFailure {
                attempts: self.policy.attempts(),
                message: "retries exhausted".to_string(),
            })?;
        let body = response.body.into_json();
        let page = Page::from_body(&self.collection, &body)?;
        debug!(
            collection = %self.collection,
            items = page.items.len(),
            "fetched page"
        );
        Ok(page)
    }

    fn advance(&mut self, page: &Page) {
        let Some(link) = page.link(self.direction) else {
            self.done = true;
            return;
        };
        let query = link_query(&link.href);
        if query == self.query {
            warn!(
                collection = %self.collection,
                href = %link.href,
                "server repeated the link just fetched, stopping"
            );
            self.done = true;
            return;
        }
        self.query = query;
    }
}

impl Iterator for Pager<'_> {
    type Item = Result<Page, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.fetch() {
            Ok(page) => {
                self.advance(&page);
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Query pairs of a link `href`, absolute or relative.
pub fn link_query(href: &str) -> Vec<(String, String)> {
    let Some((_, query)) = href.split_once('?') else {
        return Vec::new();
    };
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
