pub mod puppeteer;

use std::borrow::Cow;

use serde_json::Value;
use tokio::time::sleep;

use crate::config::Poll;

pub use puppeteer::{ChromePage, LaunchConfig};

pub const PAGE_HEIGHT: &str = "document.body.scrollHeight";
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";
pub const HISTORY_BACK: &str = "history.back()";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(Cow<'static, str>),
    XPath(Cow<'static, str>),
    /// Form control by its `name` attribute.
    Name(Cow<'static, str>),
}

impl Locator {
    /// The locator as a CSS selector, if it can be written as one.
    pub fn css(&self) -> Option<Cow<'static, str>> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::Name(name) => Some(format!("[name=\"{name}\"]").into()),
            Self::XPath(_) => None,
        }
    }
}

/// The browser as the scraper sees it.
///
/// Every lookup reports absence as `Ok(None)` / an empty `Vec`; `Err` is kept
/// for the browser itself failing.
pub trait Page {
    type Node: Clone;

    async fn goto(&self, url: &str) -> anyhow::Result<()>;

    async fn find(&self, locator: &Locator) -> anyhow::Result<Option<Self::Node>>;

    async fn find_all(&self, locator: &Locator) -> anyhow::Result<Vec<Self::Node>>;

    async fn find_in(
        &self,
        node: &Self::Node,
        locator: &Locator,
    ) -> anyhow::Result<Option<Self::Node>>;

    async fn find_all_in(
        &self,
        node: &Self::Node,
        locator: &Locator,
    ) -> anyhow::Result<Vec<Self::Node>>;

    async fn text(&self, node: &Self::Node) -> anyhow::Result<String>;

    async fn attribute(&self, node: &Self::Node, name: &str) -> anyhow::Result<Option<String>>;

    async fn click(&self, node: &Self::Node) -> anyhow::Result<()>;

    /// Focuses `node` and types `text` into it.
    async fn type_into(&self, node: &Self::Node, text: &str) -> anyhow::Result<()>;

    async fn press_enter(&self) -> anyhow::Result<()>;

    /// Evaluates a script expression and returns its value.
    async fn evaluate(&self, script: &str) -> anyhow::Result<Value>;

    async fn quit(self) -> anyhow::Result<()>;
}

/// Looks for `locator` until it shows up or `poll` runs out.
pub async fn wait_for<P: Page>(
    page: &P,
    locator: &Locator,
    poll: Poll,
) -> anyhow::Result<Option<P::Node>> {
    for attempt in 1..=poll.max_attempts {
        if let Some(node) = page.find(locator).await? {
            return Ok(Some(node));
        }
        if attempt < poll.max_attempts {
            sleep(poll.interval).await;
        }
    }
    Ok(None)
}

pub async fn page_height<P: Page>(page: &P) -> anyhow::Result<u64> {
    match page.evaluate(PAGE_HEIGHT).await? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f as u64))
            .ok_or_else(|| anyhow::anyhow!("bad page height: {n}")),
        value => anyhow::bail!("page height is not a number: {value}"),
    }
}

pub async fn scroll_to_bottom<P: Page>(page: &P) -> anyhow::Result<()> {
    page.evaluate(SCROLL_TO_BOTTOM).await.map(|_| ())
}

pub async fn go_back<P: Page>(page: &P) -> anyhow::Result<()> {
    page.evaluate(HISTORY_BACK).await.map(|_| ())
}
