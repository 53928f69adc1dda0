use std::{borrow::Cow, ffi::OsStr, path::PathBuf, sync::Arc, time::Duration};

use headless_chrome::{
    Browser, Element, LaunchOptions, Tab,
    browser::tab::NoElementFound,
    protocol::cdp::DOM,
};
use serde_json::{Value, json};
use tokio::task::spawn_blocking;

use super::{Locator, Page};

#[derive(Clone, Debug, Default)]
pub struct LaunchConfig {
    pub headless: bool,
    pub proxy: Option<String>,
    /// Chrome/Chromium executable; searched for on the system when absent.
    pub browser_path: Option<PathBuf>,
}

pub fn puppeteer(config: &LaunchConfig) -> anyhow::Result<Browser> {
    Browser::new(LaunchOptions {
        args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
        headless: config.headless,
        proxy_server: config.proxy.as_deref(),
        path: config.browser_path.clone(),
        idle_browser_timeout: Duration::from_secs(600),
        ..LaunchOptions::default()
    })
}

#[allow(clippy::significant_drop_tightening)]
pub fn first_tab(browser: &Browser) -> anyhow::Result<Arc<Tab>> {
    let tab = browser.new_tab()?;

    {
        let tabs_guard = browser
            .get_tabs()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for remain in &*tabs_guard {
            if !Arc::ptr_eq(&tab, remain) {
                remain.close(true)?;
            }
        }
    }

    Ok(tab)
}

/// An element detached from the tab borrow, so it can cross into blocking
/// tasks and be rebuilt on the other side.
#[derive(Clone, Debug)]
pub struct Node {
    remote_object_id: String,
    backend_node_id: DOM::NodeId,
    node_id: DOM::NodeId,
    attributes: Option<Vec<String>>,
    tag_name: String,
    value: String,
}

impl Node {
    fn detach(element: Element<'_>) -> Self {
        Self {
            remote_object_id: element.remote_object_id,
            backend_node_id: element.backend_node_id,
            node_id: element.node_id,
            attributes: element.attributes,
            tag_name: element.tag_name,
            value: element.value,
        }
    }

    fn attach<'tab>(&self, tab: &'tab Tab) -> Element<'tab> {
        Element {
            remote_object_id: self.remote_object_id.clone(),
            backend_node_id: self.backend_node_id,
            node_id: self.node_id,
            parent: tab,
            attributes: self.attributes.clone(),
            tag_name: self.tag_name.clone(),
            value: self.value.clone(),
        }
    }

    /// Attributes come as a flat `[name, value, name, value, ..]` list.
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .as_deref()?
            .chunks_exact(2)
            .find(|pair| pair[0] == name)
            .map(|pair| &*pair[1])
    }
}

fn not_found_as_empty<T>(result: anyhow::Result<Vec<T>>) -> anyhow::Result<Vec<T>> {
    match result {
        Err(err) if err.is::<NoElementFound>() => Ok(Vec::new()),
        other => other,
    }
}

// Lookups below a node run in the page with the node as `this`. The DOM
// domain's own XPath search covers the whole document, and node ids go stale
// whenever the document is requested again; remote object ids do not.
const CSS_ITEM: &str = "function(selector, i) { return this.querySelectorAll(selector)[i] ?? null; }";
const XPATH_ITEM: &str = "function(query, i) { \
    return document.evaluate(query, this, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotItem(i); }";

fn query_tab<'tab>(tab: &'tab Tab, locator: &Locator, max: usize) -> anyhow::Result<Vec<Element<'tab>>> {
    match locator.css() {
        Some(selector) => not_found_as_empty(tab.find_elements(&selector)),
        None => {
            let document = Element::new(tab, tab.get_document()?.node_id)?;
            query_element(&document, locator, max)
        }
    }
}

/// Up to `max` matches of `locator` below `element`, in document order.
fn query_element<'tab>(
    element: &Element<'tab>,
    locator: &Locator,
    max: usize,
) -> anyhow::Result<Vec<Element<'tab>>> {
    let (function, query) = match locator.css() {
        Some(selector) => (CSS_ITEM, selector),
        None => (XPATH_ITEM, Cow::Borrowed(xpath(locator))),
    };
    let tab = element.parent;

    let mut found = Vec::new();
    for i in 0..max {
        let item = element.call_js_fn(function, vec![json!(&*query), json!(i)], false)?;
        let Some(object_id) = item.object_id else {
            break;
        };
        let node_id = tab.call_method(DOM::RequestNode { object_id })?.node_id;
        found.push(Element::new(tab, node_id)?);
    }
    Ok(found)
}

fn xpath(locator: &Locator) -> &str {
    match locator {
        Locator::XPath(s) | Locator::Css(s) | Locator::Name(s) => s,
    }
}

/// A single Chrome tab driven over the DevTools protocol.
pub struct ChromePage {
    // Dropping the browser kills the process, so it lives as long as the tab.
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    pub fn launch(config: &LaunchConfig) -> anyhow::Result<Self> {
        let browser = puppeteer(config)?;
        let tab = first_tab(&browser)?;
        log::info!(target: "browser", "browser started (headless: {})", config.headless);
        Ok(Self { browser, tab })
    }

    async fn with_tab<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        spawn_blocking(move || f(&tab)).await?
    }
}

impl Page for ChromePage {
    type Node = Node;

    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        let url = url.to_owned();
        log::debug!(target: "browser", "navigating to {url}");
        self.with_tab(move |tab| {
            tab.navigate_to(&url)?.wait_until_navigated()?;
            Ok(())
        })
        .await
    }

    async fn find(&self, locator: &Locator) -> anyhow::Result<Option<Node>> {
        let locator = locator.clone();
        self.with_tab(move |tab| Ok(query_tab(tab, &locator, 1)?.into_iter().next().map(Node::detach)))
            .await
    }

    async fn find_all(&self, locator: &Locator) -> anyhow::Result<Vec<Node>> {
        let locator = locator.clone();
        self.with_tab(move |tab| Ok(query_tab(tab, &locator, usize::MAX)?.into_iter().map(Node::detach).collect()))
            .await
    }

    async fn find_in(&self, node: &Node, locator: &Locator) -> anyhow::Result<Option<Node>> {
        let (node, locator) = (node.clone(), locator.clone());
        self.with_tab(move |tab| {
            let element = node.attach(tab);
            Ok(query_element(&element, &locator, 1)?.into_iter().next().map(Node::detach))
        })
        .await
    }

    async fn find_all_in(&self, node: &Node, locator: &Locator) -> anyhow::Result<Vec<Node>> {
        let (node, locator) = (node.clone(), locator.clone());
        self.with_tab(move |tab| {
            let element = node.attach(tab);
            Ok(query_element(&element, &locator, usize::MAX)?.into_iter().map(Node::detach).collect())
        })
        .await
    }

    async fn text(&self, node: &Node) -> anyhow::Result<String> {
        let node = node.clone();
        self.with_tab(move |tab| node.attach(tab).get_inner_text()).await
    }

    async fn attribute(&self, node: &Node, name: &str) -> anyhow::Result<Option<String>> {
        Ok(node.attribute(name).map(ToOwned::to_owned))
    }

    async fn click(&self, node: &Node) -> anyhow::Result<()> {
        let node = node.clone();
        self.with_tab(move |tab| node.attach(tab).click().map(|_| ())).await
    }

    async fn type_into(&self, node: &Node, text: &str) -> anyhow::Result<()> {
        let (node, text) = (node.clone(), text.to_owned());
        self.with_tab(move |tab| node.attach(tab).type_into(&text).map(|_| ()))
            .await
    }

    async fn press_enter(&self) -> anyhow::Result<()> {
        self.with_tab(|tab| tab.press_key("Enter").map(|_| ())).await
    }

    async fn evaluate(&self, script: &str) -> anyhow::Result<Value> {
        let script = script.to_owned();
        self.with_tab(move |tab| Ok(tab.evaluate(&script, false)?.value.unwrap_or(Value::Null)))
            .await
    }

    async fn quit(self) -> anyhow::Result<()> {
        let Self { browser, tab } = self;
        let closed = spawn_blocking(move || tab.close(true).map(|_| ())).await?;
        drop(browser);
        log::info!(target: "browser", "browser closed");
        closed
    }
}
