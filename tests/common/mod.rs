//! An in-memory Twitter client for driving the scraper without a browser.
#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use serde_json::{Value, json};
use tscr::{
    config::Credentials,
    login::CodePrompt,
    scrape::{HISTORY_BACK, Locator, PAGE_HEIGHT, Page, SCROLL_TO_BOTTOM},
    selectors::{
        LIKE_BUTTON, OVERLAY_USER, PASSWORD_FIELD, POST, POST_AUTHOR, POST_ID_ATTRIBUTE,
        POST_STATUS_LINK, POST_TEXT, POST_TIME, REPLY, RETWEET_BUTTON, TEXT_FIELD,
        TIME_ATTRIBUTE,
    },
};

#[derive(Clone, Debug)]
pub struct FakePost {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
    pub text: Option<String>,
    pub status_href: Option<String>,
    pub likes: Option<Vec<String>>,
    pub retweets: Option<Vec<String>>,
    pub replies: Vec<String>,
}

impl FakePost {
    pub fn new(n: usize) -> Self {
        Self {
            id: Some(format!("{}", 1_000 + n)),
            timestamp: Some(format!("2024-03-{:02}T10:00:00.000Z", n % 28 + 1)),
            author: Some(format!("@user{n}")),
            text: Some(format!("post #{n}")),
            status_href: Some(format!("/user{n}/status/{}", 1_000 + n)),
            likes: None,
            retweets: None,
            replies: Vec::new(),
        }
    }
}

/// `count` posts numbered from `first`.
pub fn posts(first: usize, count: usize) -> Vec<FakePost> {
    (first..first + count).map(FakePost::new).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
    Code,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    Post(usize),
    Time(usize),
    Text(usize),
    Author(usize),
    Link(usize),
    Like(usize),
    Retweet(usize),
    Reply(usize, usize),
    OverlayUser(usize),
    Field(Field),
}

/// Which login fields the site shows.
#[derive(Clone, Copy, Debug)]
pub struct LoginFlow {
    pub username: bool,
    pub password: bool,
    pub code: bool,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self {
            username: true,
            password: true,
            code: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct State {
    /// The first batch is rendered on load, each scroll renders the next.
    pub batches: Vec<Vec<FakePost>>,
    pub loaded: usize,
    /// Earlier batches stay in the DOM after scrolling.
    pub keep_mounted: bool,
    /// `find(POST)` misses this many times before the timeline shows up.
    pub render_delay: usize,
    pub never_renders: bool,
    pub broken_clicks: bool,
    /// The open overlay cannot be read.
    pub broken_overlay: bool,
    /// Reading the body of this post fails, as with an element detached
    /// mid-read.
    pub unreadable_text: Option<usize>,

    pub login: LoginFlow,
    pub login_step: usize,

    pub overlay: Option<Vec<String>>,
    pub visited: Vec<String>,
    pub typed: Vec<(Field, String)>,
    pub scrolls: usize,
    pub backs: usize,
    pub quit: bool,
}

impl State {
    fn all(&self) -> impl Iterator<Item = &FakePost> {
        self.batches.iter().flatten()
    }

    fn post(&self, i: usize) -> &FakePost {
        self.all().nth(i).expect("unknown post")
    }

    /// Indices of the posts currently in the DOM.
    fn mounted(&self) -> Vec<usize> {
        if self.never_renders || self.loaded == 0 {
            return Vec::new();
        }
        let start = if self.keep_mounted {
            0
        } else {
            self.batches[..self.loaded - 1].iter().map(Vec::len).sum()
        };
        let end = self.batches[..self.loaded].iter().map(Vec::len).sum();
        (start..end).collect()
    }

    fn height(&self) -> u64 {
        let rendered: usize = self.batches[..self.loaded].iter().map(Vec::len).sum();
        1_000 + 100 * rendered as u64
    }
}

pub struct FakePage {
    state: Rc<RefCell<State>>,
}

impl FakePage {
    pub fn timeline(batches: Vec<Vec<FakePost>>) -> Self {
        Self::with(State {
            batches,
            ..State::default()
        })
    }

    pub fn login(flow: LoginFlow) -> Self {
        Self::with(State {
            login: flow,
            ..State::default()
        })
    }

    pub fn with(state: State) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// A handle that outlives the page, for inspecting it after `quit`.
    pub fn state(&self) -> Rc<RefCell<State>> {
        Rc::clone(&self.state)
    }
}

impl Page for FakePage {
    type Node = Node;

    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        let mut s = self.state.borrow_mut();
        s.visited.push(url.to_owned());
        s.loaded = usize::from(!s.batches.is_empty());
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> anyhow::Result<Option<Node>> {
        let mut s = self.state.borrow_mut();
        if *locator == POST {
            if s.render_delay > 0 {
                s.render_delay -= 1;
                return Ok(None);
            }
            return Ok(s.mounted().first().copied().map(Node::Post));
        }
        let field = if *locator == TEXT_FIELD {
            match s.login_step {
                0 if s.login.username => Some(Field::Username),
                2 if s.login.code => Some(Field::Code),
                _ => None,
            }
        } else if *locator == PASSWORD_FIELD {
            (s.login_step == 1 && s.login.password).then_some(Field::Password)
        } else {
            anyhow::bail!("unexpected page lookup {locator:?}")
        };
        Ok(field.map(Node::Field))
    }

    async fn find_all(&self, locator: &Locator) -> anyhow::Result<Vec<Node>> {
        let s = self.state.borrow();
        if *locator == POST {
            Ok(s.mounted().into_iter().map(Node::Post).collect())
        } else if *locator == OVERLAY_USER {
            if s.broken_overlay {
                anyhow::bail!("overlay went away");
            }
            Ok((0..s.overlay.as_ref().map_or(0, Vec::len)).map(Node::OverlayUser).collect())
        } else {
            anyhow::bail!("unexpected page lookup {locator:?}")
        }
    }

    async fn find_in(&self, node: &Node, locator: &Locator) -> anyhow::Result<Option<Node>> {
        let s = self.state.borrow();
        let &Node::Post(i) = node else {
            anyhow::bail!("lookup inside {node:?}");
        };
        // An absolute XPath ignores its context node and starts from the
        // document, where the first mounted post comes first.
        let i = match locator {
            Locator::XPath(q) if !q.starts_with("./") => s.mounted().first().copied().unwrap_or(i),
            _ => i,
        };
        let post = s.post(i);
        let found = if *locator == POST_TIME {
            post.timestamp.is_some().then_some(Node::Time(i))
        } else if *locator == POST_TEXT {
            post.text.is_some().then_some(Node::Text(i))
        } else if *locator == POST_AUTHOR {
            post.author.is_some().then_some(Node::Author(i))
        } else if *locator == POST_STATUS_LINK {
            post.status_href.is_some().then_some(Node::Link(i))
        } else if *locator == LIKE_BUTTON {
            post.likes.is_some().then_some(Node::Like(i))
        } else if *locator == RETWEET_BUTTON {
            post.retweets.is_some().then_some(Node::Retweet(i))
        } else {
            anyhow::bail!("unexpected lookup {locator:?} in post")
        };
        Ok(found)
    }

    async fn find_all_in(&self, node: &Node, locator: &Locator) -> anyhow::Result<Vec<Node>> {
        let s = self.state.borrow();
        match node {
            &Node::Post(i) if *locator == REPLY => {
                Ok((0..s.post(i).replies.len()).map(|j| Node::Reply(i, j)).collect())
            }
            _ => anyhow::bail!("unexpected lookup {locator:?} in {node:?}"),
        }
    }

    async fn text(&self, node: &Node) -> anyhow::Result<String> {
        let s = self.state.borrow();
        if matches!(*node, Node::Text(i) if s.unreadable_text == Some(i)) {
            anyhow::bail!("Node with given id does not belong to the document");
        }
        let text = match *node {
            Node::Text(i) => s.post(i).text.clone(),
            Node::Author(i) => s.post(i).author.clone(),
            Node::Reply(i, j) => s.post(i).replies.get(j).cloned(),
            Node::OverlayUser(j) => s.overlay.as_ref().and_then(|o| o.get(j).cloned()),
            _ => None,
        };
        text.ok_or_else(|| anyhow::anyhow!("no text on {node:?}"))
    }

    async fn attribute(&self, node: &Node, name: &str) -> anyhow::Result<Option<String>> {
        let s = self.state.borrow();
        Ok(match (*node, name) {
            (Node::Time(i), TIME_ATTRIBUTE) => s.post(i).timestamp.clone(),
            (Node::Post(i), POST_ID_ATTRIBUTE) => s.post(i).id.clone(),
            (Node::Link(i), "href") => s.post(i).status_href.clone(),
            _ => None,
        })
    }

    async fn click(&self, node: &Node) -> anyhow::Result<()> {
        let mut s = self.state.borrow_mut();
        if s.broken_clicks {
            anyhow::bail!("element is not clickable");
        }
        s.overlay = match *node {
            Node::Like(i) => s.post(i).likes.clone(),
            Node::Retweet(i) => s.post(i).retweets.clone(),
            _ => anyhow::bail!("clicked {node:?}"),
        };
        Ok(())
    }

    async fn type_into(&self, node: &Node, text: &str) -> anyhow::Result<()> {
        let Node::Field(field) = *node else {
            anyhow::bail!("typed into {node:?}");
        };
        self.state.borrow_mut().typed.push((field, text.to_owned()));
        Ok(())
    }

    async fn press_enter(&self) -> anyhow::Result<()> {
        self.state.borrow_mut().login_step += 1;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> anyhow::Result<Value> {
        let mut s = self.state.borrow_mut();
        match script {
            PAGE_HEIGHT => Ok(json!(s.height())),
            SCROLL_TO_BOTTOM => {
                s.scrolls += 1;
                if s.loaded < s.batches.len() {
                    s.loaded += 1;
                }
                Ok(Value::Null)
            }
            HISTORY_BACK => {
                s.backs += 1;
                s.overlay = None;
                Ok(Value::Null)
            }
            _ => anyhow::bail!("unexpected script {script:?}"),
        }
    }

    async fn quit(self) -> anyhow::Result<()> {
        self.state.borrow_mut().quit = true;
        Ok(())
    }
}

/// Hands out a fixed code and counts how often it was asked.
#[derive(Default)]
pub struct ScriptedCode {
    pub code: Option<String>,
    pub asked: usize,
}

impl CodePrompt for ScriptedCode {
    fn read_code(&mut self) -> std::io::Result<String> {
        self.asked += 1;
        self.code
            .clone()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
    }
}

pub fn credentials() -> Credentials {
    Credentials::new(Some("alice".into()), Some("hunter2".into())).unwrap()
}
