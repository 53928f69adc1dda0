use std::sync::LazyLock;

use compact_str::CompactString;
use hashbrown::HashSet;
use regex::Regex;
use tokio::time::sleep;

use crate::{
    config::Pacing,
    error::{Error, Result, SkipReason},
    interactions::scrape_interactions,
    model::{Limit, Post, Variant},
    scrape::{Page, page_height, scroll_to_bottom, wait_for},
    selectors::{
        POST, POST_AUTHOR, POST_ID_ATTRIBUTE, POST_STATUS_LINK, POST_TEXT, POST_TIME,
        TIME_ATTRIBUTE,
    },
    util::{normalize_url, preview},
};

static STATUS_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/status/(\d+)").unwrap());

#[derive(Clone, Copy, Debug, Default)]
pub struct ScrapeOptions {
    pub limit: Limit,
    pub variant: Variant,
    /// Drop posts already captured earlier in the run.
    ///
    /// Every pass re-reads all posts still mounted in the page, so without
    /// this a timeline that keeps older posts rendered yields the same post
    /// once per pass.
    pub dedup: bool,
    pub pacing: Pacing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    LimitReached,
    /// A scroll left the page height unchanged.
    Exhausted,
}

/// Everything one walk down a timeline produced.
#[derive(Debug)]
pub struct Harvest {
    pub posts: Vec<Post>,
    pub skipped: Vec<SkipReason>,
    /// Posts dropped by the dedup filter.
    pub duplicates: usize,
    /// Engagement lists that could not be read (extended variant).
    pub interaction_failures: usize,
    pub scrolls: usize,
    pub stop: StopReason,
}

/// Walks the timeline at `url`, scrolling until `options.limit` posts are
/// collected or the page stops growing.
pub async fn scrape_profile<P: Page>(page: &P, url: &str, options: &ScrapeOptions) -> Result<Harvest> {
    let url = normalize_url(url);
    tracing::info!(target: "timeline", "opening profile page \x1b[1;36m{url}\x1b[0m ...");
    page.goto(&url).await?;

    if wait_for(page, &POST, options.pacing.element_wait).await?.is_none() {
        return Err(Error::ContentNotFound(url.into_owned()));
    }

    let mut harvest = Harvest {
        posts: Vec::new(),
        skipped: Vec::new(),
        duplicates: 0,
        interaction_failures: 0,
        scrolls: 0,
        stop: StopReason::LimitReached,
    };
    let mut seen = HashSet::new();
    let mut last_height = page_height(page).await?;

    while !options.limit.reached(harvest.posts.len()) {
        tracing::info!(target: "timeline", "extracting tweets... {}/{}", harvest.posts.len(), options.limit);

        for node in page.find_all(&POST).await? {
            if options.limit.reached(harvest.posts.len()) {
                break;
            }
            let mut post = match extract_post(page, &node, options.variant).await {
                Ok(post) => post,
                Err(Error::ElementExtractionSkipped(reason)) => {
                    tracing::debug!(target: "timeline", "skipping post: {reason}");
                    harvest.skipped.push(reason);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if options.dedup && !seen.insert(dedup_key(&post)) {
                harvest.duplicates += 1;
                continue;
            }
            if options.variant == Variant::Extended {
                let (engagement, failures) = scrape_interactions(page, &node, &options.pacing).await;
                harvest.interaction_failures += failures.len();
                post.engagement = Some(engagement);
            }
            tracing::info!(target: "timeline", "extracted tweet: {}...", preview(&post.text, 50));
            harvest.posts.push(post);
        }

        if options.limit.reached(harvest.posts.len()) {
            break;
        }

        scroll_to_bottom(page).await?;
        harvest.scrolls += 1;
        sleep(options.pacing.scroll_settle).await;

        let height = page_height(page).await?;
        if height == last_height {
            tracing::info!(target: "timeline", "no more tweets to load, stopping scrolling");
            harvest.stop = StopReason::Exhausted;
            break;
        }
        last_height = height;
    }

    if !harvest.skipped.is_empty() || harvest.duplicates != 0 {
        tracing::info!(target: "timeline", "\x1b[33m{} skipped, {} duplicates dropped\x1b[0m", harvest.skipped.len(), harvest.duplicates);
    }
    Ok(harvest)
}

/// Reads the fields of one rendered post, without engagement. Anything
/// missing turns into [`Error::ElementExtractionSkipped`]; the caller moves
/// on to the next post.
async fn extract_post<P: Page>(page: &P, node: &P::Node, variant: Variant) -> Result<Post> {
    let stale = |e: anyhow::Error| Error::skipped(SkipReason::Stale(e.to_string()));

    let time = page
        .find_in(node, &POST_TIME)
        .await
        .map_err(stale)?
        .ok_or_else(|| Error::skipped(SkipReason::MissingTimestamp))?;
    let timestamp = page
        .attribute(&time, TIME_ATTRIBUTE)
        .await
        .map_err(stale)?
        .ok_or_else(|| Error::skipped(SkipReason::MissingTimestamp))?;

    let mut post = Post {
        timestamp: timestamp.into(),
        ..Post::default()
    };

    if variant == Variant::Extended {
        let author = page
            .find_in(node, &POST_AUTHOR)
            .await
            .map_err(stale)?
            .ok_or_else(|| Error::skipped(SkipReason::MissingAuthor))?;
        post.author = page.text(&author).await.map_err(stale)?.into();
        post.id = post_id(page, node).await.map_err(stale)?;
    }

    let text = page
        .find_in(node, &POST_TEXT)
        .await
        .map_err(stale)?
        .ok_or_else(|| Error::skipped(SkipReason::MissingText))?;
    post.text = page.text(&text).await.map_err(stale)?;

    Ok(post)
}

/// `data-tweet-id` when the client renders it, else the id in the post's
/// status link.
async fn post_id<P: Page>(page: &P, node: &P::Node) -> anyhow::Result<Option<CompactString>> {
    if let Some(id) = page.attribute(node, POST_ID_ATTRIBUTE).await? {
        return Ok(Some(id.into()));
    }
    let Some(link) = page.find_in(node, &POST_STATUS_LINK).await? else {
        return Ok(None);
    };
    Ok(page
        .attribute(&link, "href")
        .await?
        .and_then(|href| Some(CompactString::new(STATUS_ID.captures(&href)?.get(1)?.as_str()))))
}

/// Identity used by the dedup filter: the post id, or its content when the
/// id is unknown.
fn dedup_key(post: &Post) -> (CompactString, CompactString, String) {
    match post.id {
        Some(ref id) => (id.clone(), CompactString::default(), String::new()),
        None => (post.timestamp.clone(), post.author.clone(), post.text.clone()),
    }
}
