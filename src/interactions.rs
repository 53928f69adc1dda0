//! Who liked, retweeted and replied to a post.
//!
//! Each list is fetched on its own. A list that cannot be read is left empty
//! and the next one is still attempted; nothing is rolled back if the page
//! shifts in between.

use tokio::time::sleep;

use crate::{
    config::Pacing,
    error::{Error, InteractionKind, Result},
    model::Engagement,
    scrape::{Locator, Page, go_back},
    selectors::{LIKE_BUTTON, OVERLAY_USER, REPLY, RETWEET_BUTTON},
};

/// Collects all three lists, returning the failures alongside.
pub async fn scrape_interactions<P: Page>(
    page: &P,
    post: &P::Node,
    pacing: &Pacing,
) -> (Engagement, Vec<Error>) {
    let mut failures = Vec::new();
    let mut keep = |kind: InteractionKind, r: Result<Vec<String>>| match r {
        Ok(list) => list,
        Err(e) => {
            tracing::info!(target: "interactions", "no {kind} found: {e}");
            failures.push(e);
            Vec::new()
        }
    };

    let likes = keep(
        InteractionKind::Likes,
        overlay_names(page, post, &LIKE_BUTTON, InteractionKind::Likes, pacing).await,
    );
    let retweets = keep(
        InteractionKind::Retweets,
        overlay_names(page, post, &RETWEET_BUTTON, InteractionKind::Retweets, pacing).await,
    );
    let replies = keep(InteractionKind::Replies, replies(page, post).await);

    (
        Engagement {
            likes,
            retweets,
            replies,
        },
        failures,
    )
}

/// Opens the overlay behind `button`, reads the listed display names and
/// navigates back. Once the overlay is open, the page goes back even if the
/// names could not be read.
async fn overlay_names<P: Page>(
    page: &P,
    post: &P::Node,
    button: &Locator,
    kind: InteractionKind,
    pacing: &Pacing,
) -> Result<Vec<String>> {
    let unavailable = |e: anyhow::Error| Error::unavailable(kind, e);

    let Some(button) = page.find_in(post, button).await.map_err(unavailable)? else {
        return Err(Error::unavailable(kind, "button not found"));
    };
    page.click(&button).await.map_err(unavailable)?;
    sleep(pacing.overlay_settle).await;

    let names = match page.find_all(&OVERLAY_USER).await {
        Ok(users) => texts(page, &users).await,
        Err(e) => Err(e),
    };
    let back = go_back(page).await;

    let names = names.map_err(unavailable)?;
    back.map_err(unavailable)?;
    Ok(names)
}

async fn replies<P: Page>(page: &P, post: &P::Node) -> Result<Vec<String>> {
    let unavailable = |e: anyhow::Error| Error::unavailable(InteractionKind::Replies, e);

    let nodes = page.find_all_in(post, &REPLY).await.map_err(unavailable)?;
    texts(page, &nodes).await.map_err(unavailable)
}

async fn texts<P: Page>(page: &P, nodes: &[P::Node]) -> anyhow::Result<Vec<String>> {
    let mut texts = Vec::with_capacity(nodes.len());
    for node in nodes {
        texts.push(page.text(node).await?);
    }
    Ok(texts)
}
