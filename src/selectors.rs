//! Where things live on the Twitter web client.

use std::borrow::Cow::Borrowed;

use crate::scrape::Locator;

pub const LOGIN_URL: &str = "https://twitter.com/login";

/// The account-name input; reused by the site for the one-time code prompt.
pub const TEXT_FIELD: Locator = Locator::Name(Borrowed("text"));
pub const PASSWORD_FIELD: Locator = Locator::Name(Borrowed("password"));

pub const POST: Locator = Locator::Css(Borrowed("article[data-testid='tweet']"));
pub const POST_TIME: Locator = Locator::Css(Borrowed("time"));
pub const POST_TEXT: Locator = Locator::Css(Borrowed("div[data-testid='tweetText']"));
pub const POST_AUTHOR: Locator = Locator::XPath(Borrowed(".//span[contains(text(), '@')]"));
pub const POST_STATUS_LINK: Locator = Locator::Css(Borrowed("a[href*='/status/']"));
pub const POST_ID_ATTRIBUTE: &str = "data-tweet-id";
pub const TIME_ATTRIBUTE: &str = "datetime";

pub const LIKE_BUTTON: Locator = Locator::Css(Borrowed("div[data-testid='like']"));
pub const RETWEET_BUTTON: Locator = Locator::Css(Borrowed("div[data-testid='retweet']"));
pub const OVERLAY_USER: Locator = Locator::Css(Borrowed("div[data-testid='User-Name']"));
pub const REPLY: Locator = Locator::Css(Borrowed("div[data-testid='reply']"));
