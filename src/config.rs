use core::{fmt, time::Duration};

use crate::error::{Error, Result};

pub const USERNAME_ENV: &str = "TWITTER_USERNAME";
pub const PASSWORD_ENV: &str = "TWITTER_PASSWORD";

mod constants {
    use core::time::Duration;

    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
    /// 21 looks, 500ms apart: the 10 second element wait.
    pub const POLL_ATTEMPTS: u32 = 21;
    pub const AFTER_USERNAME: Duration = Duration::from_secs(3);
    pub const AFTER_PASSWORD: Duration = Duration::from_secs(5);
    pub const AFTER_CODE: Duration = Duration::from_secs(5);
    pub const SCROLL_SETTLE: Duration = Duration::from_secs(3);
    pub const OVERLAY_SETTLE: Duration = Duration::from_secs(3);
}

/// Account used to drive the login form.
///
/// Both fields are required; build it once at startup and hand it to
/// [`crate::login::bootstrap`].
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Empty strings count as missing.
    pub fn new(username: Option<String>, password: Option<String>) -> Result<Self> {
        let username = username
            .filter(|s| !s.is_empty())
            .ok_or(Error::ConfigMissing(USERNAME_ENV))?;
        let password = password
            .filter(|s| !s.is_empty())
            .ok_or(Error::ConfigMissing(PASSWORD_ENV))?;
        Ok(Self { username, password })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A bounded polling wait: look, sleep `interval`, look again, at most
/// `max_attempts` looks in total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Poll {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Poll {
    /// Polls every `interval` until `timeout` (rounded down to a whole
    /// number of intervals) has elapsed, with one last look at the end.
    pub fn within(timeout: Duration, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let max_attempts = (timeout.as_millis() / interval.as_millis()) as u32 + 1;
        Self {
            interval,
            max_attempts,
        }
    }

    /// Time spent sleeping between looks when nothing ever shows up.
    pub fn timeout(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for Poll {
    fn default() -> Self {
        Self {
            interval: constants::POLL_INTERVAL,
            max_attempts: constants::POLL_ATTEMPTS,
        }
    }
}

/// Every wait and pause the scraper performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Waiting for a login field or the first post to appear.
    pub element_wait: Poll,
    pub after_username: Duration,
    pub after_password: Duration,
    pub after_code: Duration,
    /// Pause between scrolling and re-measuring the page.
    pub scroll_settle: Duration,
    /// Pause after opening a likes/retweets overlay.
    pub overlay_settle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            element_wait: Poll::default(),
            after_username: constants::AFTER_USERNAME,
            after_password: constants::AFTER_PASSWORD,
            after_code: constants::AFTER_CODE,
            scroll_settle: constants::SCROLL_SETTLE,
            overlay_settle: constants::OVERLAY_SETTLE,
        }
    }
}
