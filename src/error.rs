use core::fmt;

use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while bootstrapping a session, walking a timeline or saving
/// the harvest.
///
/// The variants fall into three tiers, see [`Error::severity`]:
/// fatal setup failures abort the run, a profile without posts ends the run
/// early without producing files, and per-element failures are only counted.
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value (environment variable or flag) is absent.
    #[error("missing configuration value: {0}")]
    ConfigMissing(&'static str),

    /// The login form could not be driven to completion.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The profile page never rendered a single post within the wait window.
    #[error("no posts loaded at {0}")]
    ContentNotFound(String),

    /// One rendered post could not be turned into a record.
    #[error("post skipped: {0}")]
    ElementExtractionSkipped(SkipReason),

    /// One engagement list of a post could not be collected.
    #[error("{kind} unavailable: {reason}")]
    InteractionUnavailable {
        kind: InteractionKind,
        reason: String,
    },

    #[error("browser error: {0}")]
    Driver(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// How far an error propagates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Tear the session down and terminate the process.
    Abort,
    /// Tear the session down and return without writing output.
    EarlyReturn,
    /// Record and carry on with the next element or step.
    Skip,
}

impl Error {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ContentNotFound(_) => Severity::EarlyReturn,
            Self::ElementExtractionSkipped(_) | Self::InteractionUnavailable { .. } => {
                Severity::Skip
            }
            _ => Severity::Abort,
        }
    }

    pub(crate) fn skipped(reason: SkipReason) -> Self {
        Self::ElementExtractionSkipped(reason)
    }

    pub(crate) fn unavailable(kind: InteractionKind, reason: impl fmt::Display) -> Self {
        Self::InteractionUnavailable {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// Why a rendered post produced no record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingTimestamp,
    MissingText,
    MissingAuthor,
    /// The browser rejected a lookup on the element, usually because it was
    /// detached while we were reading it.
    Stale(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTimestamp => f.write_str("no timestamp"),
            Self::MissingText => f.write_str("no body text"),
            Self::MissingAuthor => f.write_str("no author handle"),
            Self::Stale(e) => write!(f, "stale element ({e})"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Likes,
    Retweets,
    Replies,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Likes => "likes",
            Self::Retweets => "retweets",
            Self::Replies => "replies",
        })
    }
}
