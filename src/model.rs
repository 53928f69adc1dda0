use compact_str::CompactString;

/// One post as read from the timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Post {
    /// The `datetime` attribute of the post's `<time>`, verbatim.
    pub timestamp: CompactString,
    /// `@handle`; empty for the basic variant.
    pub author: CompactString,
    pub id: Option<CompactString>,
    pub text: String,
    pub engagement: Option<Engagement>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Engagement {
    pub likes: Vec<String>,
    pub retweets: Vec<String>,
    pub replies: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Limit {
    #[default]
    Unbounded,
    Count(usize),
}

impl Limit {
    pub const fn reached(self, n: usize) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Count(limit) => n >= limit,
        }
    }
}

impl core::fmt::Display for Limit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unbounded => f.write_str("∞"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Which fields get extracted and how the output files are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    /// Timestamp and text.
    #[default]
    Basic,
    /// Author, id and engagement lists on top.
    Extended,
}
