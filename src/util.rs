use std::{
    borrow::Cow,
    io::{self, BufRead, Write, stdin, stdout},
    sync::LazyLock,
};

use regex::Regex;

static X_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(https?://)?(www\.|mobile\.)?x\.com\b").unwrap());

/// Rewrites an `x.com` profile URL onto `twitter.com`, leaving anything else
/// untouched.
pub fn normalize_url(url: &str) -> Cow<'_, str> {
    let url = url.trim();
    X_HOST.replace(url, |c: &regex::Captures<'_>| {
        format!(
            "{}{}twitter.com",
            c.get(1).map_or("https://", |m| m.as_str()),
            c.get(2).map_or("", |m| m.as_str()),
        )
    })
}

/// First `n` characters of `text`, for log lines.
pub fn preview(text: &str, n: usize) -> &str {
    text.char_indices().nth(n).map_or(text, |(i, _)| &text[..i])
}

/// Writes `message`, then reads one trimmed line from stdin.
pub fn prompt(message: &str) -> io::Result<String> {
    {
        let mut stdout = stdout().lock();
        stdout.write_all(message.as_bytes())?;
        stdout.flush()?;
    }
    let mut line = String::with_capacity(64);
    if stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    line.truncate(line.trim_end().len());
    Ok(line)
}
