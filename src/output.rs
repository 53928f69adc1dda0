use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    error::Result,
    model::{Post, Variant},
};

pub const CSV_FILE: &str = "tweets.csv";
pub const TEXT_FILE: &str = "tweets.txt";

const BASIC_COLUMNS: [&str; 2] = ["Timestamp", "Tweet"];
const EXTENDED_COLUMNS: [&str; 7] = [
    "Timestamp",
    "Username",
    "Tweet ID",
    "Tweet",
    "Likes",
    "Retweets",
    "Replies",
];
const BANNER: &str = "----------------------------------------";

#[derive(Debug)]
pub struct Saved {
    pub records: usize,
    pub csv: PathBuf,
    pub text: PathBuf,
}

/// Writes `posts` to `tweets.csv` and `tweets.txt` under `dir`, replacing
/// whatever was there.
pub fn save(posts: &[Post], variant: Variant, dir: &Path) -> Result<Saved> {
    let csv = dir.join(CSV_FILE);
    let text = dir.join(TEXT_FILE);

    write_csv(posts, variant, &csv)?;
    write_text(posts, variant, &text)?;

    tracing::info!(target: "output", "\x1b[36msaved {} tweets to {} and {}\x1b[0m", posts.len(), csv.display(), text.display());
    Ok(Saved {
        records: posts.len(),
        csv,
        text,
    })
}

fn write_csv(posts: &[Post], variant: Variant, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    match variant {
        Variant::Basic => {
            writer.write_record(BASIC_COLUMNS)?;
            for post in posts {
                writer.write_record([post.timestamp.as_str(), post.text.as_str()])?;
            }
        }
        Variant::Extended => {
            writer.write_record(EXTENDED_COLUMNS)?;
            for post in posts {
                let engagement = post.engagement.clone().unwrap_or_default();
                writer.write_record([
                    post.timestamp.as_str(),
                    post.author.as_str(),
                    post.id.as_deref().unwrap_or_default(),
                    post.text.as_str(),
                    list_cell(&engagement.likes).as_str(),
                    list_cell(&engagement.retweets).as_str(),
                    list_cell(&engagement.replies).as_str(),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// A list column, as a JSON array.
fn list_cell(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_default()
}

fn write_text(posts: &[Post], variant: Variant, path: &Path) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for post in posts {
        match variant {
            Variant::Basic => write!(w, "{}\n{}\n\n", post.timestamp, post.text)?,
            Variant::Extended => {
                let (likes, retweets, replies) = post.engagement.as_ref().map_or((0, 0, 0), |e| {
                    (e.likes.len(), e.retweets.len(), e.replies.len())
                });
                writeln!(w, "{BANNER}")?;
                writeln!(w, "Timestamp: {}", post.timestamp)?;
                writeln!(w, "Username: {}", post.author)?;
                writeln!(w, "Tweet ID: {}", post.id.as_deref().unwrap_or("None"))?;
                writeln!(w, "Tweet:\n{}\n", post.text)?;
                writeln!(w, "Likes: {likes} | Retweets: {retweets} | Replies: {replies}")?;
                writeln!(w, "{BANNER}\n")?;
            }
        }
    }
    w.flush()?;
    Ok(())
}
