use std::{path::PathBuf, process::ExitCode, time::Duration};

use tscr::{
    config::{Credentials, PASSWORD_ENV, Pacing, Poll, USERNAME_ENV},
    error::{Error, Severity},
    login::{Terminal, bootstrap},
    model::{Limit, Variant},
    output,
    scrape::{ChromePage, LaunchConfig, Page},
    timeline::{ScrapeOptions, scrape_profile},
    util::prompt,
};

#[derive(clap::Parser)]
#[command(about = "Scrape the posts of a Twitter profile into tweets.csv and tweets.txt")]
struct Args {
    #[arg(long, env = USERNAME_ENV, hide_env_values = true)]
    username: Option<String>,
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,
    /// Profile URL; asked for when omitted.
    #[arg(long)]
    url: Option<String>,
    /// Scrape every post the profile shows.
    #[arg(long, conflicts_with = "limit")]
    all: bool,
    /// Stop after this many posts.
    #[arg(short, long)]
    limit: Option<usize>,
    /// Also collect author, id, likes, retweets and replies.
    #[arg(short, long)]
    interactions: bool,
    /// Drop posts already captured earlier in the run.
    #[arg(long)]
    dedup: bool,
    #[arg(long)]
    headless: bool,
    /// Chrome/Chromium executable.
    #[arg(long, value_name = "path")]
    browser: Option<PathBuf>,
    #[arg(long, value_name = "url")]
    proxy: Option<String>,
    /// Directory receiving tweets.csv and tweets.txt.
    #[arg(short, long, value_name = "dir", default_value = ".")]
    output: PathBuf,
    /// How long to wait for login fields and the first post.
    #[arg(long, default_value_t = 10)]
    wait_secs: u64,
    /// Pause after each scroll before measuring the page again.
    #[arg(long, default_value_t = 3000)]
    scroll_pause_ms: u64,
}

impl Args {
    fn limit(&self) -> anyhow::Result<Limit> {
        if self.all {
            return Ok(Limit::Unbounded);
        }
        if let Some(n) = self.limit {
            return Ok(Limit::Count(n));
        }
        if prompt("Scrape all tweets? (y/n): ")?.eq_ignore_ascii_case("y") {
            return Ok(Limit::Unbounded);
        }
        let n = prompt("Enter number of tweets to scrape: ")?.trim().parse()?;
        Ok(Limit::Count(n))
    }

    fn pacing(&self) -> Pacing {
        Pacing {
            element_wait: Poll::within(Duration::from_secs(self.wait_secs), Poll::default().interval),
            scroll_settle: Duration::from_millis(self.scroll_pause_ms),
            ..Pacing::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    use clap::Parser;

    // A missing .env is fine; flags and the real environment still apply.
    dotenv::dotenv().ok();
    pretty_env_logger::init_timed();

    let args = Args::parse();

    let credentials = Credentials::new(args.username.clone(), args.password.clone())?;
    let url = match args.url {
        Some(ref url) => url.clone(),
        None => prompt("Enter Twitter profile URL: ")?,
    };
    let options = ScrapeOptions {
        limit: args.limit()?,
        variant: if args.interactions { Variant::Extended } else { Variant::Basic },
        dedup: args.dedup,
        pacing: args.pacing(),
    };
    if options.limit == Limit::Unbounded {
        tracing::info!(target: "main", "scraping all available tweets ...");
    }

    tracing::info!(target: "main", "starting Twitter scraper for \x1b[1;36m{url}\x1b[0m");
    let page = ChromePage::launch(&LaunchConfig {
        headless: args.headless,
        proxy: args.proxy.clone(),
        browser_path: args.browser.clone(),
    })?;

    let Ok(page) = bootstrap(page, &credentials, &options.pacing, &mut Terminal).await else {
        return Ok(ExitCode::FAILURE);
    };

    let result = scrape_profile(&page, &url, &options).await;
    if let Err(e) = page.quit().await {
        tracing::warn!(target: "main", "closing browser: {e}");
    }

    let harvest = match result {
        Ok(harvest) => harvest,
        Err(e) if e.severity() == Severity::EarlyReturn => {
            tracing::error!(target: "main", "\x1b[31mtweets did not load: {e}\x1b[0m");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        target: "main",
        "{} tweets, {} skipped, {} duplicates dropped, {} scrolls, stopped: {:?}",
        harvest.posts.len(),
        harvest.skipped.len(),
        harvest.duplicates,
        harvest.scrolls,
        harvest.stop,
    );
    if harvest.interaction_failures != 0 {
        tracing::info!(target: "main", "{} engagement lists unavailable", harvest.interaction_failures);
    }

    match output::save(&harvest.posts, options.variant, &args.output) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(Error::Io(e)) => Err(anyhow::Error::new(e).context(format!("writing into {}", args.output.display()))),
        Err(e) => Err(e.into()),
    }
}
