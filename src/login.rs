use std::io;

use tokio::time::sleep;

use crate::{
    config::{Credentials, Pacing},
    error::{Error, Result},
    scrape::{Locator, Page, wait_for},
    selectors::{LOGIN_URL, PASSWORD_FIELD, TEXT_FIELD},
};

/// Source of the one-time confirmation code.
pub trait CodePrompt {
    fn read_code(&mut self) -> io::Result<String>;
}

/// Asks on the terminal, without echo.
pub struct Terminal;

impl CodePrompt for Terminal {
    fn read_code(&mut self) -> io::Result<String> {
        rpassword::prompt_password("Enter the Twitter confirmation code: ")
            .map(|code| code.trim().to_owned())
    }
}

/// Logs `page` in, or tears it down.
///
/// On success the page is handed back logged in. On failure the browser is
/// closed before the error is returned; there is no partial session.
pub async fn bootstrap<P, C>(
    page: P,
    credentials: &Credentials,
    pacing: &Pacing,
    prompt: &mut C,
) -> Result<P>
where
    P: Page,
    C: CodePrompt,
{
    match login(&page, credentials, pacing, prompt).await {
        Ok(()) => Ok(page),
        Err(e) => {
            tracing::error!(target: "login", "\x1b[31mfailed to log in: {e}\x1b[0m");
            if let Err(e) = page.quit().await {
                tracing::warn!(target: "login", "closing browser: {e}");
            }
            Err(e)
        }
    }
}

pub async fn login<P, C>(
    page: &P,
    credentials: &Credentials,
    pacing: &Pacing,
    prompt: &mut C,
) -> Result<()>
where
    P: Page,
    C: CodePrompt,
{
    tracing::info!(target: "login", "logging into Twitter as {} ...", credentials.username);
    page.goto(LOGIN_URL).await.map_err(failed)?;

    let field = required(page, &TEXT_FIELD, pacing).await?;
    submit(page, &field, &credentials.username).await?;
    sleep(pacing.after_username).await;

    let field = required(page, &PASSWORD_FIELD, pacing).await?;
    submit(page, &field, &credentials.password).await?;
    sleep(pacing.after_password).await;

    // The site re-shows the `text` field when it wants a confirmation code.
    match wait_for(page, &TEXT_FIELD, pacing.element_wait).await {
        Ok(Some(field)) => {
            let code = prompt.read_code().map_err(failed)?;
            submit(page, &field, &code).await?;
            sleep(pacing.after_code).await;
        }
        Ok(None) => tracing::info!(target: "login", "no confirmation code required"),
        Err(e) => tracing::info!(target: "login", "no confirmation code required ({e})"),
    }

    tracing::info!(target: "login", "\x1b[36mlogin successful\x1b[0m");
    Ok(())
}

async fn required<P: Page>(page: &P, locator: &Locator, pacing: &Pacing) -> Result<P::Node> {
    wait_for(page, locator, pacing.element_wait)
        .await
        .map_err(failed)?
        .ok_or_else(|| {
            Error::LoginFailed(format!(
                "{locator:?} did not appear within {:?}",
                pacing.element_wait.timeout()
            ))
        })
}

async fn submit<P: Page>(page: &P, field: &P::Node, text: &str) -> Result<()> {
    page.type_into(field, text).await.map_err(failed)?;
    page.press_enter().await.map_err(failed)
}

fn failed(e: impl core::fmt::Display) -> Error {
    Error::LoginFailed(e.to_string())
}
