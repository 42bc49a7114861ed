//! Login flow through the server's hosted login form

use tracing::info;

use crate::config::ConsoleConfig;
use crate::error::E2eResult;
use crate::page::{by_test_id, Page};

/// Log in and wait for the account console shell to render.
///
/// Visiting the console unauthenticated redirects to the hosted login
/// form, so this navigates to the console URL, fills the form, and waits
/// for the redirect back.
pub async fn login(
    page: &mut Page,
    config: &ConsoleConfig,
    username: &str,
    password: &str,
) -> E2eResult<()> {
    info!("logging in as {} on realm {}", username, config.realm);
    page.goto(&config.account_url()).await?;

    page.wait_for("#username", config.assert_timeout).await?;
    page.fill("#username", username).await?;
    page.fill("#password", password).await?;
    page.click("#kc-login").await?;

    page.wait_for_load().await?;
    page.expect_visible(&by_test_id("accountSecurity")).await?;
    Ok(())
}
