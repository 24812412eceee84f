use std::time::Duration;

use tracing::debug;

use crate::config::SiteProfile;
use crate::error::{Error, Result};
use crate::page::Page;

/// Replace the chat input's content with `query` and submit it.
///
/// Returns the number of message elements present before submitting, the
/// baseline for spotting the reply. Steps run in order with no rollback: a
/// failure halfway leaves the input as it is.
pub async fn submit_query(
    page: &Page,
    site: &SiteProfile,
    query: &str,
    wait: Duration,
) -> Result<usize> {
    let input = page
        .wait_for_selector(&site.input_selector, wait)
        .await
        .map_err(|_| Error::InputNotFound(site.input_selector.clone()))?;

    let baseline = page.count(&site.message_selector).await?;
    debug!(baseline, "messages before submit");

    input.click().await?;
    input.focus().await?;
    page.select_all().await?;
    input.press_key("Backspace").await?;
    page.insert_text(query).await?;
    input.press_key("Enter").await?;

    Ok(baseline)
}
