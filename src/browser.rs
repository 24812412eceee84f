use std::time::Duration;

use chromiumoxide::browser::Browser as CrBrowser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateTargetParams, GetBrowserContextsParams, TargetId,
};
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::{AskConfig, SiteProfile};
use crate::error::{Error, Result};
use crate::page::Page;
use crate::tabs::{browsing_contexts, select_tab, TabChoice, TabInfo};

/// A CDP session with a browser someone else launched. The browser is never
/// closed from here.
pub struct RemoteBrowser {
    browser: CrBrowser,
    operation_timeout: Duration,
    _handler_task: tokio::task::JoinHandle<()>,
}

impl RemoteBrowser {
    /// Connect once to the endpoint in `config`. No retry.
    pub async fn connect(config: &AskConfig) -> Result<Self> {
        let (browser, mut handler) = CrBrowser::connect(config.endpoint.clone())
            .await
            .map_err(|e| Error::Connect {
                endpoint: config.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {e}");
                }
            }
        });

        debug!(endpoint = %config.endpoint, "connected");

        Ok(Self {
            browser,
            operation_timeout: config.operation_timeout,
            _handler_task: handler_task,
        })
    }

    /// All page targets, in the order the browser reports them.
    pub async fn tabs(&mut self) -> Result<Vec<TabInfo>> {
        let targets = self.browser.fetch_targets().await?;
        Ok(targets
            .into_iter()
            .filter(|t| t.r#type == "page")
            .map(TabInfo::from)
            .collect())
    }

    /// The first browsing context and the tabs that belong to it.
    pub async fn first_context(&mut self) -> Result<(BrowserContextId, Vec<TabInfo>)> {
        let tabs = self.tabs().await?;
        let listed = self
            .browser
            .execute(GetBrowserContextsParams::default())
            .await?;
        let context = browsing_contexts(&tabs, &listed.result.browser_context_ids)
            .into_iter()
            .next()
            .ok_or(Error::NoBrowserContexts)?;
        let tabs = tabs
            .into_iter()
            .filter(|t| t.context_id.as_ref() == Some(&context))
            .collect();
        Ok((context, tabs))
    }

    /// Find the site's tab in the first context, or reuse/open one and
    /// navigate it to the site. A tab already on the site is only brought to
    /// front so an open conversation survives.
    pub async fn locate_tab(&mut self, site: &SiteProfile) -> Result<Page> {
        let (context, tabs) = self.first_context().await?;
        let urls: Vec<&str> = tabs.iter().map(|t| t.url.as_str()).collect();

        match select_tab(&urls, &site.host) {
            TabChoice::Existing(i) => {
                info!("Using existing tab {}", tabs[i].url);
                let page = self.attach(&tabs[i].target_id).await?;
                page.bring_to_front().await?;
                Ok(page)
            }
            TabChoice::Reuse(i) => {
                info!("Navigating tab {} to {}", tabs[i].url, site.start_url);
                let page = self.attach(&tabs[i].target_id).await?;
                page.goto(&site.start_url).await?;
                Ok(page)
            }
            TabChoice::OpenNew => {
                info!("Opening new tab at {}", site.start_url);
                let params = CreateTargetParams::builder()
                    .url(site.start_url.clone())
                    .browser_context_id(context)
                    .build()
                    .map_err(Error::Navigation)?;
                let cr_page = self
                    .browser
                    .new_page(params)
                    .await
                    .map_err(|e| Error::Navigation(e.to_string()))?;
                Ok(Page::new(cr_page, self.operation_timeout))
            }
        }
    }

    /// The site's tab in the first context, if there is one. Never navigates.
    pub async fn find_site_tab(&mut self, site: &SiteProfile) -> Result<Option<Page>> {
        let (_, tabs) = self.first_context().await?;
        match tabs.iter().find(|t| t.url.contains(&site.host)) {
            Some(tab) => Ok(Some(self.attach(&tab.target_id).await?)),
            None => Ok(None),
        }
    }

    /// Get a page handle for a target the handler may still be attaching to.
    /// Polls every 100ms up to the operation timeout.
    async fn attach(&self, target_id: &TargetId) -> Result<Page> {
        let interval = Duration::from_millis(100);
        let start = tokio::time::Instant::now();

        loop {
            match self.browser.get_page(target_id.clone()).await {
                Ok(cr_page) => return Ok(Page::new(cr_page, self.operation_timeout)),
                Err(_) if start.elapsed() < self.operation_timeout => {
                    tokio::time::sleep(interval).await;
                }
                Err(e) => return Err(Error::Cdp(e)),
            }
        }
    }
}
