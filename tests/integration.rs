//! Live checks against a Chrome started with `--remote-debugging-port`.
//! Run with `cargo test -- --ignored` and `CDP_URL` pointing at it.

use ask_grok::config::AskConfig;
use ask_grok::{AskBuilder, Error, RemoteBrowser, SiteProfile};

#[tokio::test]
async fn test_unreachable_endpoint_names_it() {
    let config = AskBuilder::new().endpoint("http://127.0.0.1:1").build();

    let err = match RemoteBrowser::connect(&config).await {
        Ok(_) => panic!("connected to a closed port"),
        Err(e) => e,
    };

    assert!(matches!(err, Error::Connect { .. }), "got {err:?}");
    let message = err.to_string();
    assert!(message.contains("http://127.0.0.1:1"), "message was: {message}");
    assert!(message.contains("--remote-debugging-port"));
}

#[tokio::test]
#[ignore = "needs a running Chrome at CDP_URL"]
async fn test_locate_tab_lands_on_site() {
    let config = AskConfig::from_env();
    let mut browser = RemoteBrowser::connect(&config)
        .await
        .expect("Failed to connect");

    let page = browser
        .locate_tab(&config.site)
        .await
        .expect("Failed to locate tab");

    let url = page.url().await.expect("Failed to get URL");
    assert!(url.contains(&config.site.host), "URL was: {url}");
}

#[tokio::test]
#[ignore = "needs a running Chrome at CDP_URL"]
async fn test_locate_tab_reuses_existing_site_tab() {
    let config = AskConfig::from_env();
    let mut browser = RemoteBrowser::connect(&config)
        .await
        .expect("Failed to connect");

    browser
        .locate_tab(&config.site)
        .await
        .expect("Failed to locate tab");
    let (_, before) = browser.first_context().await.expect("Failed to list tabs");

    browser
        .locate_tab(&config.site)
        .await
        .expect("Failed to locate tab again");
    let (_, after) = browser.first_context().await.expect("Failed to list tabs");

    assert_eq!(before.len(), after.len());
}

#[tokio::test]
#[ignore = "needs a running Chrome at CDP_URL"]
async fn test_missing_input_reports_login_hint() {
    let site = SiteProfile {
        host: "example.com".into(),
        start_url: "https://example.com/".into(),
        ..SiteProfile::default()
    };
    let config = AskBuilder::from_env()
        .input_timeout(std::time::Duration::from_secs(1))
        .site(site)
        .build();

    let err = ask_grok::ask(&config, "hello", Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InputNotFound(_)), "got {err:?}");
    assert!(err.to_string().contains("Are you logged in?"));
}
