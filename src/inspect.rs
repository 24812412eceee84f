//! DOM survey of the chat page, for when its markers change and the
//! selectors in [`SiteProfile`](crate::config::SiteProfile) need updating.

use serde::{Deserialize, Serialize};

use crate::browser::RemoteBrowser;
use crate::config::AskConfig;
use crate::error::{Error, Result};
use crate::page::Page;

/// Selectors tried when looking for message containers.
pub const MESSAGE_CANDIDATES: &[&str] = &[
    r#"div[data-testid*="message"]"#,
    r#"div[class*="message"]"#,
    r#"div[class*="Message"]"#,
    "article",
    r#"[role="article"]"#,
    r#"div[class*="chat"]"#,
    r#"div[class*="Chat"]"#,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub messages: Vec<SelectorMatches>,
    pub input: Option<InputInfo>,
    pub structure: PageStructure,
}

/// Elements matched by one candidate selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorMatches {
    pub selector: String,
    pub count: usize,
    /// Up to the last three matches.
    pub samples: Vec<ElementSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSample {
    pub classes: String,
    pub text_preview: String,
    pub children: usize,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputInfo {
    pub classes: String,
    pub parent: Option<String>,
    pub grandparent: Option<String>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStructure {
    pub title: String,
    pub main_containers: Vec<ContainerInfo>,
    pub has_react_root: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    pub tag: String,
    pub id: String,
    pub classes: String,
    pub child_count: usize,
}

/// Connect, find the existing site tab and survey it. Unlike an ask, this
/// never opens or navigates a tab.
pub async fn inspect(config: &AskConfig) -> Result<InspectReport> {
    let mut browser = RemoteBrowser::connect(config).await?;
    let page = browser
        .find_site_tab(&config.site)
        .await?
        .ok_or(Error::NoGrokTab)?;
    page.bring_to_front().await?;
    inspect_page(&page, &config.site.input_selector).await
}

/// Survey message candidates, the input element and top-level structure.
pub async fn inspect_page(page: &Page, input_selector: &str) -> Result<InspectReport> {
    let candidates_js = serde_json::to_string(MESSAGE_CANDIDATES)?;
    let input_js = serde_json::to_string(input_selector)?;
    let js = format!(
        r#"
        JSON.stringify((() => {{
            const attrs = el => Array.from(el.attributes).map(a => `${{a.name}}="${{a.value}}"`);
            const cls = el => (typeof el.className === 'string' ? el.className : '');

            const messages = [];
            for (const selector of {candidates_js}) {{
                const elements = document.querySelectorAll(selector);
                if (elements.length === 0) continue;
                messages.push({{
                    selector,
                    count: elements.length,
                    samples: Array.from(elements).slice(-3).map(el => ({{
                        classes: cls(el),
                        textPreview: (el.innerText || '').substring(0, 100),
                        children: el.children.length,
                        attributes: attrs(el)
                    }}))
                }});
            }}

            const field = document.querySelector({input_js});
            const input = field ? {{
                classes: cls(field),
                parent: field.parentElement ? cls(field.parentElement) : null,
                grandparent: field.parentElement && field.parentElement.parentElement
                    ? cls(field.parentElement.parentElement) : null,
                attributes: attrs(field)
            }} : null;

            const structure = {{
                title: document.title,
                mainContainers: Array.from(document.querySelectorAll('body > *')).map(el => ({{
                    tag: el.tagName,
                    id: el.id || '',
                    classes: cls(el),
                    childCount: el.children.length
                }})),
                hasReactRoot: !!document.querySelector('#__next, [data-reactroot], #root')
            }};

            return {{ messages, input, structure }};
        }})())
        "#,
    );

    let raw: String = page.evaluate_value(&js).await?;
    Ok(serde_json::from_str(&raw)?)
}
