use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawler::error::CrawlError;

/// Elements whose content never renders as text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of visible text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// A fetched page: the URL it was served from and its HTML
///
/// Selector evaluation happens on demand against the stored HTML, so a page can
/// be held across await points while the parsed DOM never is.
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    html: String,
}

/// Text found inside a container element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerText {
    /// Visible text of each nested element matching the inner selector
    pub blocks: Vec<String>,

    /// Visible text of the whole container
    pub full_text: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// URL the page was served from, after redirects
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The raw HTML content
    pub fn html(&self) -> &str {
        &self.html
    }

    /// URL that relative links on this page resolve against
    ///
    /// Honors a `<base href>` element when present.
    pub fn base_url(&self) -> Result<Url, CrawlError> {
        let page_url = Url::parse(&self.url).map_err(|source| CrawlError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        let document = Html::parse_document(&self.html);
        let base_selector = parse_selector("base[href]")?;
        let base_href = document
            .select(&base_selector)
            .next()
            .and_then(|base| base.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty());

        match base_href {
            Some(href) => Ok(page_url.join(href).unwrap_or(page_url)),
            None => Ok(page_url),
        }
    }

    /// Raw `href` values of every element matching `selector`, in document order
    pub fn link_targets(&self, selector: &str) -> Result<Vec<String>, CrawlError> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);

        Ok(document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect())
    }

    /// Visible text of the first element matching `selector`, trimmed
    pub fn first_text(&self, selector: &str) -> Result<Option<String>, CrawlError> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);

        Ok(document
            .select(&selector)
            .next()
            .map(visible_text)
            .filter(|text| !text.is_empty()))
    }

    /// Text of the first element matching `container`, split by `nested`
    ///
    /// Returns `None` when the container is absent.
    pub fn container_text(
        &self,
        container: &str,
        nested: &str,
    ) -> Result<Option<ContainerText>, CrawlError> {
        let container = parse_selector(container)?;
        let nested = parse_selector(nested)?;
        let document = Html::parse_document(&self.html);

        let Some(element) = document.select(&container).next() else {
            return Ok(None);
        };

        let blocks = element.select(&nested).map(visible_text).collect();

        Ok(Some(ContainerText {
            blocks,
            full_text: visible_text(element),
        }))
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Approximate rendered text of an element
///
/// Skips non-rendered elements, breaks lines at block elements and `<br>`,
/// collapses whitespace inside each line and drops blank lines.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            // Source newlines are layout, not content
            out.push_str(&text.replace('\n', " "));
            continue;
        }

        let Some(child_element) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child_element.value().name();
        if HIDDEN_ELEMENTS.contains(&name) {
            continue;
        }
        if name == "br" {
            out.push('\n');
            continue;
        }

        let is_block = BLOCK_ELEMENTS.contains(&name);
        if is_block {
            out.push('\n');
        }
        collect_text(child_element, out);
        if is_block {
            out.push('\n');
        }
    }
}
