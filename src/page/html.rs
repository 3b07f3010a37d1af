//! HTML snapshot page
//!
//! Selector queries run against a stored HTML document; scroll offset
//! and history form a small in-memory session model. The document is
//! kept as a string and re-parsed per query because parsed trees are
//! not `Send`; queries are bounded by snapshot size.

use std::path::Path;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::PageActions;

/// Element names excluded from main-content text extraction.
const STRIPPED_TAGS: &[&str] = &["a", "button"];

/// A page backed by an HTML snapshot
pub struct HtmlPage {
    document: String,
    scroll_x: i32,
    scroll_y: i32,
    back_stack: Vec<String>,
    forward_stack: Vec<String>,
    current: Option<String>,
}

impl HtmlPage {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            scroll_x: 0,
            scroll_y: 0,
            back_stack: Vec::new(),
            forward_stack: Vec::new(),
            current: None,
        }
    }

    /// Load a snapshot from disk.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// Current scroll offset, clamped at the origin.
    pub fn scroll_offset(&self) -> (i32, i32) {
        (self.scroll_x, self.scroll_y)
    }

    /// Target of the entry the session is currently on, if any.
    pub fn current_target(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn first_link_target(&self) -> Option<String> {
        let doc = Html::parse_document(&self.document);
        // Article scope first, then main, then the whole document.
        for scope in ["article a[href]", "main a[href]", "a[href]"] {
            let selector = Selector::parse(scope).unwrap_or_else(|_| unreachable!());
            let target = doc
                .select(&selector)
                .filter_map(|el| el.value().attr("href"))
                .map(str::trim)
                .find(|href| !href.is_empty());
            if let Some(href) = target {
                return Some(href.to_string());
            }
        }
        None
    }
}

impl PageActions for HtmlPage {
    fn scroll_by(&mut self, dx: i32, dy: i32) {
        self.scroll_x = self.scroll_x.saturating_add(dx).max(0);
        self.scroll_y = self.scroll_y.saturating_add(dy).max(0);
        debug!(x = self.scroll_x, y = self.scroll_y, "scrolled");
    }

    fn navigate_back(&mut self) {
        match self.back_stack.pop() {
            Some(previous) => {
                if let Some(current) = self.current.take() {
                    self.forward_stack.push(current);
                }
                debug!(target = %previous, "navigated back");
                self.current = Some(previous);
            }
            None => debug!("history empty, nothing to go back to"),
        }
    }

    fn navigate_forward(&mut self) {
        match self.forward_stack.pop() {
            Some(next) => {
                if let Some(current) = self.current.take() {
                    self.back_stack.push(current);
                }
                debug!(target = %next, "navigated forward");
                self.current = Some(next);
            }
            None => debug!("nothing to go forward to"),
        }
    }

    fn open_first_link(&mut self) -> Option<String> {
        let target = self.first_link_target()?;
        if let Some(current) = self.current.take() {
            self.back_stack.push(current);
        }
        self.forward_stack.clear();
        self.current = Some(target.clone());
        self.scroll_x = 0;
        self.scroll_y = 0;
        debug!(target = %target, "opened first link");
        Some(target)
    }

    fn main_content(&self) -> Option<String> {
        let doc = Html::parse_document(&self.document);
        let region = first_match(&doc, "article").or_else(|| first_match(&doc, "main"))?;

        let structured =
            Selector::parse("h1, h2, h3, h4, h5, h6, p, li").unwrap_or_else(|_| unreachable!());
        let parts: Vec<String> = region
            .select(&structured)
            .map(|el| collapse(&text_without_stripped(el)))
            .filter(|text| !text.is_empty())
            .collect();

        if parts.is_empty() {
            // Unstructured region: fall back to its whole text.
            let text = collapse(&region.text().collect::<String>());
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        } else {
            Some(parts.join("\n"))
        }
    }

    fn button_labels(&self) -> Vec<String> {
        let doc = Html::parse_document(&self.document);
        let selector =
            Selector::parse(r#"button, [role="button"]"#).unwrap_or_else(|_| unreachable!());
        doc.select(&selector)
            .map(|el| collapse(&el.text().collect::<String>()))
            .filter(|label| !label.is_empty())
            .collect()
    }
}

fn first_match<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).unwrap_or_else(|_| unreachable!());
    doc.select(&selector).next()
}

/// Text of an element with the stripped tags' subtrees skipped.
fn text_without_stripped(el: ElementRef) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if STRIPPED_TAGS.contains(&element.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <nav><a href="/nav">Navigation link</a></nav>
          <article>
            <h1>Release notes</h1>
            <p>The parser <a href="/changes">changed</a> this week.</p>
            <ul><li>Faster startup</li><li></li></ul>
            <button> Save </button>
            <div role="button">Delete</div>
            <span role="button">   </span>
          </article>
        </body></html>
    "#;

    #[test]
    fn test_first_link_prefers_article_scope() {
        let mut page = HtmlPage::new(PAGE);
        assert_eq!(page.open_first_link(), Some("/changes".to_string()));
    }

    #[test]
    fn test_first_link_falls_back_to_main_then_document() {
        let mut page = HtmlPage::new(
            r#"<body><a href="/outer">Out</a><main><a href="/inner">In</a></main></body>"#,
        );
        assert_eq!(page.open_first_link(), Some("/inner".to_string()));

        let mut page = HtmlPage::new(r#"<body><p>Hi</p><a href="/only">Only</a></body>"#);
        assert_eq!(page.open_first_link(), Some("/only".to_string()));
    }

    #[test]
    fn test_first_link_skips_empty_href() {
        let mut page = HtmlPage::new(r#"<body><a href="">x</a><a href="/real">y</a></body>"#);
        assert_eq!(page.open_first_link(), Some("/real".to_string()));
    }

    #[test]
    fn test_no_link_found() {
        let mut page = HtmlPage::new("<body><p>plain</p></body>");
        assert_eq!(page.open_first_link(), None);
    }

    #[test]
    fn test_main_content_strips_links_and_buttons() {
        let page = HtmlPage::new(PAGE);
        let content = page.main_content().unwrap();

        assert!(content.contains("Release notes"));
        assert!(content.contains("The parser this week."));
        assert!(content.contains("Faster startup"));
        assert!(!content.contains("changed"));
        assert!(!content.contains("Save"));
    }

    #[test]
    fn test_main_content_falls_back_to_region_text() {
        let page = HtmlPage::new("<body><main><div>Just a div of text</div></main></body>");
        assert_eq!(page.main_content(), Some("Just a div of text".to_string()));
    }

    #[test]
    fn test_main_content_none_without_region() {
        let page = HtmlPage::new("<body><div>No article or main here</div></body>");
        assert_eq!(page.main_content(), None);
    }

    #[test]
    fn test_button_labels_trimmed_non_empty_in_order() {
        let page = HtmlPage::new(PAGE);
        assert_eq!(
            page.button_labels(),
            vec!["Save".to_string(), "Delete".to_string()]
        );
    }

    #[test]
    fn test_no_buttons() {
        let page = HtmlPage::new("<body><p>quiet page</p></body>");
        assert!(page.button_labels().is_empty());
    }

    #[test]
    fn test_scroll_clamps_at_origin() {
        let mut page = HtmlPage::new("");
        page.scroll_by(0, 500);
        page.scroll_by(0, 500);
        assert_eq!(page.scroll_offset(), (0, 1000));

        page.scroll_by(0, -5000);
        assert_eq!(page.scroll_offset(), (0, 0));
    }

    #[test]
    fn test_history_back_and_forward() {
        let mut page = HtmlPage::new(r#"<body><a href="/first">go</a></body>"#);

        page.open_first_link();
        page.open_first_link();
        assert_eq!(page.current_target(), Some("/first"));
        assert_eq!(page.back_stack.len(), 1);

        page.navigate_back();
        assert_eq!(page.back_stack.len(), 0);
        assert_eq!(page.forward_stack.len(), 1);

        page.navigate_back();
        // Stack exhausted; stays put.
        assert_eq!(page.forward_stack.len(), 1);

        page.navigate_forward();
        assert_eq!(page.back_stack.len(), 1);
        assert!(page.forward_stack.is_empty());
    }

    #[test]
    fn test_open_link_clears_forward_stack() {
        let mut page = HtmlPage::new(r#"<body><a href="/x">go</a></body>"#);

        page.open_first_link();
        page.open_first_link();
        page.navigate_back();
        page.open_first_link();

        page.navigate_forward();
        // Forward history was discarded by the new navigation.
        assert!(page.forward_stack.is_empty());
    }
}
