//! Label-addressed lookup over a parsed detail page
//!
//! Detail pages render every field as `<div><span>Label</span>value</div>`.
//! The field extractors only need "the text following label X", so that is
//! all the [`LabelledFields`] trait exposes.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());

/// A page whose values can be addressed by the label preceding them
pub trait LabelledFields {
    /// Returns the text that follows `label` within its enclosing element,
    /// with the label itself and trailing whitespace removed
    ///
    /// Returns `None` when the label is absent or nothing follows it.
    fn text_after_label(&self, label: &str) -> Option<String>;
}

/// A detail page parsed into a DOM tree
pub struct ApplicationPage {
    document: Html,
}

impl ApplicationPage {
    /// Parses the HTML of a detail page
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Finds the first `<span>` whose text is exactly `label`
    fn label_span(&self, label: &str) -> Option<ElementRef<'_>> {
        self.document
            .select(&SPAN)
            .find(|span| span.text().collect::<String>().trim() == label)
    }
}

impl LabelledFields for ApplicationPage {
    fn text_after_label(&self, label: &str) -> Option<String> {
        let span = self.label_span(label)?;
        let parent = span.parent().and_then(ElementRef::wrap)?;
        let content: String = parent.text().collect();
        strip_label(&content, label)
    }
}

/// Removes leading whitespace plus `label`, then trailing whitespace
///
/// Whitespace between the label and the value is kept, it is part of the value.
pub fn strip_label(content: &str, label: &str) -> Option<String> {
    let rest = content.trim_start();
    let rest = rest.strip_prefix(label).unwrap_or(rest);
    let value = rest.trim_end();

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
