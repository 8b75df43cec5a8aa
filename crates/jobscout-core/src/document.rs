//! Parsed page documents.
//!
//! A [`PageDocument`] pairs the transport status of a fetch with its
//! parsed HTML. Lookups go through CSS selectors (tag, `#id`, `.class`,
//! `[attr=value]`) plus regular-expression matching over attribute values.
//!
//! `scraper::Html` is not `Send`: documents are parsed, inspected and
//! dropped synchronously, never held across an `.await`.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::AppError;

/// One fetched page, parsed.
pub struct PageDocument {
    status: u16,
    html: Html,
}

impl PageDocument {
    pub fn parse(status: u16, body: &str) -> Self {
        Self {
            status,
            html: Html::parse_document(body),
        }
    }

    /// Raw transport status of the fetch that produced this document.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// All text nodes of the document, concatenated.
    pub fn text(&self) -> String {
        self.html.root_element().text().collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    /// Every element matching `css`, in document order.
    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, AppError> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).collect())
    }

    /// First element matching `css`.
    pub fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>, AppError> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).next())
    }

    /// Trimmed text of the first element matching `css`.
    pub fn first_text(&self, css: &str) -> Result<Option<String>, AppError> {
        Ok(self.first(css)?.map(element_text))
    }

    /// Like [`first_text`](Self::first_text) but fails when nothing matches.
    pub fn require_text(&self, css: &str) -> Result<String, AppError> {
        self.first_text(css)?
            .ok_or_else(|| AppError::ExtractionError(format!("no element matches '{css}'")))
    }

    /// Elements named `tag` whose `attr` value matches `pattern`.
    pub fn with_attr_matching(
        &self,
        tag: &str,
        attr: &str,
        pattern: &Regex,
    ) -> Result<Vec<ElementRef<'_>>, AppError> {
        let selector = selector(&format!("{tag}[{attr}]"))?;
        Ok(self
            .html
            .select(&selector)
            .filter(|el| el.value().attr(attr).is_some_and(|v| pattern.is_match(v)))
            .collect())
    }
}

/// Trimmed text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of `element`'s descendants matching `css`, each trimmed.
pub fn descendant_texts(element: ElementRef<'_>, css: &str) -> Result<Vec<String>, AppError> {
    let selector = selector(css)?;
    Ok(element.select(&selector).map(element_text).collect())
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::ParseError(format!("invalid selector '{css}': {e}")))
}
