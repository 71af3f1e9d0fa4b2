//! Result extraction from a snapshot of the results container
//!
//! The container's outer HTML is read once from the live page and parsed
//! here with `scraper`. Extraction is therefore read-only and independent of
//! the browser: every item and every field is looked up on its own, and a
//! missing node yields an empty value instead of an error.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::types::{
    ARTICLE_LINK_NAME_PATTERN, CREATED_AT_PATTERN, INSERT_INFO_SELECTOR, LINK_ROLE_SELECTOR,
    RESULT_ITEM_SELECTOR, SearchResult, TAG_SELECTOR, TITLE_SELECTOR, WRITTEN_BY_PATTERN,
};

static RESULT_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse(RESULT_ITEM_SELECTOR).unwrap());
static INSERT_INFO: Lazy<Selector> = Lazy::new(|| Selector::parse(INSERT_INFO_SELECTOR).unwrap());
static LINK_ROLE: Lazy<Selector> = Lazy::new(|| Selector::parse(LINK_ROLE_SELECTOR).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(TITLE_SELECTOR).unwrap());
static TAG: Lazy<Selector> = Lazy::new(|| Selector::parse(TAG_SELECTOR).unwrap());

static ARTICLE_LINK_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(ARTICLE_LINK_NAME_PATTERN).unwrap());
static WRITTEN_BY: Lazy<Regex> = Lazy::new(|| Regex::new(WRITTEN_BY_PATTERN).unwrap());
static CREATED_AT: Lazy<Regex> = Lazy::new(|| Regex::new(CREATED_AT_PATTERN).unwrap());

/// Scalar fields of a [`SearchResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Url,
    Author,
    CreatedAt,
}

impl Field {
    fn assign(self, result: &mut SearchResult, value: String) {
        match self {
            Field::Title => result.title = value,
            Field::Url => result.url = value,
            Field::Author => result.author = value,
            Field::CreatedAt => result.created_at = value,
        }
    }
}

/// Where a field's source node sits relative to a result item
#[derive(Clone, Copy)]
enum Locator {
    /// Link inside `.insert_info` whose accessible name looks like `#42 Title`
    ArticleLink,
    /// First descendant of the article link matching a selector
    InArticleLink(&'static Lazy<Selector>),
    /// First `a` child of a `div` child of `.insert_info`
    AuthorLink,
    /// Innermost element, the item itself included, whose normalized text matches
    TextMatching(&'static Lazy<Regex>),
}

impl Locator {
    fn find<'a>(self, item: ElementRef<'a>) -> Option<ElementRef<'a>> {
        match self {
            Locator::ArticleLink => article_link(item),
            Locator::InArticleLink(selector) => article_link(item)?.select(selector).next(),
            Locator::AuthorLink => author_link(item),
            Locator::TextMatching(pattern) => innermost_text_match(item, pattern),
        }
    }
}

/// How a located node becomes a field value
#[derive(Clone, Copy)]
enum Rule {
    /// Text content, trimmed, whitespace runs collapsed to one space
    CollapsedText,
    /// Text content exactly as in the DOM
    RawText,
    /// Attribute value, empty when absent
    Attribute(&'static str),
    /// Pure parser applied to the normalized text content
    Parse(fn(&str) -> String),
}

impl Rule {
    fn apply(self, node: ElementRef<'_>) -> String {
        match self {
            Rule::CollapsedText => collapse_whitespace(&text_content(node)),
            Rule::RawText => text_content(node),
            Rule::Attribute(name) => node.value().attr(name).unwrap_or_default().to_string(),
            Rule::Parse(parse) => parse(&collapse_whitespace(&text_content(node))),
        }
    }
}

struct FieldMapping {
    field: Field,
    locator: Locator,
    rule: Rule,
}

fn field_mappings() -> [FieldMapping; 4] {
    [
        FieldMapping {
            field: Field::Title,
            locator: Locator::InArticleLink(&TITLE),
            rule: Rule::CollapsedText,
        },
        FieldMapping {
            field: Field::Url,
            locator: Locator::ArticleLink,
            rule: Rule::Attribute("href"),
        },
        FieldMapping {
            field: Field::Author,
            locator: Locator::AuthorLink,
            rule: Rule::RawText,
        },
        FieldMapping {
            field: Field::CreatedAt,
            locator: Locator::TextMatching(&WRITTEN_BY),
            rule: Rule::Parse(parse_created_at),
        },
    ]
}

/// Extract every result item from the results container's HTML
///
/// Items come back in document order. An item whose sub-nodes are all
/// missing still produces a record with empty fields.
pub fn extract_results(container_html: &str) -> Vec<SearchResult> {
    let fragment = Html::parse_fragment(container_html);

    fragment
        .select(&RESULT_ITEM)
        .enumerate()
        .map(|(index, item)| extract_item(index, item))
        .collect()
}

fn extract_item(index: usize, item: ElementRef<'_>) -> SearchResult {
    let mut result = SearchResult::default();

    for mapping in field_mappings() {
        let value = mapping
            .locator
            .find(item)
            .map(|node| mapping.rule.apply(node))
            .unwrap_or_default();

        if value.is_empty() {
            debug!(item = index + 1, field = ?mapping.field, "Field missing, left empty");
        }
        mapping.field.assign(&mut result, value);
    }

    result.tags = item.select(&TAG).map(text_content).collect();

    result
}

/// Parse the timestamp out of an authorship line
///
/// Returns everything after the last ` at ` up to an optional parenthetical,
/// or an empty string when the line does not match.
///
/// ```rust
/// use kodegen_tools_knowledge::parse_created_at;
///
/// assert_eq!(
///     parse_created_at("written by Jane at 2025/01/01 09:30 (3 days ago)"),
///     "2025/01/01 09:30"
/// );
/// assert_eq!(parse_created_at("no authorship here"), "");
/// ```
pub fn parse_created_at(text: &str) -> String {
    CREATED_AT
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Trim and collapse every whitespace run (newlines included) to one space
///
/// Every run is collapsed, not only the first one, so titles wrapped over
/// several lines in the markup come out on one line.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_content(node: ElementRef<'_>) -> String {
    node.text().collect()
}

/// Accessible name of a link: `aria-label` when present, else its text
fn accessible_name(link: ElementRef<'_>) -> String {
    match link.value().attr("aria-label").map(str::trim) {
        Some(label) if !label.is_empty() => collapse_whitespace(label),
        _ => collapse_whitespace(&text_content(link)),
    }
}

fn article_link(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let insert_info = item.select(&INSERT_INFO).next()?;

    insert_info
        .select(&LINK_ROLE)
        .find(|link| ARTICLE_LINK_NAME.is_match(&accessible_name(*link)))
}

fn author_link(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let insert_info = item.select(&INSERT_INFO).next()?;

    child_elements(insert_info)
        .filter(|child| child.value().name() == "div")
        .flat_map(child_elements)
        .find(|grandchild| grandchild.value().name() == "a")
}

fn child_elements(node: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    node.children().filter_map(ElementRef::wrap)
}

fn innermost_text_match<'a>(item: ElementRef<'a>, pattern: &Regex) -> Option<ElementRef<'a>> {
    let matches = |node: ElementRef<'_>| pattern.is_match(&collapse_whitespace(&text_content(node)));

    item.descendants()
        .filter_map(ElementRef::wrap)
        .find(|node| matches(*node) && !child_elements(*node).any(&matches))
}
