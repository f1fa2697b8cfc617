// src/mquery.rs
//! Power Query M document parsing.
//!
//! Splits a section document into its named `shared` queries. Older
//! documents arrive with escaped newlines and quotes, so the text is
//! unescaped before matching.

use once_cell::sync::Lazy;
use regex::Regex;

const SECTION_MARKER: &str = "section Section1;";

/// Header of one `shared` block: optional `[...]` annotation, the keyword,
/// then a bare or `#"quoted"` name and `=`. The expression is the text up
/// to the next header.
static SHARED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)(?:\[[^\]]*\]\s*)?shared\s+(?:#"(.*?)"|([A-Za-z_]\w*))\s*=\s*"#)
        .expect("Failed to compile shared query regex - this is a bug in the code")
});

static TRAILING_SEMICOLON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r";\s*$").expect("Failed to compile semicolon regex - this is a bug in the code")
});

static NAME_DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9()&,.\- ]")
        .expect("Failed to compile name cleaning regex - this is a bug in the code")
});

/// One named query of an M document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBlock {
    pub name: String,
    pub expression: String,
}

impl QueryBlock {
    fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

/// Parses `document` into its query blocks, in document order.
///
/// A document without the section marker has no queries. Blocks with an
/// empty name or an empty expression are dropped.
pub fn parse(document: &str) -> Vec<QueryBlock> {
    let text = unescape(document);
    let Some((_, section)) = text.split_once(SECTION_MARKER) else {
        return Vec::new();
    };

    let headers: Vec<_> = SHARED_HEADER.captures_iter(section).collect();
    let mut blocks = Vec::with_capacity(headers.len());

    for (i, caps) in headers.iter().enumerate() {
        let Some(whole) = caps.get(0) else { continue };
        let body_end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(section.len(), |m| m.start());

        let name = caps
            .get(1)
            .filter(|m| !m.as_str().is_empty())
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str());
        let raw = section[whole.end()..body_end].trim();
        let expression = TRAILING_SEMICOLON.replace(raw, "");
        let expression = expression.trim();

        if name.is_empty() || expression.is_empty() {
            continue;
        }
        blocks.push(QueryBlock::new(name, expression));
    }

    blocks
}

fn unescape(document: &str) -> String {
    document
        .replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\\\"", "\"")
}

/// Display-safe name: brackets become parentheses and anything outside
/// letters, digits, spaces and `()&,.-` becomes a space.
pub fn clean_name(name: &str) -> String {
    let bracketed = name.replace('[', "(").replace(']', ")");
    NAME_DISALLOWED.replace_all(&bracketed, " ").trim().to_string()
}

/// `"<workspace> ~ <dataflow>"` with both names cleaned.
pub fn workspace_dataflow_label(workspace: &str, dataflow: &str) -> String {
    format!("{} ~ {}", clean_name(workspace), clean_name(dataflow))
}
