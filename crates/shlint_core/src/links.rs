//! Rule documentation links inside `# shellcheck disable=` directives.

use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostic::{Position, TextRange};

const WIKI_BASE: &str = "https://www.shellcheck.net/wiki/";

static DIRECTIVE: OnceLock<Regex> = OnceLock::new();
static RULE_TOKEN: OnceLock<Regex> = OnceLock::new();

/// Documentation URL for a ShellCheck code.
pub fn wiki_url(code: u32) -> String {
    format!("{}SC{}", WIKI_BASE, code)
}

/// A linkable rule reference in the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLink {
    pub range: TextRange,
    pub code: u32,
    pub url: String,
}

/// Finds every rule reference on `# shellcheck disable=` lines.
pub fn find_rule_links(text: &str) -> Vec<RuleLink> {
    let directive =
        DIRECTIVE.get_or_init(|| Regex::new(r"#\s*shellcheck\s+disable=").expect("valid regex"));
    let token =
        RULE_TOKEN.get_or_init(|| Regex::new(r"\b(?:SC)?(\d{4})\b").expect("valid regex"));

    let mut links = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if !directive.is_match(line) {
            continue;
        }
        for caps in token.captures_iter(line) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(code) = digits.as_str().parse::<u32>() else {
                continue;
            };
            let line_no = line_no as u32;
            let start = utf16_len(&line[..whole.start()]);
            let end = start + utf16_len(whole.as_str());
            links.push(RuleLink {
                range: TextRange::new(Position::new(line_no, start), Position::new(line_no, end)),
                code,
                url: wiki_url(code),
            });
        }
    }
    links
}

fn utf16_len(s: &str) -> u32 {
    s.chars().map(|c| c.len_utf16() as u32).sum()
}
