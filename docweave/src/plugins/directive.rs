//! The `:::` directive syntax shared by all block plugins.
//!
//! ```text
//! :::panel type="info"
//! Body markdown, possibly holding
//! ::: column
//! nested directives
//! :::
//! :::
//! ```
//!
//! An opener is `:::` followed by a name and optional `key=value` parameters; a closer
//! is a line holding only `:::`. Openers inside the body nest. Lines inside fenced code
//! blocks never count as openers or closers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:::\s*([A-Za-z][\w-]*)(.*)$").expect("opener pattern is valid"));

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#)
        .expect("attribute pattern is valid")
});

/// A split directive: its name, raw parameter text and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub params: String,
    pub body: String,
}

impl Directive {
    pub fn attributes(&self) -> BTreeMap<String, String> {
        parse_attributes(&self.params)
    }
}

/// A run of body lines: either loose markdown or a nested directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Markdown(String),
    Directive(Directive),
}

/// Parse `key="value" key2='v' key3=bare` parameters. Unparseable text is ignored.
pub fn parse_attributes(params: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(params)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (caps[1].to_string(), value)
        })
        .collect()
}

/// Name and parameter text of an opener line.
pub fn opener(line: &str) -> Option<(&str, &str)> {
    let caps = OPENER.captures(line.trim_end())?;
    let name = caps.get(1)?.as_str();
    let params = caps.get(2).map_or("", |m| m.as_str()).trim();
    Some((name, params))
}

pub fn is_closer(line: &str) -> bool {
    line.trim() == ":::"
}

/// Tracks whether the scan is inside a fenced code block.
#[derive(Debug, Default)]
pub struct FenceState {
    open: Option<(char, usize)>,
}

impl FenceState {
    /// Feed a line; returns true if the line belongs to a code fence (including the
    /// fence delimiters themselves).
    pub fn observe(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        let run = |c: char| trimmed.chars().take_while(|&ch| ch == c).count();
        match (self.open, trimmed.chars().next()) {
            (Some((c, len)), Some(m)) if m == c && run(c) >= len && run(c) == trimmed.len() => {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, Some(m)) if (m == '`' || m == '~') && run(m) >= 3 => {
                self.open = Some((m, run(m)));
                true
            }
            (None, _) => false,
        }
    }
}

/// Index of the line closing the directive opened at `open`, honoring nesting and fences.
pub fn find_close(lines: &[&str], open: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut fence = FenceState::default();
    for (index, line) in lines.iter().enumerate().skip(open + 1) {
        if fence.observe(line) {
            continue;
        }
        if opener(line).is_some() {
            depth += 1;
        } else if is_closer(line) {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// Split a complete directive (opener through closer) into its parts.
pub fn split(raw: &str) -> Option<Directive> {
    let lines: Vec<&str> = raw.lines().collect();
    let (name, params) = opener(lines.first()?)?;
    let close = find_close(&lines, 0)?;
    let body = lines[1..close].join("\n");
    Some(Directive {
        name: name.to_string(),
        params: params.to_string(),
        body,
    })
}

/// Split a body into loose markdown and top-level nested directives.
///
/// An opener without a closer is kept as markdown.
pub fn sections(body: &str) -> Vec<Section> {
    let lines: Vec<&str> = body.lines().collect();
    let mut sections = Vec::new();
    let mut loose: Vec<&str> = Vec::new();
    let mut fence = FenceState::default();
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        if !fence.observe(line) {
            if let Some((name, params)) = opener(line) {
                if let Some(close) = find_close(&lines, index) {
                    if !loose.is_empty() {
                        sections.push(Section::Markdown(loose.join("\n")));
                        loose.clear();
                    }
                    sections.push(Section::Directive(Directive {
                        name: name.to_string(),
                        params: params.to_string(),
                        body: lines[index + 1..close].join("\n"),
                    }));
                    index = close + 1;
                    continue;
                }
            }
        }
        loose.push(line);
        index += 1;
    }
    if loose.iter().any(|l| !l.trim().is_empty()) {
        sections.push(Section::Markdown(loose.join("\n")));
    }
    sections
        .into_iter()
        .filter(|s| !matches!(s, Section::Markdown(md) if md.trim().is_empty()))
        .collect()
}
