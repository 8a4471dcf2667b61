// src/glob/pattern.rs

use regex::Regex;

use crate::paths::has_wildcard;

/// One path segment compiled into a matcher.
///
/// `*` matches any run of characters (including none), `?` exactly one
/// character; everything else is literal and case-sensitive. A segment never
/// contains a separator, so wildcards cannot cross one.
#[derive(Debug, Clone)]
pub struct SegmentPattern {
    source: String,
    regex: Regex,
}

impl SegmentPattern {
    pub fn new(segment: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&translate(segment))?;
        Ok(Self {
            source: segment.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_wildcard(segment: &str) -> bool {
        has_wildcard(segment)
    }
}

/// Wildcard segment → anchored regex source.
fn translate(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 8);
    out.push_str("(?s)^");
    let mut literal = String::new();

    for c in segment.chars() {
        match c {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}
