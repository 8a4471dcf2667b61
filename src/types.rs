use std::str::FromStr;
use serde::Deserialize;

/// What glob expansion does with a wildcard argument that matches nothing.
///
/// - `Drop`: the argument disappears from the expanded list (default).
/// - `Keep`: the literal pattern string is kept, like a shell without
///   `nullglob`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroMatchPolicy {
    Drop,
    Keep,
}

impl Default for ZeroMatchPolicy {
    fn default() -> Self {
        ZeroMatchPolicy::Drop
    }
}

impl FromStr for ZeroMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(ZeroMatchPolicy::Drop),
            "keep" => Ok(ZeroMatchPolicy::Keep),
            other => Err(format!(
                "invalid zero_match: {other} (expected \"drop\" or \"keep\")"
            )),
        }
    }
}

/// How a file redirection opens its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}
