//! Marker codec for the managed region of the hosts file.
//!
//! The region owned by focos looks like this:
//!
//! ```text
//! # FOCOS_BLOCK_START
//! 127.0.0.1 example.com
//! 127.0.0.1 www.example.com
//! ::1 example.com
//! ::1 www.example.com
//! # FOCOS_BLOCK_END
//! ```
//!
//! Marker lines are located by an explicit line scan. Anything that does not
//! form a well-nested start/end pair is reported as corrupt instead of being
//! guessed at.

use crate::domain::normalize_all;
use crate::error::BlockError;

pub const MARKER_START: &str = "# FOCOS_BLOCK_START";
pub const MARKER_END: &str = "# FOCOS_BLOCK_END";

const LOOPBACK_V4: &str = "127.0.0.1";
const LOOPBACK_V6: &str = "::1";

/// Line range `[first, last]` (0-based, inclusive) of one managed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockSpan {
    first: usize,
    last: usize,
}

/// Build a fresh managed block for `domains`.
///
/// Domains are normalized and deduplicated here as well, so the output only
/// depends on the set of usable domains and their first-appearance order.
/// Returns an empty string if nothing usable remains.
pub fn encode<S: AsRef<str>>(domains: &[S]) -> String {
    let domains = normalize_all(domains);
    if domains.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(64 + domains.len() * 80);
    out.push_str(MARKER_START);
    out.push('\n');
    for domain in &domains {
        for line in redirect_lines(domain) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(MARKER_END);
    out.push('\n');
    out
}

/// Remove every managed block from `content`.
///
/// Marker lines and everything between them are dropped together with their
/// line terminators; all other lines are kept byte-for-byte.
pub fn strip(content: &str) -> Result<String, BlockError> {
    let spans = scan(content)?;
    if spans.is_empty() {
        return Ok(content.to_string());
    }

    let mut out = String::with_capacity(content.len());
    let mut spans = spans.iter().peekable();
    for (idx, line) in content.split_inclusive('\n').enumerate() {
        while spans.peek().is_some_and(|s| s.last < idx) {
            spans.next();
        }
        let inside = spans.peek().is_some_and(|s| s.first <= idx && idx <= s.last);
        if !inside {
            out.push_str(line);
        }
    }
    Ok(out)
}

/// Whether `content` currently holds a managed block.
pub fn contains_block(content: &str) -> Result<bool, BlockError> {
    Ok(!scan(content)?.is_empty())
}

/// Read back the domains recorded in the first managed block.
///
/// Each domain occupies four consecutive redirect lines; the host name is
/// taken from the first line of every group.
pub fn extract(content: &str) -> Result<Option<Vec<String>>, BlockError> {
    let spans = scan(content)?;
    let Some(span) = spans.first() else {
        return Ok(None);
    };

    let entries: Vec<&str> = content
        .split_inclusive('\n')
        .skip(span.first + 1)
        .take(span.last - span.first - 1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let domains = entries
        .chunks(4)
        .filter_map(|group| group.first())
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect();
    Ok(Some(domains))
}

fn redirect_lines(domain: &str) -> [String; 4] {
    [
        format!("{LOOPBACK_V4} {domain}"),
        format!("{LOOPBACK_V4} www.{domain}"),
        format!("{LOOPBACK_V6} {domain}"),
        format!("{LOOPBACK_V6} www.{domain}"),
    ]
}

fn scan(content: &str) -> Result<Vec<BlockSpan>, BlockError> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let text = line.trim();
        if text == MARKER_START {
            if let Some(first) = open {
                return Err(BlockError::CorruptMarkerBlock {
                    line: idx + 1,
                    reason: format!(
                        "start marker repeated before the block opened at line {} was closed",
                        first + 1
                    ),
                });
            }
            open = Some(idx);
        } else if text == MARKER_END {
            match open.take() {
                Some(first) => spans.push(BlockSpan { first, last: idx }),
                None => {
                    return Err(BlockError::CorruptMarkerBlock {
                        line: idx + 1,
                        reason: "end marker without a preceding start marker".into(),
                    })
                }
            }
        }
    }

    if let Some(first) = open {
        return Err(BlockError::CorruptMarkerBlock {
            line: first + 1,
            reason: "start marker without a matching end marker".into(),
        });
    }
    Ok(spans)
}
