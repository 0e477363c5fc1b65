//! Built-in rule-based detector.
//!
//! Character scanners for the structured identifiers statistical models
//! are weakest at: email addresses, phone numbers, numeric dates and
//! long identifier digit runs. Purely local, no model, no network; it
//! complements the HTTP backends rather than replacing them.
//!
//! Unlike remote backends, the offsets produced here are exact, so
//! spans are built directly instead of going through the search-based
//! resolution fallback (which would relocate repeated matches to their
//! first occurrence).

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Chunk, EntityKind, EntitySpan};

use super::{is_placeholder_echo, Detector};

/// Minimum digits for a run to count as a phone number
const PHONE_MIN_DIGITS: usize = 8;
/// Maximum digits for a phone number (E.164 bound)
const PHONE_MAX_DIGITS: usize = 15;
/// Minimum digits for a bare run to count as an identifier
const ID_MIN_DIGITS: usize = 6;

/// A chunk-local match from one of the scanners.
struct RuleMatch {
    start: usize,
    end: usize,
    kind: EntityKind,
}

/// Rule-based detection backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleDetector;

impl RuleDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Detector for RuleDetector {
    fn name(&self) -> &str {
        "rules"
    }

    async fn detect(&self, chunk: &Chunk) -> Result<Vec<EntitySpan>> {
        let chars: Vec<char> = chunk.text.chars().collect();

        let mut matches = Vec::new();
        scan_emails(&chars, &mut matches);
        scan_dates(&chars, &mut matches);
        scan_phones(&chars, &mut matches);
        scan_id_runs(&chars, &mut matches);

        let spans = matches
            .into_iter()
            .map(|m| {
                let text: String = chars[m.start..m.end].iter().collect();
                EntitySpan {
                    text,
                    kind: m.kind,
                    score: 1.0,
                    start: chunk.start_offset + m.start,
                    end: chunk.start_offset + m.end,
                    chunk_index: chunk.index,
                    source: "rules".to_string(),
                }
            })
            // Don't re-tag placeholder markers when rescanning redacted text
            .filter(|s| !is_placeholder_echo(&s.text))
            .collect();

        Ok(spans)
    }
}

fn is_local_part_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-')
}

/// `local@domain.tld`, anchored at each `@`.
fn scan_emails(chars: &[char], out: &mut Vec<RuleMatch>) {
    for (i, &c) in chars.iter().enumerate() {
        if c != '@' {
            continue;
        }

        let mut start = i;
        while start > 0 && is_local_part_char(chars[start - 1]) {
            start -= 1;
        }

        let mut end = i + 1;
        while end < chars.len() && is_domain_char(chars[end]) {
            end += 1;
        }
        // A sentence period right after the address is not part of it
        while end > i + 1 && chars[end - 1] == '.' {
            end -= 1;
        }

        if start == i || end == i + 1 {
            continue;
        }

        // Domain needs a dot and an alphabetic TLD of at least 2 chars
        let domain: String = chars[i + 1..end].iter().collect();
        let tld_ok = domain
            .rsplit('.')
            .next()
            .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
            .unwrap_or(false);

        if domain.contains('.') && tld_ok {
            out.push(RuleMatch {
                start,
                end,
                kind: EntityKind::Email,
            });
        }
    }
}

/// Numeric dates shaped `dd/mm/yyyy` or `dd-mm-yyyy` (2- or 4-digit
/// year, consistent separator).
fn scan_dates(chars: &[char], out: &mut Vec<RuleMatch>) {
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() || (i > 0 && chars[i - 1].is_ascii_digit()) {
            i += 1;
            continue;
        }

        if let Some(end) = match_date_at(chars, i) {
            out.push(RuleMatch {
                start: i,
                end,
                kind: EntityKind::Date,
            });
            i = end;
        } else {
            i += 1;
        }
    }
}

fn match_date_at(chars: &[char], start: usize) -> Option<usize> {
    let mut pos = start;

    let day = digit_run(chars, pos, 2);
    if !(1..=2).contains(&day) {
        return None;
    }
    pos += day;

    let sep = *chars.get(pos)?;
    if !matches!(sep, '/' | '-') {
        return None;
    }
    pos += 1;

    let month = digit_run(chars, pos, 2);
    if !(1..=2).contains(&month) {
        return None;
    }
    pos += month;

    if *chars.get(pos)? != sep {
        return None;
    }
    pos += 1;

    let year = digit_run(chars, pos, 4);
    if year != 2 && year != 4 {
        return None;
    }
    pos += year;

    // Must not continue into a longer digit run
    if chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(pos)
}

/// Count consecutive digits at `pos`, capped at `max + 1` so callers
/// can tell "too many" from "exactly max".
fn digit_run(chars: &[char], pos: usize, max: usize) -> usize {
    let mut count = 0;
    while count <= max && chars.get(pos + count).is_some_and(|c| c.is_ascii_digit()) {
        count += 1;
    }
    count
}

/// Digit runs with common phone separators, 8 to 15 digits total.
fn scan_phones(chars: &[char], out: &mut Vec<RuleMatch>) {
    let mut i = 0;
    while i < chars.len() {
        let leads = chars[i].is_ascii_digit()
            || (chars[i] == '+'
                && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()));

        if !leads || (i > 0 && chars[i - 1].is_ascii_digit()) {
            i += 1;
            continue;
        }

        let start = i;
        let mut j = if chars[i] == '+' { i + 1 } else { i };
        let mut digits = 0;
        let mut last_digit_end = j;

        while j < chars.len() {
            let c = chars[j];
            if c.is_ascii_digit() {
                digits += 1;
                j += 1;
                last_digit_end = j;
            } else if matches!(c, ' ' | '.' | '-' | '(' | ')') {
                j += 1;
            } else {
                break;
            }
        }

        if (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits) {
            out.push(RuleMatch {
                start,
                end: last_digit_end,
                kind: EntityKind::Phone,
            });
        }

        i = last_digit_end.max(i + 1);
    }
}

/// Bare contiguous digit runs long enough to be record identifiers.
fn scan_id_runs(chars: &[char], out: &mut Vec<RuleMatch>) {
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() || (i > 0 && chars[i - 1].is_ascii_digit()) {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }

        if end - start >= ID_MIN_DIGITS {
            out.push(RuleMatch {
                start,
                end,
                kind: EntityKind::Id,
            });
        }

        i = end;
    }
}
