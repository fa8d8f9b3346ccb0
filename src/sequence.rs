//! Compact sequence-set notation for message identifier sets.
//!
//! IMAP commands and responses carry sets of message identifiers in the
//! `sequence-set` grammar of [RFC 3501](https://tools.ietf.org/html/rfc3501#section-9):
//! comma-separated tokens, each either a single number (`7`) or an inclusive
//! range (`44:49`). [`compact`] produces that notation from an identifier
//! array and [`expand`] turns server-supplied notation back into explicit
//! identifiers.

use crate::error::{Error, ParseError, Result};

/// Render a set of unique, non-zero identifiers in minimal sequence-set form.
///
/// This is a single left-to-right pass: a run is extended while the next
/// element is exactly one greater than the current run maximum, and emitted as
/// `start` or `start:end` when it breaks. The input is deliberately *not*
/// sorted first; identifiers appear in the output in the order the caller
/// supplied them.
pub fn compact(ids: &[u32]) -> String {
    let mut out = String::new();
    for (i, run) in runs(ids).into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&run_text(run));
    }
    out
}

/// Group identifiers into inclusive `(start, end)` runs, preserving input order.
pub(crate) fn runs(ids: &[u32]) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut iter = ids.iter().copied();
    let first = match iter.next() {
        Some(first) => first,
        None => return runs,
    };

    let (mut start, mut end) = (first, first);
    for id in iter {
        // checked: a run ending at u32::MAX cannot be extended
        if end.checked_add(1) == Some(id) {
            end = id;
        } else {
            runs.push((start, end));
            start = id;
            end = id;
        }
    }
    runs.push((start, end));
    runs
}

pub(crate) fn run_text((start, end): (u32, u32)) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}:{}", start, end)
    }
}

/// Expand sequence-set text into the explicit identifiers it denotes.
///
/// `a:b` tokens yield the inclusive ascending run `a, a+1, ..., b`. The input
/// is untrusted server text, so empty, non-numeric, zero, and reversed-range
/// tokens are reported as [`Error::Parse`] rather than panicking.
pub fn expand(text: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    for token in text.split(',') {
        let mut ends = token.split(':');
        match (ends.next(), ends.next(), ends.next()) {
            (Some(single), None, None) => out.push(parse_id(single, token)?),
            (Some(start), Some(end), None) => {
                let start = parse_id(start, token)?;
                let end = parse_id(end, token)?;
                if start > end {
                    return Err(Error::Parse(ParseError::ReversedRange(token.to_string())));
                }
                out.extend(start..=end);
            }
            _ => {
                return Err(Error::Parse(ParseError::SequenceToken(token.to_string())));
            }
        }
    }
    Ok(out)
}

fn parse_id(text: &str, token: &str) -> Result<u32> {
    match text.parse::<u32>() {
        // message identifier 0 is reserved/invalid
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Parse(ParseError::SequenceToken(token.to_string()))),
    }
}
