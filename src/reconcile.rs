//! Folds `COPYUID` confirmations into a caller-ordered destination-UID mapping.
//!
//! Servers supporting [RFC 4315](https://tools.ietf.org/html/rfc4315) confirm
//! a copy with a response code like `[COPYUID 1184051486 10031:10033
//! 1024:1026]`: the destination mailbox's `UIDVALIDITY`, the source UIDs that
//! were copied, and the UIDs they received in the destination. Both sets use
//! the server's own compacted, re-ordered notation, so the pairs have to be
//! expanded and matched back against the identifier order the caller asked
//! for.
//!
//! The surrounding line format is not fully under our control (the code may be
//! embedded in an untagged `* OK [...]` line with arbitrary trailing text), so
//! this is deliberately a tolerant scan-for-keyword-then-tokenize parser, not
//! a strict grammar. Anything malformed is logged and skipped; a corrupt
//! confirmation must never abort an otherwise-successful copy.

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::sequence;
use crate::types::Uid;

lazy_static! {
    static ref COPYUID: Regex = Regex::new(r"(?i)\bCOPYUID\b").unwrap();
}

/// The payload of one `COPYUID` confirmation, expanded.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Confirmation {
    pub uid_validity: u32,
    pub source: Vec<Uid>,
    pub destination: Vec<Uid>,
}

/// Scan one response line for a `COPYUID` confirmation.
///
/// Returns `None` both for lines that are simply not confirmations (untagged
/// mailbox-state noise, ignored silently) and for confirmations that turn out
/// to be malformed (logged as a recoverable anomaly).
pub(crate) fn scan(line: &str) -> Option<Confirmation> {
    let keyword = COPYUID.find(line)?;

    let mut tokens = line[keyword.end()..].split_whitespace();
    let (validity, source, destination) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(validity), Some(source), Some(destination)) => (validity, source, destination),
        _ => {
            warn!(
                "malformed COPYUID response, fewer than three arguments: {:?}",
                line.trim_end()
            );
            return None;
        }
    };

    let uid_validity = match validity.parse::<u32>() {
        Ok(v) => v,
        Err(_) => {
            warn!("malformed COPYUID response, bad UIDVALIDITY {:?}", validity);
            return None;
        }
    };

    // the destination set may carry the closing bracket of the response code
    let destination = destination.trim_end_matches(']');

    let source = match sequence::expand(source) {
        Ok(set) => set,
        Err(e) => {
            warn!("unparsable COPYUID source set {:?}: {}", source, e);
            return None;
        }
    };
    let destination = match sequence::expand(destination) {
        Ok(set) => set,
        Err(e) => {
            warn!("unparsable COPYUID destination set {:?}: {}", destination, e);
            return None;
        }
    };

    if source.len() != destination.len() {
        warn!(
            "COPYUID sets differ in length ({} source vs {} destination): {:?}",
            source.len(),
            destination.len(),
            line.trim_end()
        );
        return None;
    }

    Some(Confirmation {
        uid_validity,
        source,
        destination,
    })
}

/// Fold the confirmation carried by `line`, if any, into `mapping`.
///
/// `uids` is the caller's original identifier array; `mapping` has the same
/// length and index order. Returns whether a confirmation was consumed so the
/// invocation can stop scanning further lines.
pub(crate) fn apply(line: &str, uids: &[Uid], mapping: &mut [Option<Uid>]) -> bool {
    let confirmation = match scan(line) {
        Some(confirmation) => confirmation,
        None => return false,
    };

    debug!(
        "COPYUID: {} messages, destination UIDVALIDITY {}",
        confirmation.source.len(),
        confirmation.uid_validity
    );

    for (source, destination) in confirmation.source.iter().zip(&confirmation.destination) {
        match uids.iter().position(|uid| uid == source) {
            Some(i) => mapping[i] = Some(*destination),
            None => warn!("server confirmed UID {} which was never requested", source),
        }
    }
    true
}
