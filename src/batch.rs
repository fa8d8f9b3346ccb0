//! Splits an identifier set into the textual argument batches of one or more
//! `COPY` commands.

use crate::sequence;
use crate::types::Seq;

/// Longest sequence-set argument placed in a single command. Several servers
/// cap the total command line around 8 KiB, so over-long sets are split into
/// multiple physical commands.
const MAX_SET_LEN: usize = 7500;

/// The sequence-set denoting every message in the mailbox.
const WILDCARD_SET: &str = "1:*";

/// The argument material of one physical `COPY` command: a sequence-set
/// expression plus the (already validated and quoted) destination mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArgumentBatch {
    pub set: String,
    pub mailbox: String,
}

impl ArgumentBatch {
    /// Render the literal command line, without the tag prefix.
    pub fn command(&self, uid: bool) -> String {
        format!(
            "{}COPY {} {}",
            if uid { "UID " } else { "" },
            self.set,
            self.mailbox
        )
    }
}

/// One batch spanning the inclusive sequence-number range `start:end`.
pub(crate) fn for_range(start: Seq, end: Seq, mailbox: &str) -> Vec<ArgumentBatch> {
    vec![ArgumentBatch {
        set: format!("{}:{}", start, end),
        mailbox: mailbox.to_string(),
    }]
}

/// Batches for an explicit identifier array.
///
/// An empty array yields no batches at all; the caller short-circuits without
/// sending anything. When `sequential` is set the array is trusted to be a
/// contiguous ascending run and a single `first:last` set is emitted without
/// compaction; a caller that lies here addresses the wrong messages, which is
/// a documented trust boundary rather than something verified per call.
pub(crate) fn for_ids(ids: &[u32], sequential: bool, mailbox: &str) -> Vec<ArgumentBatch> {
    if ids.is_empty() {
        return Vec::new();
    }

    let sets = if sequential {
        vec![format!("{}:{}", ids[0], ids[ids.len() - 1])]
    } else {
        let tokens: Vec<String> = sequence::runs(ids)
            .into_iter()
            .map(sequence::run_text)
            .collect();
        pack(tokens, MAX_SET_LEN)
    };

    sets.into_iter()
        .map(|set| ArgumentBatch {
            set,
            mailbox: mailbox.to_string(),
        })
        .collect()
}

/// The single wildcard batch copying the entire mailbox.
pub(crate) fn for_all(mailbox: &str) -> Vec<ArgumentBatch> {
    vec![ArgumentBatch {
        set: WILDCARD_SET.to_string(),
        mailbox: mailbox.to_string(),
    }]
}

/// Greedily join run tokens with commas, starting a new set whenever adding
/// the next token would push the current one past `max_len`.
fn pack(tokens: Vec<String>, max_len: usize) -> Vec<String> {
    let mut sets = Vec::new();
    let mut current = String::new();
    for token in tokens {
        if !current.is_empty() && current.len() + 1 + token.len() > max_len {
            sets.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(',');
        }
        current.push_str(&token);
    }
    if !current.is_empty() {
        sets.push(current);
    }
    sets
}
