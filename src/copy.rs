//! The batched copy operation: command issuing, response draining, and
//! destination-UID reconciliation.

use std::error::Error as StdError;
use std::fmt;
use std::io::{Read, Write};
use std::result;

use imap_proto::parser::parse_response;
use imap_proto::{Response, Status};
use log::{debug, warn};

use crate::batch::{self, ArgumentBatch};
use crate::client::{validate_str, Client};
use crate::error::{Error, ParseError, Result};
use crate::reconcile;
use crate::types::{Seq, Uid};

/// Operating mode of a UID copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The caller does not need destination UIDs; no response line is parsed
    /// and the resulting mapping is always empty.
    Fast,
    /// The caller needs the destination UID for every source UID, in source
    /// order. Requires the server to support the `UIDPLUS` extension; without
    /// it the mapping comes back all-unresolved.
    Accurate,
}

/// Destination UIDs in the same index order as the identifiers the caller
/// supplied. `None` marks a source UID the server's confirmations never
/// mentioned (extension unsupported, partial failure, or silently dropped);
/// that is data for the caller to inspect, not an error.
pub type UidMapping = Vec<Option<Uid>>;

/// An accurate-mode copy that failed partway.
///
/// Only protocol errors abort a copy; `mapping` keeps whatever was already
/// resolved by earlier successful batches so partial progress stays
/// observable.
#[derive(Debug)]
pub struct CopyError {
    pub mapping: UidMapping,
    pub error: Error,
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "copy failed with {} of {} destination UIDs resolved: {}",
            self.mapping.iter().filter(|m| m.is_some()).count(),
            self.mapping.len(),
            self.error
        )
    }
}

impl StdError for CopyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

/// Lifecycle of one command invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InvocationState {
    /// Command built but not yet sent.
    Pending,
    /// Command sent; response lines are being consumed, and in accurate mode
    /// each untagged line is still scanned for a confirmation.
    AwaitingResponse,
    /// A confirmation was folded (or none was requested); later lines are no
    /// longer scanned.
    Satisfied,
    /// The terminal line arrived without any confirmation having been found.
    Unsatisfied,
    /// The terminal line has been consumed.
    Done,
}

/// One physical command: formats the line, sends it, and drains response
/// lines until the tagged terminal response arrives.
struct Invocation {
    command: String,
    state: InvocationState,
}

impl Invocation {
    fn new(command: String) -> Invocation {
        Invocation {
            command,
            state: InvocationState::Pending,
        }
    }

    /// Drive the invocation to completion. Returns the disposition reached
    /// just before the terminal line (`Satisfied` or `Unsatisfied`); a
    /// non-success terminal or transport failure is an error.
    fn run<T: Read + Write>(
        &mut self,
        client: &mut Client<T>,
        mode: Mode,
        uids: &[Uid],
        mapping: &mut [Option<Uid>],
    ) -> Result<InvocationState> {
        debug_assert_eq!(self.state, InvocationState::Pending);
        client.run_command(&self.command)?;
        self.state = InvocationState::AwaitingResponse;
        if mode == Mode::Fast {
            // nothing to reconcile, so no line is ever fed to the scanner
            self.state = InvocationState::Satisfied;
        }

        let tag = client.command_tag();
        let mut line = Vec::new();
        loop {
            line.clear();
            client.readline(&mut line)?;

            match parse_response(&line) {
                Ok((
                    _,
                    Response::Done {
                        tag: done_tag,
                        status,
                        information,
                        ..
                    },
                )) if done_tag.as_bytes() == tag.as_bytes() => {
                    let disposition = if self.state == InvocationState::AwaitingResponse {
                        InvocationState::Unsatisfied
                    } else {
                        self.state
                    };
                    let information = information
                        .map(|text| text.to_string())
                        .unwrap_or_else(|| "no explanation given".to_string());
                    let outcome = match status {
                        Status::Ok => {
                            // a failed command explains itself; only a
                            // successful one that never confirmed is an anomaly
                            if disposition == InvocationState::Unsatisfied {
                                warn!(
                                    "no COPYUID confirmation for {:?}; destination UIDs remain unresolved",
                                    self.command
                                );
                            }
                            Ok(disposition)
                        }
                        Status::No => Err(Error::No(information)),
                        Status::Bad => Err(Error::Bad(information)),
                        _ => Err(Error::Parse(ParseError::Invalid(line.clone()))),
                    };
                    self.state = InvocationState::Done;
                    return outcome;
                }
                // untagged lines, tagged lines for stale commands, and
                // anything unparsable are all non-terminal for this command
                _ => {
                    if self.state == InvocationState::AwaitingResponse {
                        let text = String::from_utf8_lossy(&line);
                        if reconcile::apply(&text, uids, mapping) {
                            self.state = InvocationState::Satisfied;
                        }
                    }
                }
            }
        }
    }
}

/// A batched copy of a message set into a destination mailbox.
///
/// Owns the batch loop and the shared result mapping; one operation drives one
/// command channel at a time, sending each batch only after the previous
/// batch's terminal response was consumed.
pub(crate) struct CopyOperation {
    batches: Vec<ArgumentBatch>,
    uid_commands: bool,
    mode: Mode,
    uids: Vec<Uid>,
    mapping: UidMapping,
}

impl CopyOperation {
    /// Copy the inclusive sequence-number range `start:end`. Fast mode,
    /// sequence-number semantics.
    pub(crate) fn sequence_range(start: Seq, end: Seq, mailbox_name: &str) -> Result<CopyOperation> {
        let mailbox = validate_str(mailbox_name)?;
        Ok(CopyOperation {
            batches: batch::for_range(start, end, &mailbox),
            uid_commands: false,
            mode: Mode::Fast,
            uids: Vec::new(),
            mapping: UidMapping::new(),
        })
    }

    /// Copy an explicit sequence-number array. Fast mode.
    pub(crate) fn sequence_numbers(
        seq_numbers: &[Seq],
        sequential: bool,
        mailbox_name: &str,
    ) -> Result<CopyOperation> {
        let mailbox = validate_str(mailbox_name)?;
        Ok(CopyOperation {
            batches: batch::for_ids(seq_numbers, sequential, &mailbox),
            uid_commands: false,
            mode: Mode::Fast,
            uids: Vec::new(),
            mapping: UidMapping::new(),
        })
    }

    /// Copy an explicit UID array, optionally resolving destination UIDs.
    pub(crate) fn uids(
        uids: &[Uid],
        sequential: bool,
        mailbox_name: &str,
        mode: Mode,
    ) -> Result<CopyOperation> {
        let mailbox = validate_str(mailbox_name)?;
        let (kept, mapping) = match mode {
            Mode::Fast => (Vec::new(), UidMapping::new()),
            Mode::Accurate => (uids.to_vec(), vec![None; uids.len()]),
        };
        Ok(CopyOperation {
            batches: batch::for_ids(uids, sequential, &mailbox),
            uid_commands: true,
            mode,
            uids: kept,
            mapping,
        })
    }

    /// Copy the whole mailbox via the `1:*` wildcard. Fast mode only; there
    /// is no identifier set to reconcile against.
    pub(crate) fn whole_mailbox(mailbox_name: &str) -> Result<CopyOperation> {
        let mailbox = validate_str(mailbox_name)?;
        Ok(CopyOperation {
            batches: batch::for_all(&mailbox),
            uid_commands: false,
            mode: Mode::Fast,
            uids: Vec::new(),
            mapping: UidMapping::new(),
        })
    }

    /// Run every batch in order. An empty batch list (empty identifier set)
    /// sends nothing and succeeds immediately.
    pub(crate) fn run<T: Read + Write>(
        mut self,
        client: &mut Client<T>,
    ) -> result::Result<UidMapping, CopyError> {
        for i in 0..self.batches.len() {
            if self.mode == Mode::Accurate && self.mapping.iter().all(|m| m.is_some()) {
                // every requested UID already resolved by earlier batches
                break;
            }

            let command = self.batches[i].command(self.uid_commands);
            let mut invocation = Invocation::new(command);
            match invocation.run(client, self.mode, &self.uids, &mut self.mapping) {
                Ok(disposition) => {
                    debug!("{:?} finished {:?}", invocation.command, disposition);
                }
                Err(error) => {
                    return Err(CopyError {
                        mapping: self.mapping,
                        error,
                    });
                }
            }
        }
        Ok(self.mapping)
    }
}
