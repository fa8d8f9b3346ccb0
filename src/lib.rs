//! Batched IMAP `COPY`/`UID COPY` issuing with `COPYUID` reconciliation.
//!
//! Given an arbitrary, possibly non-contiguous set of message identifiers,
//! this crate builds the minimal number of wire commands that copy those
//! messages into a destination mailbox, and — when the server confirms with a
//! [RFC 4315](https://tools.ietf.org/html/rfc4315) `COPYUID` response code —
//! reports which destination UID each source UID received, in the caller's
//! original identifier order, even though the server's confirmation uses its
//! own compacted, re-ordered range notation.
//!
//! Connection management, TLS, authentication, and mailbox selection are out
//! of scope: [`Client::new`] takes any established `Read + Write` transport
//! that is already logged in with the source mailbox selected.
//!
//! # Usage
//!
//! ```no_run
//! use std::net::TcpStream;
//!
//! use imap_copy::{Client, Mode};
//!
//! let stream = TcpStream::connect(("imap.example.com", 143)).unwrap();
//! let mut client = Client::new(stream);
//! client.read_greeting().unwrap();
//!
//! // ... LOGIN and SELECT performed by the surrounding session layer ...
//!
//! // Fast: fire-and-forget, no destination UIDs requested.
//! client.copy_range(1, 10, "Archive").unwrap();
//!
//! // Accurate: mapping[i] is the destination UID assigned to uids[i],
//! // or None if the server's COPYUID confirmation did not cover it.
//! let uids = [10031, 10032, 10033];
//! let mapping = client
//!     .uid_copy(&uids, true, "Archive", Mode::Accurate)
//!     .unwrap();
//! for (uid, dest) in uids.iter().zip(&mapping) {
//!     println!("{} -> {:?}", uid, dest);
//! }
//! ```

mod batch;
mod reconcile;

pub mod client;
pub mod copy;
pub mod error;
pub mod sequence;
pub mod types;

pub use crate::client::Client;
pub use crate::copy::{CopyError, Mode, UidMapping};
pub use crate::error::{Error, ParseError, Result, ValidateError};
pub use crate::types::{Seq, Uid};

#[cfg(test)]
mod mock_stream;
