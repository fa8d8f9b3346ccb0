//! Identifier types used throughout the IMAP protocol.

/// From section [2.3.1.1 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
///
/// A 32-bit value assigned to each message. Unique identifiers are persistent,
/// mailbox-scoped, and assigned in a strictly ascending fashion; together with
/// the mailbox's `UIDVALIDITY` value they refer to the same message across
/// sessions. Unlike message sequence numbers, unique identifiers are not
/// necessarily contiguous.
pub type Uid = u32;

/// From section [2.3.1.2 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.2).
///
/// A relative position from 1 to the number of messages in the mailbox.
/// Sequence numbers can be reassigned during the session: when a message is
/// expunged, the sequence number of all subsequent messages is decremented.
/// They are only meaningful within the session that observed them.
pub type Seq = u32;
