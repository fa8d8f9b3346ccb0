use std::io::{Read, Write};
use std::result;

use bufstream::BufStream;

use crate::copy::{CopyError, CopyOperation, Mode, UidMapping};
use crate::error::{Error, Result, ValidateError};
use crate::types::{Seq, Uid};

static TAG_PREFIX: &str = "a";
const INITIAL_TAG: u32 = 0;
const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

macro_rules! quote {
    ($x:expr) => {
        format!("\"{}\"", $x.replace('\\', "\\\\").replace('"', "\\\""))
    };
}

pub(crate) fn validate_str(value: &str) -> Result<String> {
    let quoted = quote!(value);
    if quoted.contains('\n') {
        return Err(Error::Validate(ValidateError('\n')));
    }
    if quoted.contains('\r') {
        return Err(Error::Validate(ValidateError('\r')));
    }
    Ok(quoted)
}

/// Stream to interface with the IMAP server. This interface is only for the
/// command stream; opening the connection, TLS, authentication, and selecting
/// the source mailbox are the surrounding session layer's business and are
/// assumed to have happened before any copy is issued.
#[derive(Debug)]
pub struct Client<T: Read + Write> {
    stream: BufStream<T>,
    tag: u32,
    /// Echo wire traffic as `C:`/`S:` lines to stdout.
    pub debug: bool,
}

impl<T: Read + Write> Client<T> {
    /// Creates a new client over an established transport.
    pub fn new(stream: T) -> Client<T> {
        Client {
            stream: BufStream::new(stream),
            tag: INITIAL_TAG,
            debug: false,
        }
    }

    /// Consume the server's greeting line.
    pub fn read_greeting(&mut self) -> Result<()> {
        let mut v = Vec::new();
        self.readline(&mut v).map(|_| ())
    }

    /// Copy the inclusive sequence-number range `start_seq:end_seq` to the
    /// end of the given mailbox.
    pub fn copy_range(&mut self, start_seq: Seq, end_seq: Seq, mailbox_name: &str) -> Result<()> {
        CopyOperation::sequence_range(start_seq, end_seq, mailbox_name)?
            .run(self)
            .map(|_| ())
            .map_err(|e| e.error)
    }

    /// Copy the messages with the given sequence numbers to the end of the
    /// given mailbox.
    ///
    /// `sequential` asserts that `seq_numbers` is already a contiguous
    /// ascending run, allowing a single `first:last` range to be emitted
    /// without compaction. The assertion is trusted, not verified; a caller
    /// that sets it wrongly copies the wrong messages.
    pub fn copy_sequence_numbers(
        &mut self,
        seq_numbers: &[Seq],
        sequential: bool,
        mailbox_name: &str,
    ) -> Result<()> {
        CopyOperation::sequence_numbers(seq_numbers, sequential, mailbox_name)?
            .run(self)
            .map(|_| ())
            .map_err(|e| e.error)
    }

    /// Copy the messages with the given UIDs to the end of the given mailbox.
    ///
    /// In [`Mode::Accurate`] the returned mapping holds, at index `i`, the
    /// destination UID assigned to `uids[i]`, resolved from the server's
    /// `COPYUID` confirmations; entries the server never confirmed stay
    /// `None`. In [`Mode::Fast`] no response line is parsed and the mapping
    /// is empty. `sequential` behaves as in
    /// [`copy_sequence_numbers`](Client::copy_sequence_numbers).
    ///
    /// An empty `uids` sends no command at all and succeeds with an empty
    /// mapping.
    pub fn uid_copy(
        &mut self,
        uids: &[Uid],
        sequential: bool,
        mailbox_name: &str,
        mode: Mode,
    ) -> result::Result<UidMapping, CopyError> {
        CopyOperation::uids(uids, sequential, mailbox_name, mode)
            .map_err(|error| CopyError {
                mapping: UidMapping::new(),
                error,
            })?
            .run(self)
    }

    /// Copy every message in the currently selected mailbox (`1:*`) to the
    /// end of the given mailbox.
    pub fn copy_all(&mut self, mailbox_name: &str) -> Result<()> {
        CopyOperation::whole_mailbox(mailbox_name)?
            .run(self)
            .map(|_| ())
            .map_err(|e| e.error)
    }

    /// Tag the command and put it on the wire.
    pub(crate) fn run_command(&mut self, untagged_command: &str) -> Result<()> {
        let command = self.create_command(untagged_command);
        self.write_line(command.as_bytes())
    }

    /// The tag of the most recently sent command.
    pub(crate) fn command_tag(&self) -> String {
        format!("{}{}", TAG_PREFIX, self.tag)
    }

    pub(crate) fn readline(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        use std::io::BufRead;
        let read = self.stream.read_until(LF, into)?;
        if read == 0 {
            return Err(Error::ConnectionLost);
        }

        if self.debug {
            // strip the CRLF; the echo adds its own newline
            let line = &into[into.len() - read..];
            println!("S: {}", String::from_utf8_lossy(line).trim_end());
        }

        Ok(read)
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        self.stream.get_ref()
    }

    fn create_command(&mut self, command: &str) -> String {
        self.tag += 1;
        format!("{}{} {}", TAG_PREFIX, self.tag, command)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        if self.debug {
            println!("C: {}", String::from_utf8_lossy(buf));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_stream::MockStream;

    fn client_with(response: &str) -> Client<MockStream> {
        Client::new(MockStream::new(response.as_bytes().to_vec()))
    }

    fn written(client: &Client<MockStream>) -> String {
        String::from_utf8_lossy(&client.stream.get_ref().written_buf).into_owned()
    }

    #[test]
    fn copy_range() {
        let mut client = client_with("a1 OK COPY completed\r\n");
        client.copy_range(2, 4, "MEETING").unwrap();
        assert_eq!(written(&client), "a1 COPY 2:4 \"MEETING\"\r\n");
    }

    #[test]
    fn copy_sequence_numbers_compacts() {
        let mut client = client_with("a1 OK COPY completed\r\n");
        client
            .copy_sequence_numbers(&[7, 32, 44, 45, 46, 47, 48, 49], false, "MEETING")
            .unwrap();
        assert_eq!(written(&client), "a1 COPY 7,32,44:49 \"MEETING\"\r\n");
    }

    #[test]
    fn copy_sequence_numbers_sequential_hint() {
        let mut client = client_with("a1 OK COPY completed\r\n");
        client
            .copy_sequence_numbers(&[10, 11, 12], true, "MEETING")
            .unwrap();
        assert_eq!(written(&client), "a1 COPY 10:12 \"MEETING\"\r\n");
    }

    #[test]
    fn copy_all() {
        let mut client = client_with("a1 OK COPY completed\r\n");
        client.copy_all("Archive").unwrap();
        assert_eq!(written(&client), "a1 COPY 1:* \"Archive\"\r\n");
    }

    #[test]
    fn uid_copy_fast() {
        let mut client = client_with("a1 OK COPY completed\r\n");
        let mapping = client
            .uid_copy(&[7, 32, 44, 45, 46, 47, 48, 49], false, "MEETING", Mode::Fast)
            .unwrap();
        assert_eq!(written(&client), "a1 UID COPY 7,32,44:49 \"MEETING\"\r\n");
        assert!(mapping.is_empty());
    }

    #[test]
    fn uid_copy_accurate_resolves_destinations() {
        let mut client = client_with(
            "* OK [COPYUID 1184051486 10031:10033 1024:1026] Copy completed.\r\n\
             a1 OK COPY completed\r\n",
        );
        let mapping = client
            .uid_copy(&[10031, 10032, 10033], true, "Archive", Mode::Accurate)
            .unwrap();
        assert_eq!(written(&client), "a1 UID COPY 10031:10033 \"Archive\"\r\n");
        assert_eq!(mapping, vec![Some(1024), Some(1025), Some(1026)]);
    }

    #[test]
    fn uid_copy_accurate_preserves_caller_order() {
        let mut client = client_with(
            "* OK [COPYUID 9 7,44,49 101:103] Copy completed.\r\n\
             a1 OK COPY completed\r\n",
        );
        let mapping = client
            .uid_copy(&[49, 7, 44], false, "Archive", Mode::Accurate)
            .unwrap();
        assert_eq!(written(&client), "a1 UID COPY 49,7,44 \"Archive\"\r\n");
        assert_eq!(mapping, vec![Some(103), Some(101), Some(102)]);
    }

    #[test]
    fn uid_copy_accurate_without_confirmation() {
        // the extension is optional; a missing confirmation degrades to an
        // all-unresolved mapping, not an error
        let mut client = client_with("* 3 EXISTS\r\na1 OK COPY completed\r\n");
        let mapping = client
            .uid_copy(&[10031, 10032], true, "Archive", Mode::Accurate)
            .unwrap();
        assert_eq!(mapping, vec![None, None]);
    }

    #[test]
    fn uid_copy_accurate_tolerates_malformed_confirmation() {
        let mut client = client_with(
            "* OK [COPYUID 1 10031:10033 500:501] done\r\n\
             a1 OK COPY completed\r\n",
        );
        let mapping = client
            .uid_copy(&[10031, 10032, 10033], true, "Archive", Mode::Accurate)
            .unwrap();
        assert_eq!(mapping, vec![None, None, None]);
    }

    #[test]
    fn uid_copy_fast_ignores_confirmations() {
        let mut client = client_with(
            "* OK [COPYUID 1184051486 10031 1024] done\r\n\
             a1 OK COPY completed\r\n",
        );
        let mapping = client
            .uid_copy(&[10031], true, "Archive", Mode::Fast)
            .unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn uid_copy_no_response() {
        let mut client = client_with("a1 NO [TRYCREATE] no such mailbox\r\n");
        let err = client
            .uid_copy(&[10031], true, "Nowhere", Mode::Accurate)
            .unwrap_err();
        assert!(matches!(err.error, Error::No(_)));
        assert_eq!(err.mapping, vec![None]);
    }

    #[test]
    fn uid_copy_empty_set_sends_nothing() {
        let mut client = client_with("");
        let mapping = client
            .uid_copy(&[], false, "Archive", Mode::Accurate)
            .unwrap();
        assert!(mapping.is_empty());
        assert!(written(&client).is_empty());
    }

    #[test]
    fn copy_sequence_numbers_splits_long_sets() {
        // enough singleton runs that the compacted set exceeds one command
        let seqs: Vec<u32> = (1..4500).step_by(2).collect();
        let mut client = client_with("a1 OK COPY completed\r\na2 OK COPY completed\r\n");
        client
            .copy_sequence_numbers(&seqs, false, "Archive")
            .unwrap();
        let sent = written(&client);
        assert!(sent.starts_with("a1 COPY 1,"));
        assert!(sent.contains("\r\na2 COPY "));
    }

    #[test]
    fn copy_connection_lost() {
        let mut client = Client::new(MockStream::eof());
        match client.copy_range(1, 2, "Archive") {
            Err(Error::ConnectionLost) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn copy_rejects_newline_in_mailbox() {
        let mut client = client_with("");
        match client.copy_range(1, 2, "bad\nname") {
            Err(Error::Validate(ValidateError('\n'))) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(written(&client).is_empty());
    }

    #[test]
    fn debug_echo_leaves_the_exchange_intact() {
        let mut client = client_with(
            "* OK [COPYUID 1184051486 10031:10033 1024:1026] Copy completed.\r\n\
             a1 OK COPY completed\r\n",
        );
        client.debug = true;
        let mapping = client
            .uid_copy(&[10031, 10032, 10033], true, "Archive", Mode::Accurate)
            .unwrap();
        assert_eq!(written(&client), "a1 UID COPY 10031:10033 \"Archive\"\r\n");
        assert_eq!(mapping, vec![Some(1024), Some(1025), Some(1026)]);
    }

    #[test]
    fn quote_escapes_specials() {
        assert_eq!("\"test\\\\text\"", quote!(r"test\text"));
        assert_eq!("\"test\\\"text\"", quote!("test\"text"));
    }
}
