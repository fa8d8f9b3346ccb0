use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::result;

pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while issuing copy commands.
#[derive(Debug)]
pub enum Error {
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    Io(IoError),
    /// A NO response from the IMAP server, carrying its explanation text.
    No(String),
    /// A BAD response from the IMAP server, carrying its explanation text.
    Bad(String),
    /// The connection was terminated unexpectedly.
    ConnectionLost,
    /// Error parsing a server response.
    Parse(ParseError),
    /// Error validating input data.
    Validate(ValidateError),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => fmt::Display::fmt(e, f),
            Error::No(text) => write!(f, "NO response: {}", text),
            Error::Bad(text) => write!(f, "BAD response: {}", text),
            Error::ConnectionLost => f.write_str("connection lost"),
            Error::Parse(e) => fmt::Display::fmt(e, f),
            Error::Validate(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::Validate(e) => Some(e),
            _ => None,
        }
    }
}

/// An error parsing server-supplied protocol text.
#[derive(Debug)]
pub enum ParseError {
    /// A response line that could not be interpreted at all.
    Invalid(Vec<u8>),
    /// A sequence-set token that is empty, non-numeric, or zero.
    SequenceToken(String),
    /// A `a:b` sequence range with `a` greater than `b`.
    ReversedRange(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Invalid(data) => write!(
                f,
                "unable to parse server response: {}",
                String::from_utf8_lossy(data).trim_end()
            ),
            ParseError::SequenceToken(token) => {
                write!(f, "invalid sequence-set token {:?}", token)
            }
            ParseError::ReversedRange(token) => {
                write!(f, "reversed sequence range {:?}", token)
            }
        }
    }
}

impl StdError for ParseError {}

/// Invalid character found in a command argument.
#[derive(Debug)]
pub struct ValidateError(pub char);

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // print the character in debug form because invalid ones are often whitespaces
        write!(f, "invalid character in input: {:?}", self.0)
    }
}

impl StdError for ValidateError {}
