use std::{error, fmt, io, result};

/// A type alias for `Result<T, lineseeker::Error>`.
///
/// This result type embeds the error type in this crate.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when navigating lines.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// A crate private constructor for `Error`.
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Returns the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwraps this error into its undelying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

/// The specific type of an error.
///
/// Reaching the end of the stream is not an error: operations that can run out of bytes return
/// `Ok(None)` instead.
///
/// This list might grow over time and it is not recommended to
/// exhaustively match against it.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Represents an I/O error.
    ///
    /// Can occur when seeking or reading the underlying byte stream.
    Io(io::Error),
    /// The cursor is not resting on a `\r` or `\n` byte, although the operation requires it to be.
    NotOnEol,
    /// The given combination of record options is not supported.
    ///
    /// Reading records backwards with both `expected_fields` and a non-zero `max_len` falls
    /// into this category.
    UnsupportedOptions,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::NotOnEol => write!(f, "The cursor is not on an end-of-line sequence"),
            ErrorKind::UnsupportedOptions => write!(
                f,
                "`expected_fields` cannot be combined with a non-zero `max_len` when reading backwards"
            ),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err.into_kind() {
            ErrorKind::Io(err) => err,
            kind => io::Error::new(io::ErrorKind::Other, Error::new(kind)),
        }
    }
}
