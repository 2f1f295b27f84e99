use std::{
    error::Error,
    fmt::Display,
    io::{self, Write},
};

/// The kind of failure that ended an action string.
///
/// The discriminants are the process exit codes of the command-line tool
/// and must stay stable. `0` is success and has no variant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    LibraryError = 1,
    BadHex = 2,
    ChannelOutOfRange = 3,
    ConduitOutOfRange = 4,
    IllegalChar = 5,
    UnterminatedString = 6,
    NoMemory = 7,
    EmptyString = 8,
    OddDigits = 9,
    CannotLoad = 10,
    CannotSave = 11,
    BadArguments = 12,
}

impl ErrorKind {
    /// Numeric result of a failed invocation.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable message used in diagnostics.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::LibraryError => "Library error",
            ErrorKind::BadHex => "Unparseable hex number",
            ErrorKind::ChannelOutOfRange => "Channel out of range",
            ErrorKind::ConduitOutOfRange => "Conduit out of range",
            ErrorKind::IllegalChar => "Illegal character",
            ErrorKind::UnterminatedString => "Unterminated string",
            ErrorKind::NoMemory => "No memory",
            ErrorKind::EmptyString => "Empty string",
            ErrorKind::OddDigits => "Odd number of digits",
            ErrorKind::CannotLoad => "Cannot load file",
            ErrorKind::CannotSave => "Cannot save file",
            ErrorKind::BadArguments => "Bad arguments",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Errors reported by a device while transferring channel data.
#[derive(Debug)]
pub enum DeviceError {
    /// The operation did not complete before the timeout expired.
    Timeout { channel: u8 },
    IoError(io::Error),
    Other(String),
}

impl From<io::Error> for DeviceError {
    fn from(value: io::Error) -> Self {
        DeviceError::IoError(value)
    }
}

impl Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::Timeout { channel } => {
                write!(f, "Timed out while transferring on channel {}", channel)
            }
            DeviceError::IoError(error) => write!(f, "{}", error),
            DeviceError::Other(message) => write!(f, "{}", message),
        }
    }
}

impl Error for DeviceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DeviceError::IoError(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Cause {
    Device(DeviceError),
    Io(io::Error),
}

/// The first error encountered while parsing or executing an action string.
///
/// `column` is the byte offset into the action string where the cursor
/// stood when the error was detected.
#[derive(Debug)]
pub struct ActionError {
    kind: ErrorKind,
    column: usize,
    cause: Option<Cause>,
}

impl ActionError {
    pub fn new(kind: ErrorKind, column: usize) -> ActionError {
        ActionError {
            kind,
            column,
            cause: None,
        }
    }

    pub(crate) fn device(error: DeviceError, column: usize) -> ActionError {
        ActionError {
            kind: ErrorKind::LibraryError,
            column,
            cause: Some(Cause::Device(error)),
        }
    }

    pub(crate) fn io(kind: ErrorKind, error: io::Error, column: usize) -> ActionError {
        ActionError {
            kind,
            column,
            cause: Some(Cause::Io(error)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Exit code of the invocation that produced this error.
    pub fn code(&self) -> u8 {
        self.kind.code()
    }

    /// The device error behind a [`ErrorKind::LibraryError`], if any.
    pub fn device_error(&self) -> Option<&DeviceError> {
        match &self.cause {
            Some(Cause::Device(error)) => Some(error),
            _ => None,
        }
    }

    /// Writes the user-facing diagnostic for this error.
    ///
    /// Device errors are reported verbatim on a single line. Every other
    /// kind prints the message, the offending action string and a caret
    /// under the column where parsing stopped:
    ///
    /// ```text
    /// Channel out of range at column 3
    ///   r80 4
    ///      ^
    /// ```
    pub fn report(&self, line: &str, writer: &mut impl Write) -> io::Result<()> {
        if let Some(Cause::Device(error)) = &self.cause {
            return writeln!(writer, "{}", error);
        }
        writeln!(
            writer,
            "{} at column {}\n  {}",
            self.kind.message(),
            self.column,
            line
        )?;
        writeln!(writer, "  {:>width$}", "^", width = self.column + 1)
    }
}

impl Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(Cause::Device(error)) => write!(f, "{}", error),
            Some(Cause::Io(error)) => write!(
                f,
                "{} at column {}: {}",
                self.kind.message(),
                self.column,
                error
            ),
            None => write!(f, "{} at column {}", self.kind.message(), self.column),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(Cause::Device(error)) => Some(error),
            Some(Cause::Io(error)) => Some(error),
            None => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(error: &ActionError, line: &str) -> String {
        let mut out = Vec::new();
        error.report(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorKind::LibraryError.code(), 1);
        assert_eq!(ErrorKind::ConduitOutOfRange.code(), 4);
        assert_eq!(ErrorKind::IllegalChar.code(), 5);
        assert_eq!(ErrorKind::OddDigits.code(), 9);
        assert_eq!(ErrorKind::BadArguments.code(), 12);
    }

    #[test]
    fn caret_points_at_column() {
        let error = ActionError::new(ErrorKind::ChannelOutOfRange, 3);
        assert_eq!(
            render(&error, "r80 4"),
            "Channel out of range at column 3\n  r80 4\n     ^\n"
        );
    }

    #[test]
    fn caret_at_column_zero() {
        let error = ActionError::new(ErrorKind::IllegalChar, 0);
        assert_eq!(render(&error, "x"), "Illegal character at column 0\n  x\n  ^\n");
    }

    #[test]
    fn device_errors_are_reported_verbatim() {
        let error = ActionError::device(DeviceError::Other("USB stall".to_string()), 4);
        assert_eq!(error.kind(), ErrorKind::LibraryError);
        assert_eq!(render(&error, "r0 4"), "USB stall\n");
    }
}
