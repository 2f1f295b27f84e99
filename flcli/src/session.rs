use std::{
    error::Error,
    fmt::Display,
    io::{self, BufRead, ErrorKind as IoErrorKind, Write},
};

use fl_action::{
    Config, Interpreter,
    error::{ActionError, DeviceError, ErrorKind},
};

use crate::{backends::Device, signal};

/// Errors that end a session.
#[derive(Debug)]
pub enum SessionError {
    /// An action string failed. Its diagnostic has already been printed.
    Action(ActionError),
    /// The device cannot do what was asked of it.
    Arguments(String),
    Device(DeviceError),
    Io(io::Error),
}

impl SessionError {
    /// Process exit code for this error.
    pub fn code(&self) -> u8 {
        match self {
            SessionError::Action(error) => error.code(),
            SessionError::Arguments(_) => ErrorKind::BadArguments.code(),
            SessionError::Device(_) | SessionError::Io(_) => ErrorKind::LibraryError.code(),
        }
    }
}

impl From<DeviceError> for SessionError {
    fn from(value: DeviceError) -> Self {
        SessionError::Device(value)
    }
}

impl From<io::Error> for SessionError {
    fn from(value: io::Error) -> Self {
        SessionError::Io(value)
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Action(error) => write!(f, "{}", error),
            SessionError::Arguments(message) => write!(f, "{}", message),
            SessionError::Device(error) => write!(f, "{}", error),
            SessionError::Io(error) => write!(f, "{}", error),
        }
    }
}

impl Error for SessionError {}

/// An open device together with the interpreter that drives it.
pub struct Session<D: Device> {
    interpreter: Interpreter<D>,
    name: String,
}

impl<D: Device> Session<D> {
    pub fn new(device: D, name: impl Into<String>, config: Config) -> Session<D> {
        Session {
            interpreter: Interpreter::new(device, config),
            name: name.into(),
        }
    }

    pub fn device(&self) -> &D {
        self.interpreter.device()
    }

    /// Executes a single action string.
    pub fn batch(
        &mut self,
        line: &str,
        fifo_mode: u8,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<(), SessionError> {
        writeln!(
            out,
            "Executing CommFPGA actions on FPGALink device {}...",
            self.name
        )?;
        self.prepare("Action", fifo_mode)?;
        self.interpreter
            .run(line, out, err)
            .map_err(SessionError::Action)
    }

    /// Reads action strings from `input` until EOF, a line starting with `q`
    /// or an interrupt. The first failing action string ends the session.
    pub fn interactive(
        &mut self,
        fifo_mode: u8,
        input: &mut impl BufRead,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<(), SessionError> {
        writeln!(out, "\nEntering CommFPGA command-line mode:")?;
        self.prepare("CLI", fifo_mode)?;

        let mut line = Vec::new();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            if !read_line(input, &mut line, signal::interrupted)? {
                writeln!(out)?;
                break;
            }
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\n', '\r']);
            if text.is_empty() {
                continue;
            }
            if text.starts_with('q') {
                break;
            }
            log::debug!("Interactive action: {}", text);
            self.interpreter
                .run(text, out, err)
                .map_err(SessionError::Action)?;
        }
        Ok(())
    }

    /// Checks that the device can talk CommFPGA and selects the initial conduit.
    fn prepare(&mut self, requested: &str, fifo_mode: u8) -> Result<(), SessionError> {
        if !self.interpreter.device().is_comm_capable() {
            return Err(SessionError::Arguments(format!(
                "{} requested but device at {} does not support CommFPGA",
                requested, self.name
            )));
        }
        log::debug!("Selecting initial conduit {}", fifo_mode);
        self.interpreter.device_mut().set_conduit(fifo_mode)?;
        if !self.interpreter.device_mut().is_running()? {
            return Err(SessionError::Arguments(format!(
                "The FPGALink device at {} is not ready to talk - did you forget --program?",
                self.name
            )));
        }
        Ok(())
    }
}

/// Reads one line into `line`. Returns `false` on EOF, or once `interrupted`
/// reports an interrupt while waiting for input.
fn read_line(
    input: &mut impl BufRead,
    line: &mut Vec<u8>,
    interrupted: impl Fn() -> bool,
) -> io::Result<bool> {
    line.clear();
    loop {
        if interrupted() {
            return Ok(false);
        }
        let available = match input.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(!line.is_empty());
        }
        match available.iter().position(|ch| *ch == b'\n') {
            Some(end) => {
                line.extend_from_slice(&available[..=end]);
                input.consume(end + 1);
                return Ok(true);
            }
            None => {
                let len = available.len();
                line.extend_from_slice(available);
                input.consume(len);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{io::Cursor, time::Duration};

    use fl_action::Channels;

    use super::*;
    use crate::backends::loopback::Loopback;

    fn session() -> Session<Loopback> {
        Session::new(Loopback::new(), "loopback", Config::default())
    }

    fn interactive(
        session: &mut Session<Loopback>,
        input: &str,
    ) -> (Result<(), SessionError>, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut input = Cursor::new(input.as_bytes());
        let result = session.interactive(1, &mut input, &mut out, &mut err);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn batch_selects_conduit_and_runs() {
        let mut session = session();
        let mut out = Vec::new();
        session
            .batch("w0 4869;r0 2", 0x01, &mut out, &mut io::sink())
            .unwrap();
        assert_eq!(session.device().conduit(), Some(0x01));
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Executing CommFPGA actions on FPGALink device loopback...\n"));
        assert!(out.ends_with("Hi\n"));
    }

    #[test]
    fn batch_failure_carries_exit_code() {
        let mut session = session();
        let mut err = Vec::new();
        let error = session
            .batch("r80", 0x01, &mut io::sink(), &mut err)
            .unwrap_err();
        assert_eq!(error.code(), 3);
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Channel out of range at column 3\n  r80\n     ^\n"
        );
    }

    #[test]
    fn interactive_runs_lines_until_quit() {
        let mut session = session();
        let (result, out, err) = interactive(&mut session, "w1 41\n\nr1\nq\nw1 42\n");
        result.unwrap();
        assert_eq!(err, "");
        assert_eq!(out.matches("> ").count(), 4);
        assert!(out.contains("00000000 41 "));
        // The line after `q` is never executed
        assert_eq!(session.device().queued(1), 0);
    }

    #[test]
    fn interactive_stops_at_eof() {
        let mut session = session();
        let (result, _, _) = interactive(&mut session, "w2 0102\r\nw2 03");
        result.unwrap();
        assert_eq!(session.device().queued(2), 3);
    }

    #[test]
    fn interactive_error_ends_session() {
        let mut session = session();
        let (result, _, err) = interactive(&mut session, "+100\nw0 00\n");
        assert_eq!(result.unwrap_err().code(), 4);
        assert!(err.starts_with("Conduit out of range at column 4\n"));
        assert_eq!(session.device().queued(0), 0);
    }

    #[test]
    fn read_line_splits_on_newline() {
        let mut input = Cursor::new(b"w0 01\nr0".as_slice());
        let mut line = Vec::new();
        assert!(read_line(&mut input, &mut line, || false).unwrap());
        assert_eq!(line, b"w0 01\n");
        assert!(read_line(&mut input, &mut line, || false).unwrap());
        assert_eq!(line, b"r0");
        assert!(!read_line(&mut input, &mut line, || false).unwrap());
    }

    #[test]
    fn read_line_stops_when_interrupted() {
        let mut input = Cursor::new(b"w0 01\n".as_slice());
        let mut line = b"stale".to_vec();
        assert!(!read_line(&mut input, &mut line, || true).unwrap());
        assert!(line.is_empty());
        // Pending input is left unread
        assert_eq!(input.position(), 0);
    }

    struct Halted;

    impl Channels for Halted {
        fn read_channel(&mut self, _: Duration, _: u8, _: &mut [u8]) -> Result<(), DeviceError> {
            Ok(())
        }

        fn write_channel(&mut self, _: Duration, _: u8, _: &[u8]) -> Result<(), DeviceError> {
            Ok(())
        }

        fn set_conduit(&mut self, _: u8) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    impl Device for Halted {
        fn is_comm_capable(&self) -> bool {
            true
        }

        fn is_running(&mut self) -> Result<bool, DeviceError> {
            Ok(false)
        }
    }

    #[test]
    fn refuses_device_that_is_not_running() {
        let mut session = Session::new(Halted, "halted", Config::default());
        let error = session
            .batch("r0", 0x01, &mut io::sink(), &mut io::sink())
            .unwrap_err();
        assert_eq!(error.code(), 12);
        assert_eq!(
            error.to_string(),
            "The FPGALink device at halted is not ready to talk - did you forget --program?"
        );
    }
}
