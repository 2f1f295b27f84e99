use std::{fs, path::PathBuf};

use crate::{
    error::{ActionError, ErrorKind},
    scanner::{END, Scanner, is_hex_digit},
};

/// A single command of an action string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Reads `length` bytes from `channel`. Without a destination, the bytes
    /// are collected and dumped once the whole action string succeeded.
    Read {
        channel: u8,
        length: u32,
        destination: Option<PathBuf>,
    },
    /// Writes `data` to `channel`. The data is either a literal hex byte run
    /// or the contents of a file, loaded while parsing.
    Write { channel: u8, data: Vec<u8> },
    /// Selects the active conduit (FIFO mode) of the device.
    SetConduit { conduit: u8 },
}

impl Command {
    pub const MAX_CHANNEL: u32 = 0x7f;
    pub const MAX_CONDUIT: u32 = 0xff;

    /// Parses exactly one command starting at the cursor.
    ///
    /// On success the cursor stands on the first character after the command,
    /// which the caller still has to validate.
    pub fn parse(scanner: &mut Scanner) -> Result<Command, ActionError> {
        match scanner.peek() {
            b'r' => {
                scanner.bump();
                Self::parse_read(scanner)
            }
            b'w' => {
                scanner.bump();
                Self::parse_write(scanner)
            }
            b'+' => {
                scanner.bump();
                Self::parse_set_conduit(scanner)
            }
            _ => Err(scanner.error(ErrorKind::IllegalChar)),
        }
    }

    // r<chan>[ <length>[ "<file>"]]
    fn parse_read(scanner: &mut Scanner) -> Result<Command, ActionError> {
        let channel = channel(scanner)?;
        clause_end(scanner)?;

        let mut length = 1;
        let mut destination = None;
        if scanner.eat(b' ') {
            length = scanner.unsigned_hex()?;
            clause_end(scanner)?;
            if scanner.eat(b' ') {
                let (_, name) = scanner.quoted()?;
                destination = Some(PathBuf::from(name));
            }
        }
        Ok(Command::Read {
            channel,
            length,
            destination,
        })
    }

    // w<chan>[ "<file>" | <hex bytes>]
    fn parse_write(scanner: &mut Scanner) -> Result<Command, ActionError> {
        let channel = channel(scanner)?;
        clause_end(scanner)?;

        let data = if scanner.eat(b' ') {
            match scanner.peek() {
                b'"' | b'\'' => {
                    let (column, name) = scanner.quoted()?;
                    fs::read(name).map_err(|e| ActionError::io(ErrorKind::CannotLoad, e, column))?
                }
                ch if is_hex_digit(ch) => scanner.hex_bytes()?,
                _ => return Err(scanner.error(ErrorKind::IllegalChar)),
            }
        } else {
            vec![0x00]
        };
        Ok(Command::Write { channel, data })
    }

    // +<conduit>
    fn parse_set_conduit(scanner: &mut Scanner) -> Result<Command, ActionError> {
        let conduit = scanner.bounded_hex(Self::MAX_CONDUIT, ErrorKind::ConduitOutOfRange)?;
        if !matches!(scanner.peek(), END | b';') {
            return Err(scanner.error(ErrorKind::IllegalChar));
        }
        Ok(Command::SetConduit {
            conduit: conduit as u8,
        })
    }
}

fn channel(scanner: &mut Scanner) -> Result<u8, ActionError> {
    let channel = scanner.bounded_hex(Command::MAX_CHANNEL, ErrorKind::ChannelOutOfRange)?;
    Ok(channel as u8)
}

/// Only the end of the line, `;` or a single space may follow a number.
fn clause_end(scanner: &Scanner) -> Result<(), ActionError> {
    match scanner.peek() {
        END | b';' | b' ' => Ok(()),
        _ => Err(scanner.error(ErrorKind::IllegalChar)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn parse(line: &str) -> Result<Command, ActionError> {
        Command::parse(&mut Scanner::new(line))
    }

    fn parse_err(line: &str) -> (ErrorKind, usize) {
        let error = parse(line).unwrap_err();
        (error.kind(), error.column())
    }

    #[test]
    fn read_defaults_to_one_byte() {
        assert_eq!(
            parse("r0").unwrap(),
            Command::Read {
                channel: 0,
                length: 1,
                destination: None
            }
        );
    }

    #[test]
    fn read_with_length_and_file() {
        assert_eq!(
            parse("r7f 10 \"out.bin\"").unwrap(),
            Command::Read {
                channel: 0x7f,
                length: 0x10,
                destination: Some(PathBuf::from("out.bin"))
            }
        );
        assert_eq!(
            parse("r1 2 'o.bin'").unwrap(),
            Command::Read {
                channel: 1,
                length: 2,
                destination: Some(PathBuf::from("o.bin"))
            }
        );
    }

    #[test]
    fn read_leaves_cursor_after_command() {
        let mut scanner = Scanner::new("r1 4;w2");
        Command::parse(&mut scanner).unwrap();
        assert_eq!(scanner.column(), 4);
        assert_eq!(scanner.peek(), b';');
    }

    #[test]
    fn channel_out_of_range_points_past_digits() {
        assert_eq!(parse_err("r80 4"), (ErrorKind::ChannelOutOfRange, 3));
        assert_eq!(parse_err("w100 00"), (ErrorKind::ChannelOutOfRange, 4));
        assert_eq!(parse_err("r100000000"), (ErrorKind::ChannelOutOfRange, 10));
        assert_eq!(parse_err("+100000000"), (ErrorKind::ConduitOutOfRange, 10));
    }

    #[test]
    fn missing_channel() {
        assert_eq!(parse_err("r"), (ErrorKind::BadHex, 1));
        assert_eq!(parse_err("w;"), (ErrorKind::BadHex, 1));
    }

    #[test]
    fn illegal_character_after_number() {
        assert_eq!(parse_err("r1x"), (ErrorKind::IllegalChar, 2));
        assert_eq!(parse_err("r1 4x"), (ErrorKind::IllegalChar, 4));
        assert_eq!(parse_err("r1 4 x"), (ErrorKind::IllegalChar, 5));
        assert_eq!(parse_err("w1 x"), (ErrorKind::IllegalChar, 3));
    }

    #[test]
    fn missing_length() {
        assert_eq!(parse_err("r1 "), (ErrorKind::BadHex, 3));
    }

    #[test]
    fn unterminated_and_empty_names() {
        assert_eq!(parse_err("r1 4 \"out.bin"), (ErrorKind::UnterminatedString, 6));
        assert_eq!(parse_err("r1 4 ''"), (ErrorKind::EmptyString, 6));
        assert_eq!(parse_err("w1 \"x"), (ErrorKind::UnterminatedString, 4));
    }

    #[test]
    fn write_hex_bytes() {
        assert_eq!(
            parse("w0 1a2b").unwrap(),
            Command::Write {
                channel: 0,
                data: vec![0x1a, 0x2b]
            }
        );
        assert_eq!(parse_err("w0 1a2"), (ErrorKind::OddDigits, 3));
    }

    #[test]
    fn write_without_data_sends_a_zero_byte() {
        assert_eq!(
            parse("w5").unwrap(),
            Command::Write {
                channel: 5,
                data: vec![0x00]
            }
        );
    }

    #[test]
    fn write_loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
        let line = format!("w3 '{}'", file.path().display());
        assert_eq!(
            parse(&line).unwrap(),
            Command::Write {
                channel: 3,
                data: vec![0xde, 0xad, 0xbe, 0xef]
            }
        );
    }

    #[test]
    fn write_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let line = format!("w3 \"{}\"", dir.path().join("missing.bin").display());
        assert_eq!(parse_err(&line), (ErrorKind::CannotLoad, 4));
    }

    #[test]
    fn set_conduit() {
        assert_eq!(parse("+ff").unwrap(), Command::SetConduit { conduit: 0xff });
        assert_eq!(parse_err("+100"), (ErrorKind::ConduitOutOfRange, 4));
        assert_eq!(parse_err("+1 "), (ErrorKind::IllegalChar, 2));
        assert_eq!(parse_err("+"), (ErrorKind::BadHex, 1));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse_err("x"), (ErrorKind::IllegalChar, 0));
        assert_eq!(parse_err(""), (ErrorKind::IllegalChar, 0));
    }
}
