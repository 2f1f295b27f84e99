/// Character-level helpers and the cursor used to walk an action string.
use crate::error::{ActionError, ErrorKind};

/// Returned by [`Scanner::peek`] once the cursor has reached the end of the input.
pub const END: u8 = b'\0';

pub fn is_hex_digit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}

/// Decodes a single hex digit into its 4-bit value.
pub fn hex_nibble(ch: u8) -> Result<u8, ErrorKind> {
    match ch {
        b'0'..=b'9' => Ok(ch - b'0'),
        b'a'..=b'f' => Ok(ch - b'a' + 10),
        b'A'..=b'F' => Ok(ch - b'A' + 10),
        _ => Err(ErrorKind::IllegalChar),
    }
}

/// A forward-only cursor over one action string.
///
/// The cursor is a byte offset and is never rewound, so it doubles as the
/// column reported in diagnostics.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(line: &'a str) -> Scanner<'a> {
        Scanner { line, pos: 0 }
    }

    pub fn line(&self) -> &'a str {
        self.line
    }

    /// The current byte offset from the start of the line.
    pub fn column(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// The byte under the cursor, or [`END`] past the last character.
    pub fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.line
            .as_bytes()
            .get(self.pos + offset)
            .copied()
            .unwrap_or(END)
    }

    pub fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    /// Consumes `ch` if it is under the cursor.
    pub fn eat(&mut self, ch: u8) -> bool {
        if !self.at_end() && self.peek() == ch {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Builds an error located at the cursor.
    pub fn error(&self, kind: ErrorKind) -> ActionError {
        ActionError::new(kind, self.pos)
    }

    /// Consumes two hex digits and combines them, upper nibble first.
    /// The cursor does not move on failure.
    pub fn hex_byte(&mut self) -> Result<u8, ActionError> {
        let upper = hex_nibble(self.peek()).map_err(|_| self.error(ErrorKind::BadHex))?;
        let lower = hex_nibble(self.peek_at(1)).map_err(|_| self.error(ErrorKind::BadHex))?;
        self.pos += 2;
        Ok((upper << 4) | lower)
    }

    /// Parses the longest run of hex digits as an unsigned number.
    ///
    /// An empty run, or one that does not fit into 32 bits, is a
    /// [`ErrorKind::BadHex`] reported at the first digit.
    pub fn unsigned_hex(&mut self) -> Result<u32, ActionError> {
        let digits = self.hex_run_len();
        if digits == 0 {
            return Err(self.error(ErrorKind::BadHex));
        }
        let text = &self.line[self.pos..self.pos + digits];
        let value = u32::from_str_radix(text, 16).map_err(|_| self.error(ErrorKind::BadHex))?;
        self.pos += digits;
        Ok(value)
    }

    /// Parses the longest run of hex digits as a number no larger than `max`.
    ///
    /// Any value above `max`, including one too long for 32 bits, is `kind`
    /// reported just past the digits. An empty run is [`ErrorKind::BadHex`].
    pub fn bounded_hex(&mut self, max: u32, kind: ErrorKind) -> Result<u32, ActionError> {
        let digits = self.hex_run_len();
        if digits == 0 {
            return Err(self.error(ErrorKind::BadHex));
        }
        let text = &self.line[self.pos..self.pos + digits];
        self.pos += digits;
        match u32::from_str_radix(text, 16) {
            Ok(value) if value <= max => Ok(value),
            _ => Err(self.error(kind)),
        }
    }

    /// Number of consecutive hex digits starting at the cursor.
    pub fn hex_run_len(&self) -> usize {
        self.line.as_bytes()[self.pos.min(self.line.len())..]
            .iter()
            .take_while(|ch| is_hex_digit(**ch))
            .count()
    }

    /// Decodes a run of hex digit pairs into bytes.
    ///
    /// An odd number of digits is reported at the start of the run without
    /// consuming anything.
    pub fn hex_bytes(&mut self) -> Result<Vec<u8>, ActionError> {
        let digits = self.hex_run_len();
        if digits % 2 != 0 {
            return Err(self.error(ErrorKind::OddDigits));
        }
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(digits / 2)
            .map_err(|_| self.error(ErrorKind::NoMemory))?;
        for _ in 0..digits / 2 {
            bytes.push(self.hex_byte()?);
        }
        Ok(bytes)
    }

    /// Parses a file name enclosed in matching `"` or `'` quotes, the
    /// cursor standing on the opening quote.
    ///
    /// Returns the column of the first character of the name along with the
    /// name itself; the cursor is left just past the closing quote.
    pub fn quoted(&mut self) -> Result<(usize, &'a str), ActionError> {
        let quote = self.peek();
        if quote != b'"' && quote != b'\'' {
            return Err(self.error(ErrorKind::IllegalChar));
        }
        self.pos += 1;
        let start = self.pos;
        let len = self.line.as_bytes()[start..]
            .iter()
            .position(|ch| *ch == quote)
            .ok_or_else(|| self.error(ErrorKind::UnterminatedString))?;
        if len == 0 {
            return Err(self.error(ErrorKind::EmptyString));
        }
        self.pos = start + len + 1;
        Ok((start, &self.line[start..start + len]))
    }
}
