use std::io::{self, Write};

const BYTES_PER_LINE: usize = 16;

/// Writes `data` as a classic hex dump, 16 bytes per line, with offsets
/// counted from `base`.
///
/// ```
/// let mut out = Vec::new();
/// fl_action::dump::dump(0, b"Hi!", &mut out).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     format!("00000000 48 69 21 {}Hi!\n", " ".repeat(13 * 3))
/// );
/// ```
pub fn dump(base: u32, data: &[u8], writer: &mut impl Write) -> io::Result<()> {
    for (index, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        let address = base.wrapping_add((index * BYTES_PER_LINE) as u32);
        write!(writer, "{:08X} ", address)?;
        for byte in chunk {
            write!(writer, "{:02X} ", byte)?;
        }
        for _ in chunk.len()..BYTES_PER_LINE {
            write!(writer, "   ")?;
        }
        let ascii: String = chunk
            .iter()
            .map(|byte| match byte {
                0x20..=0x7e => *byte as char,
                _ => '.',
            })
            .collect();
        writeln!(writer, "{}", ascii)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::dump;

    fn render(base: u32, data: &[u8]) -> String {
        let mut out = Vec::new();
        dump(base, data, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nothing_for_empty_input() {
        assert_eq!(render(0, &[]), "");
    }

    #[test]
    fn full_line() {
        let data: Vec<u8> = (0x41..0x51).collect();
        assert_eq!(
            render(0, &data),
            "00000000 41 42 43 44 45 46 47 48 49 4A 4B 4C 4D 4E 4F 50 ABCDEFGHIJKLMNOP\n"
        );
    }

    #[test]
    fn second_line_offset_and_padding() {
        let mut data = vec![0x00; 16];
        data.extend_from_slice(&[0x7e, 0x7f]);
        let text = render(0x100, &data);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000100 00 00"));
        assert!(lines[0].ends_with("................"));
        assert_eq!(lines[1], format!("00000110 7E 7F {}~.", " ".repeat(14 * 3)));
    }
}
