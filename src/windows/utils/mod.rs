//! Small conversion helpers for Win32 string data

/// Converts a UTF-16 slice (without terminator) to a String, lossily
pub fn wide_to_string(wide: &[u16]) -> String {
    String::from_utf16_lossy(wide)
}

/// Converts a NUL-terminated UTF-16 buffer to a String, stopping at the
/// first terminator
pub fn wide_buffer_to_string(buffer: &[u16]) -> String {
    let terminator = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    wide_to_string(&buffer[..terminator])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_plain_text() {
        let wide: Vec<u16> = "kernel32.dll".encode_utf16().collect();
        assert_eq!(wide_to_string(&wide), "kernel32.dll");
    }

    #[test]
    fn buffer_stops_at_terminator() {
        let mut wide: Vec<u16> = "abc".encode_utf16().collect();
        wide.push(0);
        wide.extend("junk".encode_utf16());
        assert_eq!(wide_buffer_to_string(&wide), "abc");
    }

    #[test]
    fn empty_input() {
        assert_eq!(wide_to_string(&[]), "");
        assert_eq!(wide_buffer_to_string(&[0]), "");
    }
}
