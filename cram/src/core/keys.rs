//! Classification of raw input bytes.

/// Ctrl+C as delivered by a terminal in raw mode.
pub const INTERRUPT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Stop the session.
    Interrupt,
    /// Move to the next prompt (or acknowledge a pending group switch).
    Advance,
    Ignore,
}

/// Space, CR, LF and ASCII alphanumerics advance; Ctrl+C interrupts.
pub fn classify_key(byte: u8) -> KeyAction {
    match byte {
        INTERRUPT => KeyAction::Interrupt,
        b' ' | b'\r' | b'\n' => KeyAction::Advance,
        byte if byte.is_ascii_alphanumeric() => KeyAction::Advance,
        _ => KeyAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_keys() {
        for byte in [b' ', b'\r', b'\n', b'a', b'Z', b'0', b'9', b'q'] {
            assert_eq!(classify_key(byte), KeyAction::Advance, "byte {byte}");
        }
    }

    #[test]
    fn ignored_keys() {
        for byte in [b'.', b'-', b'\t', 0x1b, 0x7f, 0, 0xe9] {
            assert_eq!(classify_key(byte), KeyAction::Ignore, "byte {byte}");
        }
    }

    #[test]
    fn ctrl_c_interrupts() {
        assert_eq!(classify_key(INTERRUPT), KeyAction::Interrupt);
    }
}
