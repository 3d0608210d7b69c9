use std::io::{self, stdin, IsTerminal, Read as _};

use console::Term;

use crate::settings::KeyMod;

/// Key identity, independent of modifiers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    /// Letters are normalized to lowercase; shift is reported separately.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Unknown,
}

/// A key press with its two logical modifier flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    /// The configurable "keyMod" modifier (ctrl or alt, per settings).
    pub kmod: bool,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            shift: false,
            kmod: false,
        }
    }

    pub fn shifted(key: Key) -> Self {
        Self {
            key,
            shift: true,
            kmod: false,
        }
    }

    pub fn modded(key: Key) -> Self {
        Self {
            key,
            shift: false,
            kmod: true,
        }
    }

    /// Decode a plain character: uppercase letters report shift, control
    /// characters report keyMod plus the underlying letter.
    fn from_char(ch: char) -> Self {
        if ch.is_ascii_uppercase() {
            return Self::shifted(Key::Char(ch.to_ascii_lowercase()));
        }
        if let Some(letter) = control_letter(ch) {
            return Self::modded(Key::Char(letter));
        }
        Self::plain(Key::Char(ch))
    }

    fn from_console(key: console::Key) -> Self {
        use console::Key as CKey;
        match key {
            CKey::Char(ch) => Self::from_char(ch),
            CKey::Enter => Self::plain(Key::Enter),
            CKey::Escape => Self::plain(Key::Escape),
            CKey::Backspace => Self::plain(Key::Backspace),
            CKey::Tab => Self::plain(Key::Tab),
            CKey::ArrowLeft => Self::plain(Key::Left),
            CKey::ArrowRight => Self::plain(Key::Right),
            CKey::ArrowUp => Self::plain(Key::Up),
            CKey::ArrowDown => Self::plain(Key::Down),
            CKey::PageUp => Self::plain(Key::PageUp),
            CKey::PageDown => Self::plain(Key::PageDown),
            _ => Self::plain(Key::Unknown),
        }
    }
}

/// Maps a control character (ctrl+letter) back to its letter.
fn control_letter(ch: char) -> Option<char> {
    let code = ch as u32;
    // Leave tab, newline and carriage return to their own key identities.
    if (0x01..=0x1A).contains(&code) && !matches!(code, 0x09 | 0x0A | 0x0D) {
        return char::from_u32(code - 1 + 'a' as u32);
    }
    None
}

/// Blocking source of key events.
///
/// A terminal is read one key at a time; piped input is decoded byte-wise so
/// the program stays scriptable in blackbox tests.
pub enum KeySource {
    Terminal(Term),
    Piped { stdin: io::Stdin, key_mod: KeyMod },
}

impl KeySource {
    pub fn open(key_mod: KeyMod) -> Self {
        if stdin().is_terminal() {
            Self::Terminal(Term::stdout())
        } else {
            Self::Piped {
                stdin: stdin(),
                key_mod,
            }
        }
    }

    /// Blocks until the next key. `None` indicates EOF (piped input only).
    pub fn read(&mut self) -> io::Result<Option<KeyEvent>> {
        match self {
            Self::Terminal(term) => {
                let key = term.read_key()?;
                Ok(Some(KeyEvent::from_console(key)))
            }
            Self::Piped { stdin, key_mod } => {
                let Some(byte) = read_byte(stdin)? else {
                    return Ok(None);
                };
                Ok(Some(decode_byte(stdin, byte, *key_mod)?))
            }
        }
    }
}

fn read_byte(stdin: &mut io::Stdin) -> io::Result<Option<u8>> {
    let mut buf = [0; 1];
    let bytes_read = stdin.read(&mut buf)?;
    if bytes_read == 0 {
        return Ok(None);
    }
    Ok(Some(buf[0]))
}

fn decode_byte(stdin: &mut io::Stdin, byte: u8, key_mod: KeyMod) -> io::Result<KeyEvent> {
    let event = match byte {
        b'\n' | b'\r' => KeyEvent::plain(Key::Enter),
        b'\t' => KeyEvent::plain(Key::Tab),
        0x08 | 0x7F => KeyEvent::plain(Key::Backspace),
        0x1B => {
            // With the alt binding, ESC acts as a prefix for the next byte.
            if key_mod == KeyMod::Alt {
                match read_byte(stdin)? {
                    Some(next) if next.is_ascii_alphanumeric() => KeyEvent::modded(Key::Char(
                        (next as char).to_ascii_lowercase(),
                    )),
                    _ => KeyEvent::plain(Key::Escape),
                }
            } else {
                KeyEvent::plain(Key::Escape)
            }
        }
        _ => KeyEvent::from_char(byte as char),
    };
    Ok(event)
}
