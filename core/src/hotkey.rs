//! Hotkey and selection-key matching.
//!
//! A [`HotkeyEntry`] is an OR of at most [`HOT_KEY_COUNT`] chords, written in
//! configuration as whitespace separated chord strings such as
//! `"CTRL_SPACE L_CTRL"`. A chord string is any number of `CTRL_`, `SHIFT_`,
//! `ALT_` or `SUPER_` prefixes followed by a key name or a single printable
//! character.
//!
//! Matching is pure: nothing here touches input state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::HotkeyParseError;
use crate::keys::{KeySym, Modifiers};
use crate::HOT_KEY_COUNT;

const KEY_NAMES: &[(&str, KeySym)] = &[
    ("SPACE", KeySym::SPACE),
    ("TAB", KeySym::TAB),
    ("ENTER", KeySym::RETURN),
    ("RETURN", KeySym::RETURN),
    ("ESCAPE", KeySym::ESCAPE),
    ("BACKSPACE", KeySym::BACKSPACE),
    ("DELETE", KeySym::DELETE),
    ("HOME", KeySym::HOME),
    ("END", KeySym::END),
    ("PGUP", KeySym::PAGE_UP),
    ("PGDN", KeySym::PAGE_DOWN),
    ("LEFT", KeySym::LEFT),
    ("RIGHT", KeySym::RIGHT),
    ("UP", KeySym::UP),
    ("DOWN", KeySym::DOWN),
    ("L_SHIFT", KeySym::SHIFT_L),
    ("R_SHIFT", KeySym::SHIFT_R),
    ("L_CTRL", KeySym::CONTROL_L),
    ("R_CTRL", KeySym::CONTROL_R),
    ("L_ALT", KeySym::ALT_L),
    ("R_ALT", KeySym::ALT_R),
    ("L_SUPER", KeySym::SUPER_L),
    ("R_SUPER", KeySym::SUPER_R),
    ("PERIOD", KeySym(b'.' as u32)),
    ("COMMA", KeySym(b',' as u32)),
    ("SEMICOLON", KeySym(b';' as u32)),
    ("QUOTE", KeySym(b'\'' as u32)),
    ("MINUS", KeySym(b'-' as u32)),
    ("EQUAL", KeySym(b'=' as u32)),
];

const MODIFIER_PREFIXES: &[(&str, Modifiers)] = &[
    ("CTRL_", Modifiers::CTRL),
    ("SHIFT_", Modifiers::SHIFT),
    ("ALT_", Modifiers::ALT),
    ("SUPER_", Modifiers::SUPER),
];

/// One way of triggering a hotkey: a key symbol plus the modifiers held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub sym: KeySym,
    pub modifiers: Modifiers,
}

impl Chord {
    pub fn new(sym: KeySym, modifiers: Modifiers) -> Self {
        Self {
            sym,
            modifiers: modifiers.normalized(),
        }
    }

    /// Whether a key event with this symbol and modifier state is this chord.
    pub fn matches(&self, sym: KeySym, modifiers: Modifiers) -> bool {
        self.sym == sym && own_modifier_stripped(sym, self.modifiers) == own_modifier_stripped(sym, modifiers.normalized())
    }
}

/// A modifier key reports its own bit on release but not on press.
fn own_modifier_stripped(sym: KeySym, modifiers: Modifiers) -> Modifiers {
    let own = match sym {
        s if s.is_shift() => Modifiers::SHIFT,
        s if s.is_control() => Modifiers::CTRL,
        KeySym::ALT_L | KeySym::ALT_R => Modifiers::ALT,
        KeySym::SUPER_L | KeySym::SUPER_R => Modifiers::SUPER,
        _ => Modifiers::empty(),
    };
    modifiers - own
}

impl FromStr for Chord {
    type Err = HotkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(HotkeyParseError::Empty);
        }

        let mut modifiers = Modifiers::empty();
        'prefixes: loop {
            for (prefix, modifier) in MODIFIER_PREFIXES {
                if rest.len() > prefix.len() && rest.starts_with(prefix) {
                    modifiers |= *modifier;
                    rest = &rest[prefix.len()..];
                    continue 'prefixes;
                }
            }
            break;
        }

        if let Some((_, sym)) = KEY_NAMES.iter().find(|(name, _)| *name == rest) {
            return Ok(Chord::new(*sym, modifiers));
        }

        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_graphic() => {
                // Hosts report shifted letters in upper case
                let ch = if modifiers.contains(Modifiers::SHIFT) {
                    ch.to_ascii_uppercase()
                } else {
                    ch.to_ascii_lowercase()
                };
                Ok(Chord::new(KeySym(ch as u32), modifiers))
            }
            _ => Err(HotkeyParseError::UnknownKey(rest.to_string())),
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, modifier) in MODIFIER_PREFIXES {
            if self.modifiers.contains(*modifier) {
                f.write_str(prefix)?;
            }
        }
        match KEY_NAMES.iter().find(|(_, sym)| *sym == self.sym) {
            Some((name, _)) => f.write_str(name),
            None => match self.sym.to_char() {
                Some(ch) => write!(f, "{}", ch),
                None => write!(f, "0x{:x}", self.sym.0),
            },
        }
    }
}

/// An OR of up to two chords.
///
/// Empty slots never match, so a malformed configuration entry simply
/// disables the hotkey instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HotkeyEntry {
    chords: [Option<Chord>; HOT_KEY_COUNT],
}

impl HotkeyEntry {
    /// An entry that never matches.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(chord: Chord) -> Self {
        Self {
            chords: [Some(chord), None],
        }
    }

    pub fn pair(first: Chord, second: Chord) -> Self {
        Self {
            chords: [Some(first), Some(second)],
        }
    }

    /// Strict parse: every chord must be understood.
    pub fn parse(s: &str) -> Result<Self, HotkeyParseError> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() > HOT_KEY_COUNT {
            return Err(HotkeyParseError::TooManyChords {
                max: HOT_KEY_COUNT,
                got: parts.len(),
            });
        }
        let mut entry = Self::none();
        for (slot, part) in entry.chords.iter_mut().zip(parts) {
            *slot = Some(part.parse()?);
        }
        Ok(entry)
    }

    /// Lenient parse used for configuration: bad chords leave their slot
    /// empty and extra chords are dropped.
    pub fn parse_lenient(s: &str) -> Self {
        let mut entry = Self::none();
        let mut parts = s.split_whitespace();
        for slot in entry.chords.iter_mut() {
            let Some(part) = parts.next() else { break };
            match part.parse::<Chord>() {
                Ok(chord) => *slot = Some(chord),
                Err(e) => warn!(chord = part, error = %e, "ignoring unparseable hotkey chord"),
            }
        }
        if let Some(extra) = parts.next() {
            warn!(chord = extra, "hotkey has more than {} chords; ignoring the rest", HOT_KEY_COUNT);
        }
        entry
    }

    pub fn chords(&self) -> impl Iterator<Item = &Chord> {
        self.chords.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.chords().next().is_none()
    }

    pub fn matches(&self, sym: KeySym, modifiers: Modifiers) -> bool {
        self.chords().any(|chord| chord.matches(sym, modifiers))
    }
}

impl From<String> for HotkeyEntry {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl From<HotkeyEntry> for String {
    fn from(entry: HotkeyEntry) -> Self {
        entry.to_string()
    }
}

impl fmt::Display for HotkeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for chord in self.chords() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", chord)?;
            first = false;
        }
        Ok(())
    }
}

/// True if the key equals either chord of `hotkey`, ignoring lock state.
pub fn is_hotkey(sym: KeySym, modifiers: Modifiers, hotkey: &HotkeyEntry) -> bool {
    hotkey.matches(sym, modifiers)
}

/// Map a key to a 0-based candidate slot by its position in `choose_keys`.
///
/// Only plain character keys qualify; Shift is tolerated so shifted symbols
/// can serve as selection keys, any other modifier disqualifies the key.
pub fn check_choose_key(sym: KeySym, modifiers: Modifiers, choose_keys: &str) -> Option<usize> {
    if !(modifiers.normalized() - Modifiers::SHIFT).is_empty() {
        return None;
    }
    let ch = sym.to_char()?;
    if ch == ' ' {
        return None;
    }
    choose_keys.chars().position(|c| c == ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ch: char) -> KeySym {
        KeySym::from_char(ch).unwrap()
    }

    #[test]
    fn test_check_choose_key_positions() {
        assert_eq!(check_choose_key(key('5'), Modifiers::empty(), "1234567890"), Some(4));
        assert_eq!(check_choose_key(key('0'), Modifiers::empty(), "1234567890"), Some(9));
        assert_eq!(check_choose_key(key('a'), Modifiers::empty(), "1234567890"), None);
    }

    #[test]
    fn test_check_choose_key_modifiers() {
        assert_eq!(check_choose_key(key('5'), Modifiers::CTRL, "1234567890"), None);
        assert_eq!(check_choose_key(key('!'), Modifiers::SHIFT, "!@#"), Some(0));
        assert_eq!(check_choose_key(key('2'), Modifiers::NUM_LOCK, "1234567890"), Some(1));
        assert_eq!(check_choose_key(KeySym::RETURN, Modifiers::empty(), "1234567890"), None);
    }

    #[test]
    fn test_two_chord_entry() {
        let entry = HotkeyEntry::parse("CTRL_SPACE L_CTRL").unwrap();
        assert!(is_hotkey(KeySym::SPACE, Modifiers::CTRL, &entry));
        assert!(is_hotkey(KeySym::CONTROL_L, Modifiers::empty(), &entry));
        assert!(!is_hotkey(KeySym::SPACE, Modifiers::ALT, &entry));
        assert!(!is_hotkey(KeySym::SPACE, Modifiers::empty(), &entry));
    }

    #[test]
    fn test_lock_bits_ignored() {
        let entry = HotkeyEntry::parse("CTRL_SPACE").unwrap();
        assert!(is_hotkey(KeySym::SPACE, Modifiers::CTRL | Modifiers::CAPS_LOCK, &entry));
    }

    #[test]
    fn test_modifier_key_matches_on_press_and_release() {
        let entry = HotkeyEntry::parse("L_CTRL").unwrap();
        assert!(entry.matches(KeySym::CONTROL_L, Modifiers::empty()));
        assert!(entry.matches(KeySym::CONTROL_L, Modifiers::CTRL));
        assert!(!entry.matches(KeySym::CONTROL_R, Modifiers::CTRL));
    }

    #[test]
    fn test_parse_chords() {
        let chord: Chord = "CTRL_SHIFT_a".parse().unwrap();
        assert_eq!(chord.sym, key('A'));
        assert_eq!(chord.modifiers, Modifiers::CTRL | Modifiers::SHIFT);

        let chord: Chord = "-".parse().unwrap();
        assert_eq!(chord.sym, key('-'));

        let chord: Chord = "CTRL_PERIOD".parse().unwrap();
        assert_eq!(chord.to_string(), "CTRL_PERIOD");

        assert_eq!("".parse::<Chord>(), Err(HotkeyParseError::Empty));
        assert!(matches!("CTRL_BOGUS".parse::<Chord>(), Err(HotkeyParseError::UnknownKey(_))));
    }

    #[test]
    fn test_too_many_chords() {
        assert_eq!(
            HotkeyEntry::parse("A B C"),
            Err(HotkeyParseError::TooManyChords { max: 2, got: 3 })
        );
    }

    #[test]
    fn test_lenient_parse_never_matches_bad_chords() {
        let entry = HotkeyEntry::parse_lenient("CTRL_NOPE");
        assert!(entry.is_empty());
        assert!(!entry.matches(KeySym::SPACE, Modifiers::CTRL));

        let entry = HotkeyEntry::parse_lenient("NOPE UP");
        assert!(entry.matches(KeySym::UP, Modifiers::empty()));
        assert_eq!(entry.to_string(), "UP");
    }

    #[test]
    fn test_display_round_trip() {
        let entry = HotkeyEntry::parse("- UP").unwrap();
        assert_eq!(HotkeyEntry::parse(&entry.to_string()).unwrap(), entry);
    }
}
