//! Key symbols, modifier masks and raw key events.
//!
//! Key symbols follow the X11 keysym numbering hosts already deliver, so a
//! frontend can pass its values through untouched. Only the symbols the
//! dispatch core itself needs to name are given constants here.

use bitflags::bitflags;

/// An X11-compatible key symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeySym(pub u32);

impl KeySym {
    pub const NONE: KeySym = KeySym(0);
    pub const SPACE: KeySym = KeySym(0x0020);
    pub const BACKSPACE: KeySym = KeySym(0xff08);
    pub const TAB: KeySym = KeySym(0xff09);
    pub const RETURN: KeySym = KeySym(0xff0d);
    pub const ESCAPE: KeySym = KeySym(0xff1b);
    pub const HOME: KeySym = KeySym(0xff50);
    pub const LEFT: KeySym = KeySym(0xff51);
    pub const UP: KeySym = KeySym(0xff52);
    pub const RIGHT: KeySym = KeySym(0xff53);
    pub const DOWN: KeySym = KeySym(0xff54);
    pub const PAGE_UP: KeySym = KeySym(0xff55);
    pub const PAGE_DOWN: KeySym = KeySym(0xff56);
    pub const END: KeySym = KeySym(0xff57);
    pub const DELETE: KeySym = KeySym(0xffff);
    pub const F1: KeySym = KeySym(0xffbe);
    pub const SHIFT_L: KeySym = KeySym(0xffe1);
    pub const SHIFT_R: KeySym = KeySym(0xffe2);
    pub const CONTROL_L: KeySym = KeySym(0xffe3);
    pub const CONTROL_R: KeySym = KeySym(0xffe4);
    pub const ALT_L: KeySym = KeySym(0xffe9);
    pub const ALT_R: KeySym = KeySym(0xffea);
    pub const SUPER_L: KeySym = KeySym(0xffeb);
    pub const SUPER_R: KeySym = KeySym(0xffec);

    /// Key symbol for a printable ASCII character.
    pub fn from_char(ch: char) -> Option<KeySym> {
        if (' '..='~').contains(&ch) {
            Some(KeySym(ch as u32))
        } else {
            None
        }
    }

    /// The printable ASCII character this symbol types, if any.
    ///
    /// Latin-1 keysyms share their code points with ASCII in this range.
    pub fn to_char(self) -> Option<char> {
        match self.0 {
            0x20..=0x7e => char::from_u32(self.0),
            _ => None,
        }
    }

    pub fn is_shift(self) -> bool {
        self == Self::SHIFT_L || self == Self::SHIFT_R
    }

    pub fn is_control(self) -> bool {
        self == Self::CONTROL_L || self == Self::CONTROL_R
    }

    /// True for keys that only change modifier state.
    pub fn is_modifier(self) -> bool {
        (Self::SHIFT_L.0..=Self::SUPER_R.0).contains(&self.0)
    }
}

bitflags! {
    /// X11 modifier state mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CAPS_LOCK = 1 << 1;
        const CTRL = 1 << 2;
        const ALT = 1 << 3;
        const NUM_LOCK = 1 << 4;
        const SCROLL_LOCK = 1 << 5;
        const SUPER = 1 << 6;

        /// Lock state bits that never take part in a chord.
        const LOCKS = Self::CAPS_LOCK.bits() | Self::NUM_LOCK.bits() | Self::SCROLL_LOCK.bits();
    }
}

impl Modifiers {
    /// Drop lock-key state and any bits this crate does not know about.
    pub fn normalized(self) -> Modifiers {
        Modifiers::from_bits_truncate(self.bits()) - Modifiers::LOCKS
    }
}

/// Whether the host reports a press or a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventType {
    Press,
    Release,
}

/// A raw key event exactly as the host delivered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventType,
    pub sym: KeySym,
    pub modifiers: Modifiers,
    /// Host timestamp in milliseconds.
    pub timestamp: u64,
}

impl KeyEvent {
    pub fn press(sym: KeySym, modifiers: Modifiers, timestamp: u64) -> Self {
        Self {
            kind: KeyEventType::Press,
            sym,
            modifiers,
            timestamp,
        }
    }

    pub fn release(sym: KeySym, modifiers: Modifiers, timestamp: u64) -> Self {
        Self {
            kind: KeyEventType::Release,
            sym,
            modifiers,
            timestamp,
        }
    }
}

/// What a key release means, decided by the key pressed just before it.
///
/// Set on every press and consumed by the matching release, which is how a
/// tapped Ctrl is told apart from a Ctrl held for a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyReleased {
    #[default]
    Other,
    Ctrl,
    SecondSelectKey,
    ThirdSelectKey,
    CtrlShift,
}
