//! Message streams shown in the input window.
//!
//! The input window has three streams: the preedit line and the auxiliary
//! lines above and below the candidates. Backends fill them through
//! [`crate::InputState`]; the UI only reads them when asked to redraw.

/// How the UI should style a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Tips,
    Input,
    Index,
    FirstCand,
    UserPhrase,
    Code,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
}

/// An ordered stream of styled messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    items: Vec<Message>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Into<String>>(&mut self, kind: MessageKind, text: T) {
        self.items.push(Message {
            text: text.into(),
            kind,
        });
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.items.iter()
    }

    /// All message texts joined, the way a single-line UI shows them.
    pub fn joined(&self) -> String {
        self.items.iter().map(|m| m.text.as_str()).collect()
    }
}
