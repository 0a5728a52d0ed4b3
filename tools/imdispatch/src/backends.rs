//! Demo input methods driven by the command-line tool.
//!
//! `TableMethod` is a small code-table method: lowercase letters build a
//! code, candidates come from a code -> words table, and selections are
//! counted so frequent words move to the front. `LatinMethod` types every
//! key straight through.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use imdispatch_core::{
    Candidate, InputMethod, InputState, KeySym, MessageKind, Modifiers, ReturnValue, MAX_CODE_LEN,
};
use tracing::{debug, info, warn};

/// Code -> words table used when no table file is given.
const BUILTIN_TABLE: &[(&str, &[&str])] = &[
    ("ni", &["你", "尼", "泥", "拟"]),
    ("nin", &["您"]),
    ("hao", &["好", "号", "豪", "耗"]),
    ("wo", &["我", "握", "窝"]),
    ("men", &["们", "门", "闷"]),
    ("zhong", &["中", "种", "重", "众"]),
    ("guo", &["国", "过", "果", "锅"]),
    ("ren", &["人", "任", "认"]),
    ("shi", &["是", "时", "事", "十", "市", "使", "式", "世", "试", "师", "史"]),
];

/// Follow-up words offered after a commit.
const BUILTIN_PHRASES: &[(&str, &[&str])] = &[
    ("你", &["好", "们"]),
    ("我", &["们"]),
    ("中", &["国"]),
];

pub struct TableMethod {
    table_path: Option<PathBuf>,
    user_path: Option<PathBuf>,
    table: BTreeMap<String, Vec<String>>,
    usage: BTreeMap<String, u64>,
    last_word: Option<String>,
}

impl TableMethod {
    pub fn new(table_path: Option<PathBuf>, user_path: Option<PathBuf>) -> Self {
        Self {
            table_path,
            user_path,
            table: BTreeMap::new(),
            usage: BTreeMap::new(),
            last_word: None,
        }
    }

    fn load_table(&mut self) -> Result<()> {
        self.table = match &self.table_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading table {}", path.display()))?;
                serde_json::from_str(&content).with_context(|| format!("parsing table {}", path.display()))?
            }
            None => BUILTIN_TABLE
                .iter()
                .map(|(code, words)| (code.to_string(), words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        };
        info!(codes = self.table.len(), "loaded code table");
        Ok(())
    }

    fn load_usage(&mut self) -> Result<()> {
        let Some(path) = &self.user_path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)?;
        self.usage = serde_json::from_str(&content)?;
        Ok(())
    }

    /// Words whose code starts with `code`, exact matches first, then by usage.
    fn lookup(&self, code: &str) -> Vec<(String, String)> {
        let mut found: Vec<(String, String)> = self
            .table
            .range(code.to_string()..)
            .take_while(|(k, _)| k.starts_with(code))
            .flat_map(|(k, words)| words.iter().map(move |w| (w.clone(), k[code.len()..].to_string())))
            .collect();
        found.sort_by_key(|(word, rest)| {
            let used = self.usage.get(word).copied().unwrap_or(0);
            (!rest.is_empty(), std::cmp::Reverse(used))
        });
        found
    }

    fn commit_raw(state: &mut InputState) -> ReturnValue {
        let code = state.raw_input().text().to_string();
        match state.set_output(&code) {
            Ok(()) => ReturnValue::ENG_COMMIT | ReturnValue::UPDATE_INPUT_WINDOW,
            Err(_) => ReturnValue::DO_NOTHING,
        }
    }
}

impl InputMethod for TableMethod {
    fn init(&mut self) -> bool {
        if let Err(e) = self.load_table() {
            warn!(error = %e, "table method unavailable");
            return false;
        }
        if let Err(e) = self.load_usage() {
            // Learned order is optional
            warn!(error = %e, "ignoring unreadable usage file");
        }
        true
    }

    fn reset(&mut self) {}

    fn handle_key(&mut self, sym: KeySym, modifiers: Modifiers, state: &mut InputState) -> ReturnValue {
        if !modifiers.normalized().is_empty() {
            return ReturnValue::TO_PROCESS;
        }
        let composing = !state.raw_input().is_empty();

        match sym.to_char() {
            Some(ch) if ch.is_ascii_lowercase() => {
                if state.raw_input().len() >= MAX_CODE_LEN || state.raw_input_mut().insert_char(ch).is_err() {
                    return ReturnValue::DO_NOTHING;
                }
                state.show_cursor = true;
                ReturnValue::DISPLAY_CANDWORDS
            }
            Some(' ') if composing => {
                if state.candidates.is_empty() {
                    return Self::commit_raw(state);
                }
                self.select_candidate(state.candidates.cursor(), state) | ReturnValue::UPDATE_INPUT_WINDOW
            }
            Some(ch @ (',' | '.')) if !composing => {
                let full = if ch == ',' { "，" } else { "。" };
                match state.set_output(full) {
                    Ok(()) => ReturnValue::PUNC_COMMIT,
                    Err(_) => ReturnValue::TO_PROCESS,
                }
            }
            _ if composing => match sym {
                KeySym::RETURN => Self::commit_raw(state),
                KeySym::ESCAPE => ReturnValue::CLEAN | ReturnValue::UPDATE_INPUT_WINDOW,
                KeySym::BACKSPACE => {
                    state.raw_input_mut().delete_before();
                    if state.raw_input().is_empty() {
                        ReturnValue::CLEAN | ReturnValue::UPDATE_INPUT_WINDOW
                    } else {
                        ReturnValue::DISPLAY_CANDWORDS
                    }
                }
                KeySym::LEFT => {
                    state.raw_input_mut().move_left();
                    ReturnValue::DISPLAY_MESSAGE
                }
                KeySym::RIGHT => {
                    state.raw_input_mut().move_right();
                    ReturnValue::DISPLAY_MESSAGE
                }
                _ => ReturnValue::DO_NOTHING,
            },
            _ => ReturnValue::TO_PROCESS,
        }
    }

    fn fetch_candidates(&mut self, state: &mut InputState) -> ReturnValue {
        let code = state.raw_input().text().to_string();
        let found = self.lookup(&code);

        // A code nothing else extends commits its only word directly
        if let [(word, rest)] = found.as_slice() {
            if rest.is_empty() && state.set_output(word).is_ok() {
                debug!(%code, %word, "unique match");
                self.last_word = Some(word.clone());
                return ReturnValue::COMMIT_STRING | ReturnValue::RESET_INPUT;
            }
        }

        let candidates = found
            .into_iter()
            .filter_map(|(word, rest)| Candidate::new(word).and_then(|c| c.with_tip(rest)).ok())
            .collect();
        state.candidates.set_candidates(candidates);

        state.clean_input_window_up();
        state.preedit.push(MessageKind::Code, code.clone());
        state.aux_up.push(MessageKind::Input, code);
        state.aux_down.clear();
        for (i, c) in state.candidates.current_page_candidates().iter().enumerate() {
            state.aux_down.push(MessageKind::Index, format!("{}.", (i + 1) % 10));
            let kind = if i == 0 { MessageKind::FirstCand } else { MessageKind::Other };
            state.aux_down.push(kind, format!("{}{} ", c.text(), c.tip()));
        }
        ReturnValue::DO_NOTHING
    }

    fn select_candidate(&mut self, index: usize, state: &mut InputState) -> ReturnValue {
        let Some(word) = state.candidates.select_by_index(index).map(|c| c.text().to_string()) else {
            return ReturnValue::DO_NOTHING;
        };
        if state.set_output(&word).is_err() {
            return ReturnValue::DO_NOTHING;
        }
        *self.usage.entry(word.clone()).or_insert(0) += 1;
        self.last_word = Some(word);
        ReturnValue::COMMIT_STRING | ReturnValue::RESET_INPUT
    }

    fn phrase_tips(&mut self, state: &mut InputState) -> bool {
        let Some(word) = self.last_word.take() else {
            return false;
        };
        let Some((key, follow)) = BUILTIN_PHRASES.iter().find(|(w, _)| word.ends_with(*w)) else {
            return false;
        };
        let tips = follow.iter().filter_map(|w| Candidate::new(*w).ok()).collect();
        state.candidates.set_candidates(tips);
        state.aux_up.clear();
        state.aux_up.push(MessageKind::Tips, format!("{}:", key));
        true
    }

    fn persist(&mut self) -> Result<()> {
        let Some(path) = &self.user_path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&self.usage)?;
        std::fs::write(path, content).with_context(|| format!("writing usage to {}", path.display()))?;
        debug!(path = %path.display(), words = self.usage.len(), "saved usage");
        Ok(())
    }

    fn reload_config(&mut self) {
        if let Err(e) = self.load_table() {
            warn!(error = %e, "keeping previous table");
        }
    }

    fn destroy(&mut self) {
        self.table.clear();
    }
}

/// Types every key as-is.
pub struct LatinMethod;

impl InputMethod for LatinMethod {
    fn reset(&mut self) {}

    fn handle_key(&mut self, _: KeySym, _: Modifiers, _: &mut InputState) -> ReturnValue {
        ReturnValue::TO_PROCESS
    }

    fn fetch_candidates(&mut self, _: &mut InputState) -> ReturnValue {
        ReturnValue::DO_NOTHING
    }
}
