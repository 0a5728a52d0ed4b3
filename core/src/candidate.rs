//! Candidate types shared between backends and the input window.
//!
//! This module provides:
//! - `Candidate`: one selectable conversion, bounded to what the UI can show
//! - `CandidateList`: paginated list with cursor navigation

use std::ops::Range;

use crate::error::BufferError;
use crate::{MAX_CAND_LEN, MAX_CAND_WORD, MAX_TIPS_LEN};

/// A single selectable conversion option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    text: String,
    tip: String,
}

impl Candidate {
    /// Create a candidate, rejecting text longer than `MAX_CAND_LEN` bytes.
    pub fn new<T: Into<String>>(text: T) -> Result<Self, BufferError> {
        let text = text.into();
        if text.len() > MAX_CAND_LEN {
            return Err(BufferError::Overflow {
                limit: MAX_CAND_LEN,
                attempted: text.len(),
            });
        }
        Ok(Candidate {
            text,
            tip: String::new(),
        })
    }

    /// Attach a short tip label (e.g. the remaining code to type).
    pub fn with_tip<T: Into<String>>(mut self, tip: T) -> Result<Self, BufferError> {
        let tip = tip.into();
        if tip.len() > MAX_TIPS_LEN {
            return Err(BufferError::Overflow {
                limit: MAX_TIPS_LEN,
                attempted: tip.len(),
            });
        }
        self.tip = tip;
        Ok(self)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tip(&self) -> &str {
        &self.tip
    }
}

/// A paginated list of candidates with cursor navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    /// All available candidates
    candidates: Vec<Candidate>,

    /// Number of candidates per page, never above `MAX_CAND_WORD`
    page_size: usize,

    /// Current page index (0-based)
    current_page: usize,

    /// Cursor position within the current page (0-based)
    cursor: usize,
}

impl CandidateList {
    /// Create a new empty candidate list.
    pub fn new() -> Self {
        Self::with_page_size(5)
    }

    /// Create a candidate list with specified page size, clamped to 1..=MAX_CAND_WORD.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            page_size: page_size.clamp(1, MAX_CAND_WORD),
            current_page: 0,
            cursor: 0,
        }
    }

    pub fn from_candidates(candidates: Vec<Candidate>, page_size: usize) -> Self {
        let mut list = Self::with_page_size(page_size);
        list.candidates = candidates;
        list
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Set the candidates, resetting pagination state.
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.current_page = 0;
        self.cursor = 0;
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn num_pages(&self) -> usize {
        self.candidates.len().div_ceil(self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn current_page_range(&self) -> Range<usize> {
        let start = (self.current_page * self.page_size).min(self.candidates.len());
        let end = (start + self.page_size).min(self.candidates.len());
        start..end
    }

    /// Candidates shown on the current page.
    pub fn current_page_candidates(&self) -> &[Candidate] {
        &self.candidates[self.current_page_range()]
    }

    /// Candidate under the cursor.
    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.current_page_candidates().get(self.cursor)
    }

    /// Move to the previous page. Returns true if the page changed.
    pub fn page_up(&mut self) -> bool {
        if self.current_page == 0 {
            return false;
        }
        self.current_page -= 1;
        self.cursor = 0;
        true
    }

    /// Move to the next page. Returns true if the page changed.
    pub fn page_down(&mut self) -> bool {
        if self.current_page + 1 >= self.num_pages() {
            return false;
        }
        self.current_page += 1;
        self.cursor = 0;
        true
    }

    /// Select a candidate by its slot on the current page.
    pub fn select_by_index(&mut self, page_index: usize) -> Option<&Candidate> {
        if page_index < self.current_page_range().len() {
            self.cursor = page_index;
            self.selected_candidate()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.current_page = 0;
        self.cursor = 0;
    }
}

impl Default for CandidateList {
    fn default() -> Self {
        Self::new()
    }
}
