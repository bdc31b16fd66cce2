//! Bounded undo/redo history over settings + rendered-buffer snapshots.
//!
//! Two stacks of deep-copied [`HistoryEntry`] values. The undo stack
//! always keeps at least one entry (the original state), so undo can
//! never walk past the loaded image. A new commit invalidates the redo
//! branch, and the stack is capped: once full, the oldest state is
//! evicted from the bottom.

use std::collections::VecDeque;

use ndarray::Array3;
use tracing::debug;

use crate::settings::Settings;

/// Maximum number of states retained on the undo stack.
pub const DEFAULT_CAPACITY: usize = 50;

/// One recorded editor state: the settings and the buffer they produced.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub settings: Settings,
    pub buffer: Array3<u8>,
}

/// Undo/redo stacks with duplicate suppression and FIFO eviction.
#[derive(Debug)]
pub struct EditHistory {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    capacity: usize,
}

impl EditHistory {
    /// Start a history from the initial state.
    pub fn new(settings: Settings, buffer: Array3<u8>) -> Self {
        let mut undo = VecDeque::with_capacity(DEFAULT_CAPACITY);
        undo.push_back(HistoryEntry { settings, buffer });
        Self {
            undo,
            redo: Vec::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Record a new state.
    ///
    /// Skipped (returns `false`) when `settings` equals the current top,
    /// so repeated renders of the same parameters do not grow the stack.
    /// Any pending redo branch is discarded.
    pub fn commit(&mut self, settings: &Settings, buffer: &Array3<u8>) -> bool {
        if let Some(top) = self.undo.back() {
            if top.settings == *settings {
                return false;
            }
        }
        self.undo.push_back(HistoryEntry {
            settings: settings.clone(),
            buffer: buffer.clone(),
        });
        self.redo.clear();
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
            debug!(capacity = self.capacity, "history full, evicted oldest state");
        }
        debug!(depth = self.undo.len(), "committed history state");
        true
    }

    /// Step back one state.
    ///
    /// Returns the state to display, or `None` when only the initial
    /// entry remains.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.undo.len() <= 1 {
            return None;
        }
        let entry = self.undo.pop_back()?;
        self.redo.push(entry);
        self.undo.back()
    }

    /// Step forward one previously undone state.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push_back(entry);
        self.undo.back()
    }

    /// Drop everything and restart from a single fresh state.
    pub fn reset(&mut self, settings: Settings, buffer: Array3<u8>) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(HistoryEntry { settings, buffer });
    }

    /// Current state (top of the undo stack).
    pub fn current(&self) -> &HistoryEntry {
        // The undo stack is never empty after construction.
        self.undo.back().expect("history holds at least one entry")
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(fill: u8) -> Array3<u8> {
        Array3::from_elem((2, 2, 4), fill)
    }

    fn settings_with_brightness(v: f32) -> Settings {
        let mut s = Settings::default();
        s.brightness = v;
        s
    }

    #[test]
    fn test_duplicate_commit_does_not_grow() {
        let mut h = EditHistory::new(Settings::default(), buffer(0));
        let s = settings_with_brightness(120.0);
        assert!(h.commit(&s, &buffer(1)));
        assert!(!h.commit(&s, &buffer(2)));
        assert_eq!(h.undo_depth(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut h = EditHistory::new(Settings::default(), buffer(0));
        for i in 0..51 {
            let s = settings_with_brightness(100.0 + i as f32 + 1.0);
            assert!(h.commit(&s, &buffer(0)));
        }
        assert_eq!(h.undo_depth(), DEFAULT_CAPACITY);
        // Walk all the way back: the initial state and the first two
        // commits were evicted, so the bottom is the third commit.
        while h.can_undo() {
            h.undo();
        }
        assert_eq!(h.current().settings.brightness, 103.0);
    }

    #[test]
    fn test_undo_redo_are_inverse() {
        let mut h = EditHistory::new(Settings::default(), buffer(0));
        let s = settings_with_brightness(150.0);
        h.commit(&s, &buffer(9));

        let back = h.undo().unwrap();
        assert_eq!(back.settings, Settings::default());

        let forward = h.redo().unwrap();
        assert_eq!(forward.settings, s);
        assert_eq!(forward.buffer, buffer(9));
    }

    #[test]
    fn test_commit_after_undo_clears_redo() {
        let mut h = EditHistory::new(Settings::default(), buffer(0));
        h.commit(&settings_with_brightness(110.0), &buffer(1));
        h.commit(&settings_with_brightness(120.0), &buffer(2));
        h.undo();
        assert!(h.can_redo());

        h.commit(&settings_with_brightness(130.0), &buffer(3));
        assert!(!h.can_redo());
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_underflow_is_a_no_op() {
        let mut h = EditHistory::new(Settings::default(), buffer(0));
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.undo_depth(), 1);
    }

    #[test]
    fn test_reset_restarts_from_one_state() {
        let mut h = EditHistory::new(Settings::default(), buffer(0));
        h.commit(&settings_with_brightness(140.0), &buffer(1));
        h.undo();
        h.reset(Settings::default(), buffer(7));
        assert_eq!(h.undo_depth(), 1);
        assert!(!h.can_redo());
        assert_eq!(h.current().buffer, buffer(7));
    }
}
