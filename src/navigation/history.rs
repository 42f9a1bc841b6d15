//! In-process history stack
//!
//! Stands in for the browser history where no real one exists (the CLI,
//! tests). Implements both [`Navigator`] and [`Document`].

use parking_lot::Mutex;

use super::{Document, NavigateOptions, Navigator};

#[derive(Debug)]
struct HistoryState {
    entries: Vec<String>,
    index: usize,
    full_loads: usize,
}

#[derive(Debug)]
pub struct MemoryHistory {
    state: Mutex<HistoryState>,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![initial.to_string()],
                index: 0,
                full_loads: 0,
            }),
        }
    }

    /// Current location including any query string
    pub fn current(&self) -> String {
        let state = self.state.lock();
        state.entries[state.index].clone()
    }

    /// Entries up to and including the current one
    pub fn entries(&self) -> Vec<String> {
        let state = self.state.lock();
        state.entries[..=state.index].to_vec()
    }

    /// Step back one entry. Returns the new location, or None at the start.
    pub fn back(&self) -> Option<String> {
        let mut state = self.state.lock();
        if state.index == 0 {
            return None;
        }
        state.index -= 1;
        Some(state.entries[state.index].clone())
    }

    /// Number of full-document navigations performed
    pub fn full_loads(&self) -> usize {
        self.state.lock().full_loads
    }

    fn apply(&self, path: &str, replace: bool) {
        let mut state = self.state.lock();
        let index = state.index;
        if replace {
            state.entries[index] = path.to_string();
        } else {
            // Pushing drops any forward entries
            state.entries.truncate(index + 1);
            state.entries.push(path.to_string());
            state.index += 1;
        }
    }
}

impl Navigator for MemoryHistory {
    fn navigate(&self, path: &str, options: NavigateOptions) {
        self.apply(path, options.replace);
    }
}

impl Document for MemoryHistory {
    fn pathname(&self) -> String {
        let current = self.current();
        match current.split_once(['?', '#']) {
            Some((path, _)) => path.to_string(),
            None => current,
        }
    }

    fn assign(&self, path: &str) {
        self.apply(path, false);
        self.state.lock().full_loads += 1;
    }
}
