use std::sync::{Arc, Mutex};

/// Navigation log standing in for the browser history.
#[derive(Clone, Default)]
pub struct History {
    entries: Arc<Mutex<Vec<String>>>,
}

impl History {
    pub fn push(&self, path: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(path.to_string());
        }
    }

    pub fn current(&self) -> Option<String> {
        self.entries.lock().ok()?.last().cloned()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.to_vec()).unwrap_or_default()
    }
}
