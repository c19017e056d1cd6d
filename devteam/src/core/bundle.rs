//! Ordered concatenation of generated module sources.

/// Source text for a whole product, built one module at a time.
///
/// Every pushed source is followed by a newline so that the last statement of
/// one module never runs into the first statement of the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBundle {
    text: String,
    modules: usize,
}

impl SourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: &str) {
        self.text.push_str(source);
        self.text.push('\n');
        self.modules += 1;
    }

    /// Number of module sources pushed so far.
    pub fn module_count(&self) -> usize {
        self.modules
    }

    pub fn is_empty(&self) -> bool {
        self.modules == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
