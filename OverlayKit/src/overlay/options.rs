//! Write options

/// Generator name written into the header comment by default.
pub const DEFAULT_GENERATOR: &str = "OverlayKit";

/// Options for writing overlay files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Tool name recorded in the generated header comment.
    pub generator: String,
    /// Keep the previous file as `<name>.bak` when replacing it.
    pub backup: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            generator: DEFAULT_GENERATOR.to_string(),
            backup: true,
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    #[must_use]
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }
}
