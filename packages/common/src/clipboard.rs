use crate::CommonResult;

/// Text clipboard provider
///
/// Only shuttles a field's textual form; paste content is validated by the
/// normal codec round-trip on the next edit, never here.
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> CommonResult<()>;

    fn paste(&mut self) -> CommonResult<String>;
}

/// Process-local clipboard
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: String,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&mut self, text: &str) -> CommonResult<()> {
        self.contents = text.to_string();
        Ok(())
    }

    fn paste(&mut self) -> CommonResult<String> {
        Ok(self.contents.clone())
    }
}
