use avp_wire::WireError;

/// Reusable decode storage shared by every frame of a session.
///
/// There is a single heap allocation, which lives in `bytes` while raw
/// bytes are cached and in `text` once a payload has been validated as
/// UTF-8. Moving it between the two is free, so consecutive string and
/// bytes values reuse the same memory.
#[derive(Debug, Default)]
pub(crate) struct Scratchpad {
    bytes: Vec<u8>,
    text: String,
}

impl Scratchpad {
    /// The buffer the cursor should decode the next payload into.
    ///
    /// Invalidates whatever text is cached.
    pub(crate) fn buffer(&mut self) -> &mut Vec<u8> {
        if self.text.capacity() > self.bytes.capacity() {
            self.bytes = std::mem::take(&mut self.text).into_bytes();
        }
        &mut self.bytes
    }

    /// Reinterpret the decoded bytes as text.
    pub(crate) fn promote_text(&mut self, offset: usize) -> Result<(), WireError> {
        match String::from_utf8(std::mem::take(&mut self.bytes)) {
            Ok(text) => {
                self.text = text;
                Ok(())
            }
            Err(e) => {
                self.bytes = e.into_bytes();
                Err(WireError::InvalidUtf8 { offset })
            }
        }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[cfg(test)]
    pub(crate) fn allocation(&self) -> *const u8 {
        if self.text.capacity() > 0 {
            self.text.as_ptr()
        } else {
            self.bytes.as_ptr()
        }
    }
}
