//! Owned message body with a read cursor.
//!
//! The transport pulls the body through [`Body::read`] while the request is
//! performed, in whatever chunk sizes it chooses.

use crate::error::{Error, Result};

/// Message body buffer owned by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    data: Vec<u8>,
    pos: usize,
}

impl Body {
    /// Copies `bytes` into a newly allocated body with the cursor at the start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the buffer cannot be allocated.
    pub fn copy_from(bytes: &[u8]) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())
            .map_err(|_| Error::Alloc("request body"))?;
        data.extend_from_slice(bytes);
        Ok(Self { data, pos: 0 })
    }

    /// Copies the next unread bytes into `out` and advances the cursor.
    ///
    /// Returns the number of bytes copied; `0` once the body is exhausted.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(out.len());
        out[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        n
    }

    /// Returns the total body length.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the body holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of bytes not yet read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns the full body regardless of the cursor.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
