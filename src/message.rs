//! Engine-owned diagnostic buffers
//!
//! `sqlite3_exec` reports failures by pointing an out-parameter at a string
//! it allocated with `sqlite3_malloc`. The caller owns that buffer and must
//! release it with `sqlite3_free`. [`EngineMessage`] holds it for exactly
//! one scope and frees it on drop, so every exit path releases it.

use rusqlite::ffi;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;

/// A diagnostic string allocated by the engine
pub struct EngineMessage {
    ptr: *mut c_char,
}

impl EngineMessage {
    /// An empty slot, ready to be passed as an out-parameter
    pub fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
        }
    }

    /// Out-parameter pointer for engine calls.
    ///
    /// Any buffer already held is freed first so it cannot be overwritten
    /// and leaked.
    pub fn as_out_ptr(&mut self) -> *mut *mut c_char {
        self.release();
        &mut self.ptr
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_null()
    }

    /// Copy the message out of the engine buffer
    pub fn text(&self) -> Option<String> {
        if self.ptr.is_null() {
            return None;
        }
        // SAFETY: a non-null pointer here was written by the engine and
        // points at a NUL-terminated string it allocated.
        let text = unsafe { CStr::from_ptr(self.ptr) };
        Some(text.to_string_lossy().into_owned())
    }

    /// The buffer's text, or the engine's generic text for `code`
    pub fn text_or_errstr(&self, code: c_int) -> String {
        self.text().unwrap_or_else(|| errstr(code))
    }

    fn release(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: the buffer came from sqlite3_malloc inside the engine
            // and has not been freed yet.
            unsafe { ffi::sqlite3_free(self.ptr.cast()) };
            self.ptr = ptr::null_mut();
        }
    }
}

impl Drop for EngineMessage {
    fn drop(&mut self) {
        self.release();
    }
}

/// English text the engine uses for a result code
pub fn errstr(code: c_int) -> String {
    // SAFETY: sqlite3_errstr returns a static NUL-terminated string for
    // every input, including unknown codes.
    let text = unsafe { CStr::from_ptr(ffi::sqlite3_errstr(code)) };
    text.to_string_lossy().into_owned()
}
