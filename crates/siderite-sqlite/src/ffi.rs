//! Access to the bundled SQLite C API.
//!
//! The declarations come from `libsqlite3-sys`; this module re-exports them
//! under one roof and adds the few safe helpers the driver needs.

use std::ffi::{CStr, c_int};

pub use libsqlite3_sys::*;

// `libsqlite3-sys` 0.37's pre-generated bindings omit `sqlite3_close_v2`,
// but the symbol is present in the bundled SQLite library. Declare the
// binding here so the driver can use the deferred-close variant it relies on.
unsafe extern "C" {
    pub fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// The SQLite library version as a string.
pub fn version() -> &'static str {
    // SAFETY: sqlite3_libversion returns a static string
    unsafe {
        let ptr = sqlite3_libversion();
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown")
    }
}

/// The SQLite library version as a number (e.g. 3.45.0 = 3045000).
pub fn version_number() -> i32 {
    // SAFETY: sqlite3_libversion_number is always safe to call
    unsafe { sqlite3_libversion_number() }
}

/// Convert a SQLite result code to a human-readable string.
pub fn error_string(code: c_int) -> &'static str {
    // SAFETY: sqlite3_errstr returns a static string
    unsafe {
        let ptr = sqlite3_errstr(code);
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown error")
    }
}
