//! FFI bindings for the happiness simulator
//!
//! This module provides C-compatible functions for calling the simulator from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `happiness_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapter::TableFormat;
use crate::config::SimulatorConfig;
use crate::pipeline::{table_to_report, HappinessSession};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Convert a Rust string to a C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Evaluate a JSON array of table rows and return the report JSON.
///
/// # Safety
/// - `table_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `happiness_free_string`.
/// - Returns NULL on error; call `happiness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn happiness_evaluate_json(table_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(table_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid table JSON string pointer");
            return ptr::null_mut();
        }
    };

    match table_to_report(json_str, TableFormat::Array) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Session API
// ============================================================================

/// Opaque handle to a HappinessSession
pub struct HappinessSessionHandle {
    session: HappinessSession,
}

/// Create a session starting from the default table.
///
/// # Safety
/// - Returns a pointer to a newly allocated session.
/// - Must be freed with `happiness_session_free`.
#[no_mangle]
pub unsafe extern "C" fn happiness_session_new() -> *mut HappinessSessionHandle {
    clear_last_error();

    let session = HappinessSession::new(SimulatorConfig::default());
    Box::into_raw(Box::new(HappinessSessionHandle { session }))
}

/// Free a session.
///
/// # Safety
/// - `session` must be a valid pointer returned by `happiness_session_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn happiness_session_free(session: *mut HappinessSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Apply a table edit (JSON) and return the recomputed report JSON.
///
/// # Safety
/// - `session` must be a valid pointer returned by `happiness_session_new`.
/// - `edit_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `happiness_free_string`.
/// - Returns NULL on error; call `happiness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn happiness_session_apply(
    session: *mut HappinessSessionHandle,
    edit_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let handle = &mut *session;

    let edit_str = match cstr_to_string(edit_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid edit JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.session.apply_json(&edit_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Recompute the report for the session's current table.
///
/// # Safety
/// - `session` must be a valid pointer returned by `happiness_session_new`.
/// - Returns a newly allocated string that must be freed with `happiness_free_string`.
/// - Returns NULL on error; call `happiness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn happiness_session_report(
    session: *const HappinessSessionHandle,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let handle = &*session;

    let json = handle
        .session
        .report()
        .and_then(|report| serde_json::to_string_pretty(&report).map_err(Into::into));

    match json {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by simulator functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a simulator function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn happiness_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next simulator call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn happiness_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string.
/// - Do NOT free the returned pointer.
#[no_mangle]
pub unsafe extern "C" fn happiness_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}
