//! FFI bindings for headache-trends
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `trends_free_string`.
//!
//! Reference times are passed as `YYYY-MM-DDTHH:MM:SS` strings; NULL reads the
//! local wall clock once per call.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDateTime;

use crate::adapters::RowFormat;
use crate::pipeline::{
    grid_to_dashboard, parse_reference_time, rows_to_context, rows_to_dashboard, TrendsProcessor,
};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Read a required string argument, recording the error if it is missing
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        log::warn!("{name} argument is null or not UTF-8");
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Read an optional string argument; NULL is `Ok(None)`
unsafe fn optional_arg(ptr: *const c_char, name: &str) -> Result<Option<String>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    match cstr_to_string(ptr) {
        Some(s) => Ok(Some(s)),
        None => {
            log::warn!("{name} argument is not UTF-8");
            Err(format!("Invalid {name} string pointer"))
        }
    }
}

unsafe fn reference_time(now: *const c_char) -> Result<NaiveDateTime, String> {
    let raw = optional_arg(now, "now")?;
    parse_reference_time(raw.as_deref()).map_err(|e| e.to_string())
}

unsafe fn row_format(format: *const c_char) -> Result<RowFormat, String> {
    match optional_arg(format, "format")?.as_deref() {
        None | Some("rows") => Ok(RowFormat::Rows),
        Some("grid") => Ok(RowFormat::Grid),
        Some(other) => Err(format!("Unknown row format: {other}")),
    }
}

/// Report a result through the return value and the last-error slot
fn finish(result: Result<String, String>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Aggregate a JSON array of row maps and return dashboard JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `view` and `now` must be valid null-terminated C strings or NULL
///   (weekly view, local clock).
/// - Returns a newly allocated string that must be freed with `trends_free_string`.
/// - Returns NULL on error; call `trends_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn trends_rows_to_dashboard(
    json: *const c_char,
    view: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    finish((|| {
        let view_str = optional_arg(view, "view")?.unwrap_or_default();
        let now = reference_time(now)?;
        rows_to_dashboard(json_str, view_str, now).map_err(|e| e.to_string())
    })())
}

/// Aggregate a spreadsheet value grid and return dashboard JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `view` and `now` must be valid null-terminated C strings or NULL
///   (weekly view, local clock).
/// - Returns a newly allocated string that must be freed with `trends_free_string`.
/// - Returns NULL on error; call `trends_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn trends_grid_to_dashboard(
    json: *const c_char,
    view: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    finish((|| {
        let view_str = optional_arg(view, "view")?.unwrap_or_default();
        let now = reference_time(now)?;
        grid_to_dashboard(json_str, view_str, now).map_err(|e| e.to_string())
    })())
}

/// Render the assistant context block for a row payload.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `format` must be `"rows"`, `"grid"` or NULL (rows).
/// - Returns a newly allocated string that must be freed with `trends_free_string`.
/// - Returns NULL on error; call `trends_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn trends_context(
    json: *const c_char,
    format: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    finish(row_format(format).and_then(|format| {
        rows_to_context(json_str, format).map_err(|e| e.to_string())
    }))
}

// ============================================================================
// Processor API
// ============================================================================

/// Opaque handle to a TrendsProcessor
pub struct TrendsProcessorHandle {
    processor: TrendsProcessor,
}

/// Create a new TrendsProcessor.
///
/// # Safety
/// - `instance_id` must be a valid null-terminated C string, or NULL for a
///   random one.
/// - Returns a pointer to a newly allocated TrendsProcessor.
/// - Must be freed with `trends_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn trends_processor_new(
    instance_id: *const c_char,
) -> *mut TrendsProcessorHandle {
    clear_last_error();

    let processor = match optional_arg(instance_id, "instance_id") {
        Ok(Some(id)) => TrendsProcessor::with_instance_id(id),
        Ok(None) => TrendsProcessor::new(),
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(TrendsProcessorHandle { processor }))
}

/// Free a TrendsProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `trends_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn trends_processor_free(processor: *mut TrendsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Aggregate a row payload with a processor and return dashboard JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `trends_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - `format`, `view` and `now` must be valid null-terminated C strings or NULL
///   (rows, weekly view, local clock).
/// - Returns a newly allocated string that must be freed with `trends_free_string`.
/// - Returns NULL on error; call `trends_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn trends_processor_process(
    processor: *const TrendsProcessorHandle,
    format: *const c_char,
    json: *const c_char,
    view: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        log::warn!("processor argument is null");
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    finish((|| {
        let format = row_format(format)?;
        let view_str = optional_arg(view, "view")?.unwrap_or_default();
        let now = reference_time(now)?;
        handle
            .processor
            .process(format, &json_str, &view_str, now)
            .map_err(|e| e.to_string())
    })())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by trends functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a trends function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn trends_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next trends function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn trends_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn trends_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
