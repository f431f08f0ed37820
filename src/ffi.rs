//! FFI bindings for healthdash
//!
//! This module provides C-compatible functions so the host app's UI layer can
//! call the engine. All functions take and return null-terminated JSON strings;
//! returned strings are heap allocated and must be freed with `hdash_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};

use crate::calendar::Calendar;
use crate::config::DashboardConfig;
use crate::error::ComputeError;
use crate::input::parse_metric_value;
use crate::pipeline::{
    dashboard_to_json, sleep_scores_to_json, weekday_averages_to_json,
    weight_differentials_to_json,
};
use crate::selection::find_by_calendar_day;
use crate::types::{ChartPoint, HealthMetricKind};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

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

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Like `cstr_to_string`, but NULL is `Ok(None)` and only invalid UTF-8 is an error
unsafe fn optional_cstr_to_string(ptr: *const c_char, what: &str) -> Result<Option<String>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(|s| Some(s.to_string()))
        .map_err(|_| format!("Invalid UTF-8 in {what}"))
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a JSON result back across the boundary, recording any error
fn json_result(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ComputeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ComputeError::DateParseError(format!("{raw}: {e}")))
}

// ============================================================================
// Dashboard
// ============================================================================

/// Build every dashboard series from a health snapshot.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - `config_json` and `now_rfc3339` may be NULL to use the default configuration
///   and the current time.
/// - Returns a newly allocated string that must be freed with `hdash_free_string`.
/// - Returns NULL on error; call `hdash_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hdash_dashboard(
    snapshot_json: *const c_char,
    config_json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let snapshot = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    let config = match optional_cstr_to_string(config_json, "config string") {
        Ok(Some(json)) => match DashboardConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        Ok(None) => DashboardConfig::default(),
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    let now = match optional_cstr_to_string(now_rfc3339, "timestamp string") {
        Ok(Some(raw)) => match parse_timestamp(&raw) {
            Ok(now) => now,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        Ok(None) => Utc::now(),
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    json_result(dashboard_to_json(&snapshot, &config, now))
}

// ============================================================================
// Individual derivations
// ============================================================================

/// Average a JSON array of samples by weekday.
///
/// # Safety
/// - `samples_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `hdash_free_string`.
/// - Returns NULL on error; call `hdash_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hdash_average_by_weekday(
    samples_json: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    match cstr_to_string(samples_json) {
        Some(json) => json_result(weekday_averages_to_json(&json, utc_offset_minutes)),
        None => {
            set_last_error("Invalid samples string pointer");
            ptr::null_mut()
        }
    }
}

/// Average day-over-day changes of a date-ordered JSON sample array by weekday.
///
/// # Safety
/// - `samples_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `hdash_free_string`.
/// - Returns NULL on error; call `hdash_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hdash_daily_differentials(
    samples_json: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    match cstr_to_string(samples_json) {
        Some(json) => json_result(weight_differentials_to_json(&json, utc_offset_minutes)),
        None => {
            set_last_error("Invalid samples string pointer");
            ptr::null_mut()
        }
    }
}

/// Score a JSON array of sleep intervals, one score per night.
///
/// # Safety
/// - `intervals_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `hdash_free_string`.
/// - Returns NULL on error; call `hdash_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hdash_sleep_scores(
    intervals_json: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    match cstr_to_string(intervals_json) {
        Some(json) => json_result(sleep_scores_to_json(&json, utc_offset_minutes)),
        None => {
            set_last_error("Invalid intervals string pointer");
            ptr::null_mut()
        }
    }
}

/// Find the first chart point on the calendar day of `day_rfc3339`.
///
/// # Safety
/// - `points_json` must be a valid null-terminated C string.
/// - `day_rfc3339` may be NULL, meaning nothing is selected.
/// - Returns the matching point as JSON, or the string `null` when nothing
///   matches. The result must be freed with `hdash_free_string`.
/// - Returns NULL on error; call `hdash_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hdash_find_by_calendar_day(
    points_json: *const c_char,
    day_rfc3339: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    let points_json = match cstr_to_string(points_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid points string pointer");
            return ptr::null_mut();
        }
    };

    let day_rfc3339 = match optional_cstr_to_string(day_rfc3339, "day string") {
        Ok(day) => day,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    let result = (|| -> Result<String, ComputeError> {
        let calendar = Calendar::with_offset_minutes(utc_offset_minutes)?;
        let points: Vec<ChartPoint> = serde_json::from_str(&points_json)?;
        let day = day_rfc3339
            .map(|raw| parse_timestamp(&raw))
            .transpose()?;
        let found = find_by_calendar_day(&calendar, &points, day);
        Ok(serde_json::to_string(&found)?)
    })();

    json_result(result)
}

/// Validate a user-entered value for `metric` ("steps", "weight", "active_energy").
///
/// # Safety
/// - `metric` and `raw_value` must be valid null-terminated C strings.
/// - `out_value` must point to writable memory for one `f64`.
/// - Returns 0 on success and writes the parsed value to `out_value`.
/// - Returns -1 on error; call `hdash_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hdash_parse_metric_value(
    metric: *const c_char,
    raw_value: *const c_char,
    out_value: *mut f64,
) -> i32 {
    clear_last_error();

    if out_value.is_null() {
        set_last_error("Null output pointer");
        return -1;
    }

    let kind = match cstr_to_string(metric).and_then(|m| HealthMetricKind::from_name(&m)) {
        Some(kind) => kind,
        None => {
            set_last_error("Unknown metric");
            return -1;
        }
    };

    let raw = match cstr_to_string(raw_value) {
        Some(s) => s,
        None => {
            set_last_error("Invalid value string pointer");
            return -1;
        }
    };

    match parse_metric_value(kind, &raw) {
        Ok(value) => {
            *out_value = value;
            0
        }
        Err(e) => {
            set_last_error(&e.failure_reason());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by healthdash functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a healthdash function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn hdash_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next healthdash call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn hdash_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn hdash_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
