//! FFI bindings for sleepcalc
//!
//! This module provides C-compatible functions for calling sleepcalc from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `sleepcalc_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDate;

use crate::duration::compute_duration;
use crate::history::{DateRange, DEFAULT_SLEEP_GOAL_HOURS};
use crate::pipeline::{sleep_report_json, SleepProcessor};
use crate::record::parse_date;
use crate::stages::StageConfig;
use crate::types::TimeOfDay;

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

/// NULL means "no bound"
unsafe fn optional_date(ptr: *const c_char, name: &str) -> Result<Option<NaiveDate>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    let s = cstr_to_string(ptr).ok_or_else(|| format!("Invalid {} string pointer", name))?;
    parse_date(&s).map(Some).map_err(|e| e.to_string())
}

// ============================================================================
// Stateless API
// ============================================================================

/// Sleep duration in hours (one decimal place) between two clock times.
///
/// # Safety
/// - Always safe to call.
/// - Returns -1.0 if any hour/minute is out of range; call `sleepcalc_last_error`
///   to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_duration_hours(
    sleep_hour: u32,
    sleep_minute: u32,
    wake_hour: u32,
    wake_minute: u32,
) -> f64 {
    clear_last_error();

    let times = TimeOfDay::new(sleep_hour, sleep_minute)
        .and_then(|sleep| TimeOfDay::new(wake_hour, wake_minute).map(|wake| (sleep, wake)));

    match times {
        Ok((sleep, wake)) => compute_duration(sleep, wake).hours(),
        Err(e) => {
            set_last_error(&e.to_string());
            -1.0
        }
    }
}

/// Compute a full sleep report from two `HH:MM` strings and return it as JSON.
///
/// # Safety
/// - `sleep_time` and `wake_time` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_report(
    sleep_time: *const c_char,
    wake_time: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let sleep_str = match cstr_to_string(sleep_time) {
        Some(s) => s,
        None => {
            set_last_error("Invalid sleep_time string pointer");
            return ptr::null_mut();
        }
    };

    let wake_str = match cstr_to_string(wake_time) {
        Some(s) => s,
        None => {
            set_last_error("Invalid wake_time string pointer");
            return ptr::null_mut();
        }
    };

    match sleep_report_json(&sleep_str, &wake_str) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a SleepProcessor
pub struct SleepProcessorHandle {
    processor: SleepProcessor,
}

/// Create a new SleepProcessor sampling the stage chart `samples_per_hour` times.
///
/// # Safety
/// - Returns a pointer to a newly allocated SleepProcessor.
/// - Must be freed with `sleepcalc_processor_free`.
/// - A value <= 0 selects the default of 4 samples per hour.
/// - Returns NULL if the rate does not divide 60.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_processor_new(samples_per_hour: i32) -> *mut SleepProcessorHandle {
    clear_last_error();

    let mut config = StageConfig::default();
    if samples_per_hour > 0 {
        config.samples_per_hour = samples_per_hour as u32;
    }

    match SleepProcessor::with_config(config) {
        Ok(processor) => Box::into_raw(Box::new(SleepProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a SleepProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sleepcalc_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_processor_free(processor: *mut SleepProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Record a sleep entry (`{"userId", "date", "bedTime", "wakeTime"}`) and
/// return the stored record as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sleepcalc_processor_new`.
/// - `entry_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_processor_add_entry(
    processor: *mut SleepProcessorHandle,
    entry_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(entry_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.add_entry_json(&json_str) {
        Ok(record) => string_to_cstr(&record),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// List a user's records, newest first, as a JSON array.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sleepcalc_processor_new`.
/// - `start_date` and `end_date` are `YYYY-MM-DD` C strings or NULL for an open bound.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_processor_records(
    processor: *mut SleepProcessorHandle,
    user_id: u64,
    start_date: *const c_char,
    end_date: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let range = match date_range(start_date, end_date) {
        Ok(range) => range,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    match handle.processor.records_json(user_id, range) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Summarize a user's nights against a goal as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sleepcalc_processor_new`.
/// - `start_date` and `end_date` are `YYYY-MM-DD` C strings or NULL for an open bound.
/// - A `goal_hours` of exactly 0 selects the default goal of 7 hours.
/// - A negative, NaN or infinite `goal_hours` is an error.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_processor_summary(
    processor: *mut SleepProcessorHandle,
    user_id: u64,
    start_date: *const c_char,
    end_date: *const c_char,
    goal_hours: f64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let range = match date_range(start_date, end_date) {
        Ok(range) => range,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    let goal = if goal_hours == 0.0 {
        DEFAULT_SLEEP_GOAL_HOURS
    } else {
        goal_hours
    };

    match handle.processor.summary_json(user_id, range, goal) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

unsafe fn date_range(start: *const c_char, end: *const c_char) -> Result<DateRange, String> {
    Ok(DateRange::new(
        optional_date(start, "start_date")?,
        optional_date(end, "end_date")?,
    ))
}

/// Save the processor's sleep log to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sleepcalc_processor_new`.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_processor_save_log(
    processor: *mut SleepProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_log() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load a sleep log from JSON, replacing the processor's current log.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `sleepcalc_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_processor_load_log(
    processor: *mut SleepProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_log(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by sleepcalc functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a sleepcalc function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next sleepcalc function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the sleepcalc library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn entry_json(date: &str, bed: &str, wake: &str) -> CString {
        CString::new(format!(
            r#"{{"userId": 3, "date": "{}", "bedTime": "{}", "wakeTime": "{}"}}"#,
            date, bed, wake
        ))
        .unwrap()
    }

    #[test]
    fn test_ffi_duration_hours() {
        unsafe {
            assert!((sleepcalc_duration_hours(23, 0, 7, 0) - 8.0).abs() < 1e-9);
            assert!((sleepcalc_duration_hours(22, 30, 6, 45) - 8.3).abs() < 1e-9);
            assert_eq!(sleepcalc_duration_hours(7, 0, 7, 0), 0.0);
            assert!(sleepcalc_last_error().is_null());

            assert_eq!(sleepcalc_duration_hours(24, 0, 7, 0), -1.0);
            assert!(!sleepcalc_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_report() {
        let sleep = CString::new("23:00").unwrap();
        let wake = CString::new("00:30").unwrap();

        unsafe {
            let result = sleepcalc_report(sleep.as_ptr(), wake.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(value["duration"], 1.5);
            assert_eq!(value["samples"].as_array().unwrap().len(), 7);

            sleepcalc_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = sleepcalc_processor_new(0);
            assert!(!processor.is_null());

            let record = sleepcalc_processor_add_entry(
                processor,
                entry_json("2024-01-15", "23:15", "06:45").as_ptr(),
            );
            assert!(!record.is_null());
            sleepcalc_free_string(record);

            let record = sleepcalc_processor_add_entry(
                processor,
                entry_json("2024-01-20", "22:00", "06:00").as_ptr(),
            );
            sleepcalc_free_string(record);

            let start = CString::new("2024-01-16").unwrap();
            let records = sleepcalc_processor_records(processor, 3, start.as_ptr(), ptr::null());
            assert!(!records.is_null());
            let records_str = CStr::from_ptr(records).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(records_str).unwrap();
            assert_eq!(value.as_array().unwrap().len(), 1);
            assert_eq!(value[0]["date"], "2024-01-20");
            sleepcalc_free_string(records);

            let summary =
                sleepcalc_processor_summary(processor, 3, ptr::null(), ptr::null(), 0.0);
            assert!(!summary.is_null());
            let summary_str = CStr::from_ptr(summary).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(summary_str).unwrap();
            assert_eq!(value["nights"], 2);
            assert_eq!(value["goalHours"], 7.0);
            sleepcalc_free_string(summary);

            for goal in [-1.0, f64::NAN] {
                let rejected =
                    sleepcalc_processor_summary(processor, 3, ptr::null(), ptr::null(), goal);
                assert!(rejected.is_null());
                let error = CStr::from_ptr(sleepcalc_last_error()).to_str().unwrap();
                assert!(error.contains("goal"));
            }

            // Save log and load into a new processor
            let saved = sleepcalc_processor_save_log(processor);
            assert!(!saved.is_null());

            let processor2 = sleepcalc_processor_new(4);
            let load_result = sleepcalc_processor_load_log(processor2, saved);
            assert_eq!(load_result, 0);

            sleepcalc_free_string(saved);
            sleepcalc_processor_free(processor);
            sleepcalc_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let sleep = CString::new("23:00").unwrap();
            let wake = CString::new("7 o'clock").unwrap();

            let result = sleepcalc_report(sleep.as_ptr(), wake.as_ptr());
            assert!(result.is_null());

            let error = sleepcalc_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("Invalid time of day"));

            assert!(sleepcalc_processor_new(7).is_null());

            let processor = sleepcalc_processor_new(4);
            let bad_date = CString::new("yesterday").unwrap();
            let records = sleepcalc_processor_records(processor, 1, bad_date.as_ptr(), ptr::null());
            assert!(records.is_null());
            assert!(!sleepcalc_last_error().is_null());

            let bad_json = CString::new("not json").unwrap();
            assert_eq!(sleepcalc_processor_load_log(processor, bad_json.as_ptr()), -1);
            sleepcalc_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = sleepcalc_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
