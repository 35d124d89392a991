// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Options
//!
//! ## Overview
//!
//! The options singleton moves through *uncreated*, *unlocked*, *locked* and
//! *destroyed*. Options are registered while unlocked. `zw_options_lock`
//! applies the `--Name value` pairs of the command line given at creation
//! and freezes the set; registration fails afterwards. A manager can only
//! be created once the options are locked, and the options cannot be
//! destroyed while a manager exists.
//!
//! ## Exported Functions
//!
//! ### Lifecycle
//! * `zw_options_create`
//! * `zw_options_get`
//! * `zw_options_destroy`
//! * `zw_options_lock`
//! * `zw_options_are_locked`
//!
//! ### Registration
//! * `zw_options_add_bool`
//! * `zw_options_add_int`
//! * `zw_options_add_string`
//! * `zw_options_add_log_level`
//!
//! ### Lookup
//! * `zw_options_get_as_bool`
//! * `zw_options_get_as_int`
//! * `zw_options_get_as_string`
//! * `zw_options_get_type`
//!
//! ### Names
//! * `zw_log_level_as_string`
//! * `zw_option_type_as_string`

use crate::buffer::ZwString;
use crate::context;
use crate::handle::ZwOptions;
use libc::c_char;
use ozw_core::log_level::LogLevel;
use ozw_core::options::{OptionType, Options};
use std::ptr::null_mut;

mirror_enum! {
    /// Verbosity of the native logger.
    pub enum ZwLogLevel mirrors LogLevel {
        Invalid = 0,
        None = 1,
        Always = 2,
        Fatal = 3,
        Error = 4,
        Warning = 5,
        Alert = 6,
        Info = 7,
        Detail = 8,
        Debug = 9,
        StreamDetail = 10,
        Internal = 11,
    }
}

mirror_enum! {
    /// Declared type of a registered option.
    pub enum ZwOptionType mirrors OptionType {
        Invalid = 0,
        Bool = 1,
        Int = 2,
        String = 3,
    }
}

/// Creates the options singleton, or returns the handle of the live one.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// The caller must ensure that every argument is a valid NUL-terminated
/// string.
#[no_mangle]
pub unsafe extern "C" fn zw_options_create(
    config_path: *const c_char,
    user_path: *const c_char,
    command_line: *const c_char,
) -> *mut ZwOptions {
    let _lifecycle = context::lifecycle();
    let existing = context::options_handle();
    if !existing.is_null() {
        tracing::debug!("options already created, returning the live handle");
        return existing;
    }
    let (Some(config_path), Some(user_path), Some(command_line)) = (
        context::checked_str(config_path, "zw_options_create"),
        context::checked_str(user_path, "zw_options_create"),
        context::checked_str(command_line, "zw_options_create"),
    ) else {
        return null_mut();
    };
    let Some(backend) = context::backend("zw_options_create") else {
        return null_mut();
    };
    context::install_options(backend.create_options(config_path, user_path, command_line))
}

/// Handle of the live options, or null.
#[no_mangle]
pub extern "C" fn zw_options_get() -> *mut ZwOptions {
    context::options_handle()
}

/// Destroys the options singleton. Every options handle becomes stale.
///
/// Returns `false` while a manager exists or if no options are live.
#[no_mangle]
pub extern "C" fn zw_options_destroy() -> bool {
    let _lifecycle = context::lifecycle();
    if context::options_handle().is_null() {
        tracing::debug!("no options to destroy");
        return false;
    }
    let Some(backend) = context::backend("zw_options_destroy") else {
        return false;
    };
    if !backend.destroy_options() {
        return false;
    }
    context::take_options();
    true
}

/// Applies the command line and freezes the option set. Returns `false` if
/// the options were already locked.
#[no_mangle]
pub extern "C" fn zw_options_lock(options: *const ZwOptions) -> bool {
    context::options(options, "zw_options_lock").is_some_and(|o| o.lock())
}

#[no_mangle]
pub extern "C" fn zw_options_are_locked(options: *const ZwOptions) -> bool {
    context::options(options, "zw_options_are_locked").is_some_and(|o| o.are_locked())
}

/// Resolves the handle and the option name, then runs `f`.
unsafe fn with_named<T>(
    options: *const ZwOptions,
    name: *const c_char,
    function: &'static str,
    f: impl FnOnce(&dyn Options, &str) -> Option<T>,
) -> Option<T> {
    let options = context::options(options, function)?;
    let name = context::checked_str(name, function)?;
    f(options.as_ref(), name)
}

/// Registers a boolean option. Returns `false` once the options are locked.
///
/// # Panics
///
/// This function will panic if called with a null name.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `name` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_options_add_bool(options: *const ZwOptions, name: *const c_char, default: bool) -> bool {
    with_named(options, name, "zw_options_add_bool", |o, name| {
        Some(o.add_option_bool(name, default))
    })
    .unwrap_or(false)
}

/// Registers an integer option. Returns `false` once the options are locked.
///
/// # Panics
///
/// This function will panic if called with a null name.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `name` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_options_add_int(options: *const ZwOptions, name: *const c_char, default: i32) -> bool {
    with_named(options, name, "zw_options_add_int", |o, name| {
        Some(o.add_option_int(name, default))
    })
    .unwrap_or(false)
}

/// Registers a string option. An appending option collects every value
/// given on the command line, separated by commas.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// The caller must ensure that `name` and `default` are valid
/// NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn zw_options_add_string(
    options: *const ZwOptions,
    name: *const c_char,
    default: *const c_char,
    append: bool,
) -> bool {
    with_named(options, name, "zw_options_add_string", |o, name| {
        let default = context::checked_str(default, "zw_options_add_string")?;
        Some(o.add_option_string(name, default, append))
    })
    .unwrap_or(false)
}

/// Registers a log level option. It is stored as an integer on the native
/// scale and reads back through `zw_options_get_as_int`.
/// A `default` outside the log level scale is stored as `Invalid`.
///
/// # Panics
///
/// This function will panic if called with a null name.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `name` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_options_add_log_level(
    options: *const ZwOptions,
    name: *const c_char,
    default: i32,
) -> bool {
    let level = ZwLogLevel::from_raw(default, "zw_options_add_log_level").unwrap_or(ZwLogLevel::Invalid);
    let level = i32::from(LogLevel::from(level));
    with_named(options, name, "zw_options_add_log_level", |o, name| {
        Some(o.add_option_int(name, level))
    })
    .unwrap_or(false)
}

/// Reads a boolean option into `out`. Returns `false` if the option is
/// missing or of another type; `out` is then left untouched.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// The caller must ensure that `name` is a valid NUL-terminated string and
/// that `out` is valid for writes.
#[no_mangle]
pub unsafe extern "C" fn zw_options_get_as_bool(options: *const ZwOptions, name: *const c_char, out: *mut bool) -> bool {
    assert!(!out.is_null(), "called `zw_options_get_as_bool` with null pointer");
    match with_named(options, name, "zw_options_get_as_bool", |o, name| o.get_option_as_bool(name)) {
        Some(value) => {
            *out = value;
            true
        }
        None => false,
    }
}

/// Reads an integer option into `out`. Returns `false` if the option is
/// missing or of another type; `out` is then left untouched.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// The caller must ensure that `name` is a valid NUL-terminated string and
/// that `out` is valid for writes.
#[no_mangle]
pub unsafe extern "C" fn zw_options_get_as_int(options: *const ZwOptions, name: *const c_char, out: *mut i32) -> bool {
    assert!(!out.is_null(), "called `zw_options_get_as_int` with null pointer");
    match with_named(options, name, "zw_options_get_as_int", |o, name| o.get_option_as_int(name)) {
        Some(value) => {
            *out = value;
            true
        }
        None => false,
    }
}

/// Reads a string option. Free the result with `zw_string_free`. Returns
/// null if the option is missing or of another type.
///
/// # Panics
///
/// This function will panic if called with a null name.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `name` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_options_get_as_string(options: *const ZwOptions, name: *const c_char) -> *mut ZwString {
    with_named(options, name, "zw_options_get_as_string", |o, name| {
        o.get_option_as_string(name)
    })
    .map_or(null_mut(), |value| ZwString::new_owned(&value))
}

/// Declared type of an option, `Invalid` if it is not registered.
///
/// # Panics
///
/// This function will panic if called with a null name.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `name` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_options_get_type(options: *const ZwOptions, name: *const c_char) -> ZwOptionType {
    with_named(options, name, "zw_options_get_type", |o, name| Some(o.get_option_type(name)))
        .map_or(ZwOptionType::Invalid, ZwOptionType::from)
}

#[no_mangle]
pub extern "C" fn zw_log_level_as_string(level: i32) -> *const c_char {
    ZwLogLevel::c_name_of(level, "zw_log_level_as_string")
}

#[no_mangle]
pub extern "C" fn zw_option_type_as_string(kind: i32) -> *const c_char {
    ZwOptionType::c_name_of(kind, "zw_option_type_as_string")
}
