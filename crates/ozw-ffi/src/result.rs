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

//! # Value Result Envelope
//!
//! ## Overview
//!
//! Value operations return a heap-allocated `ZwValueResult`. Exactly one of
//! three states is encoded:
//!
//! * `is_ok == true`: the call applied. Only the payload slot documented for
//!   the operation is populated.
//! * `is_ok == false && is_err == false`: the call ran but did not apply, for
//!   example a typed read of a value that is not set.
//! * `is_err == true`: the native library raised. `err_kind` names the
//!   category and `err_msg` holds the message.
//!
//! Every envelope is released with `zw_value_result_free`, which also frees
//! every nested buffer. A null envelope means the manager handle was
//! rejected.
//!
//! ## Exported Functions
//!
//! * `zw_value_result_free`
//! * `zw_error_kind_as_string`

use crate::buffer::{
    alloc_box, free_box, zw_bytes_free, zw_int_list_free, zw_string_free, zw_string_list_free, ZwBytes,
    ZwIntList, ZwString, ZwStringList,
};
use crate::context;
use crate::handle::ZwManager;
use ozw_core::exception::{ExceptionKind, NativeResult, OzwException};
use ozw_core::manager::{Manager, Value};
use std::ptr::null_mut;

mirror_enum! {
    /// Category of a native exception.
    pub enum ZwErrorKind mirrors ExceptionKind {
        Options = 0,
        Config = 1,
        InvalidHomeId = 2,
        InvalidValueId = 3,
        CannotConvertValueId = 4,
        SecurityFailed = 5,
        InvalidNodeId = 6,
    }
}

/// The result of a value operation.
#[repr(C)]
#[derive(Debug)]
pub struct ZwValueResult {
    pub is_ok: bool,
    pub val_bool: bool,
    pub val_byte: u8,
    pub val_short: i16,
    pub val_int: i32,
    pub val_float: f32,
    pub val_string: *mut ZwString,
    pub val_raw: *mut ZwBytes,
    pub val_item_list: *mut ZwStringList,
    pub val_value_list: *mut ZwIntList,
    pub is_err: bool,
    pub err_kind: ZwErrorKind,
    pub err_msg: *mut ZwString,
}

impl Default for ZwValueResult {
    fn default() -> Self {
        Self {
            is_ok: false,
            val_bool: false,
            val_byte: 0,
            val_short: 0,
            val_int: 0,
            val_float: 0.0,
            val_string: null_mut(),
            val_raw: null_mut(),
            val_item_list: null_mut(),
            val_value_list: null_mut(),
            is_err: false,
            err_kind: ZwErrorKind::Options,
            err_msg: null_mut(),
        }
    }
}

/// Data that can be stored in the payload slots of an envelope.
pub(crate) trait Payload {
    fn store(self, result: &mut ZwValueResult);
}

impl Payload for () {
    #[inline]
    fn store(self, _result: &mut ZwValueResult) {}
}

impl Payload for bool {
    #[inline]
    fn store(self, result: &mut ZwValueResult) {
        result.val_bool = self;
    }
}

impl Payload for u8 {
    #[inline]
    fn store(self, result: &mut ZwValueResult) {
        result.val_byte = self;
    }
}

impl Payload for i16 {
    #[inline]
    fn store(self, result: &mut ZwValueResult) {
        result.val_short = self;
    }
}

impl Payload for i32 {
    #[inline]
    fn store(self, result: &mut ZwValueResult) {
        result.val_int = self;
    }
}

impl Payload for f32 {
    #[inline]
    fn store(self, result: &mut ZwValueResult) {
        result.val_float = self;
    }
}

impl Payload for String {
    fn store(self, result: &mut ZwValueResult) {
        result.val_string = ZwString::new_owned(&self);
    }
}

impl Payload for Vec<u8> {
    fn store(self, result: &mut ZwValueResult) {
        result.val_raw = ZwBytes::new_owned(self);
    }
}

impl Payload for Vec<String> {
    fn store(self, result: &mut ZwValueResult) {
        result.val_item_list = ZwStringList::new_owned(&self);
    }
}

impl Payload for Vec<i32> {
    fn store(self, result: &mut ZwValueResult) {
        result.val_value_list = ZwIntList::new_owned(self);
    }
}

impl Payload for Value {
    fn store(self, result: &mut ZwValueResult) {
        match self {
            Value::Bool(b) => b.store(result),
            Value::Byte(b) => b.store(result),
            Value::Float(f) => f.store(result),
            Value::Int(i) | Value::ListValue(i) => i.store(result),
            Value::Short(s) => s.store(result),
            Value::String(s) | Value::ListSelection(s) => s.store(result),
            Value::Raw(r) => r.store(result),
        }
    }
}

/// What a guarded native call produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome<T> {
    Applied(T),
    NotApplicable,
    Failed(OzwException),
}

impl<T> Outcome<T> {
    /// From a call that reports "not applicable" as `None`.
    pub(crate) fn from_option(result: NativeResult<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Applied(value),
            Ok(None) => Self::NotApplicable,
            Err(exception) => Self::Failed(exception),
        }
    }

    /// From a call that always applies when it returns.
    pub(crate) fn from_result(result: NativeResult<T>) -> Self {
        match result {
            Ok(value) => Self::Applied(value),
            Err(exception) => Self::Failed(exception),
        }
    }
}

impl Outcome<()> {
    /// From a call whose boolean return says whether it applied.
    pub(crate) fn from_flag(result: NativeResult<bool>) -> Self {
        match result {
            Ok(true) => Self::Applied(()),
            Ok(false) => Self::NotApplicable,
            Err(exception) => Self::Failed(exception),
        }
    }
}

impl<T: Payload> Outcome<T> {
    /// Moves the outcome into a new envelope owned by the caller.
    pub(crate) fn into_raw(self, function: &'static str) -> *mut ZwValueResult {
        let mut result = ZwValueResult::default();
        match self {
            Self::Applied(value) => {
                result.is_ok = true;
                value.store(&mut result);
            }
            Self::NotApplicable => {}
            Self::Failed(exception) => {
                tracing::warn!(
                    function,
                    kind = exception.kind().as_str(),
                    message = exception.message(),
                    "native exception"
                );
                result.is_err = true;
                result.err_kind = exception.kind().into();
                result.err_msg = ZwString::new_owned(exception.message());
            }
        }
        alloc_box(result)
    }
}

/// Resolves the manager and wraps the guarded call in an envelope.
///
/// Returns null if the handle is rejected.
pub(crate) fn envelope<T: Payload>(
    handle: *const ZwManager,
    function: &'static str,
    f: impl FnOnce(&dyn Manager) -> Outcome<T>,
) -> *mut ZwValueResult {
    match context::manager(handle, function) {
        Some(manager) => f(manager.as_ref()).into_raw(function),
        None => null_mut(),
    }
}

/// Frees an envelope and every buffer it holds.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is null or was returned by this
/// library and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn zw_value_result_free(result: *mut ZwValueResult) {
    if result.is_null() {
        return;
    }
    let result = free_box(result);
    zw_string_free(result.val_string);
    zw_bytes_free(result.val_raw);
    zw_string_list_free(result.val_item_list);
    zw_int_list_free(result.val_value_list);
    zw_string_free(result.err_msg);
}

/// Name of the error kind as a static C string, or `"Unknown"`.
#[no_mangle]
pub extern "C" fn zw_error_kind_as_string(kind: i32) -> *const libc::c_char {
    ZwErrorKind::c_name_of(kind, "zw_error_kind_as_string")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::live_allocations;
    use std::ffi::CStr;

    #[test]
    fn test_applied_sets_only_its_slot() {
        let raw = Outcome::Applied(Value::Short(-12)).into_raw("test");
        unsafe {
            let r = &*raw;
            assert!(r.is_ok);
            assert!(!r.is_err);
            assert_eq!(r.val_short, -12);
            assert_eq!(r.val_int, 0);
            assert!(r.val_string.is_null());
            assert!(r.err_msg.is_null());
            zw_value_result_free(raw);
        }
    }

    #[test]
    fn test_not_applicable_is_neither_ok_nor_err() {
        let raw = Outcome::<()>::from_flag(Ok(false)).into_raw("test");
        unsafe {
            assert!(!(*raw).is_ok);
            assert!(!(*raw).is_err);
            zw_value_result_free(raw);
        }
    }

    #[test]
    fn test_failure_carries_kind_and_message() {
        let exception = OzwException::invalid_home_id("Invalid HomeId passed to GetDriver");
        let raw = Outcome::<String>::Failed(exception).into_raw("test");
        unsafe {
            let r = &*raw;
            assert!(!r.is_ok);
            assert!(r.is_err);
            assert_eq!(r.err_kind, ZwErrorKind::InvalidHomeId);
            assert_eq!((*r.err_msg).as_bytes(), b"Invalid HomeId passed to GetDriver");
            zw_value_result_free(raw);
        }
    }

    #[test]
    fn test_free_releases_nested_buffers() {
        let before = live_allocations();
        unsafe {
            let items = vec!["Off".to_string(), "Heat".to_string()];
            zw_value_result_free(Outcome::Applied(items).into_raw("test"));
            zw_value_result_free(Outcome::Applied(vec![0i32, 1]).into_raw("test"));
            zw_value_result_free(Outcome::Applied(vec![0x01u8, 0x02]).into_raw("test"));
            zw_value_result_free(Outcome::Applied(Value::ListSelection("Heat".into())).into_raw("test"));
            zw_value_result_free(
                Outcome::<()>::Failed(OzwException::cannot_convert("not a bool")).into_raw("test"),
            );
        }
        assert_eq!(live_allocations(), before);
    }

    #[test]
    fn test_list_value_goes_to_int_slot() {
        let raw = Outcome::from_option(Ok(Some(Value::ListValue(3)))).into_raw("test");
        unsafe {
            assert_eq!((*raw).val_int, 3);
            assert!((*raw).val_string.is_null());
            zw_value_result_free(raw);
        }
    }

    #[test]
    fn test_error_kind_names() {
        let name = unsafe { CStr::from_ptr(zw_error_kind_as_string(ZwErrorKind::CannotConvertValueId as i32)) };
        assert_eq!(name.to_str().unwrap(), "CannotConvertValueId");
        assert_eq!(ZwErrorKind::from(ExceptionKind::SecurityFailed) as u8, 5);
    }

    #[test]
    fn test_out_of_range_error_kind_is_unknown() {
        let as_string: extern "C" fn(i32) -> *const libc::c_char = zw_error_kind_as_string;
        let name = unsafe { CStr::from_ptr(as_string(99)) };
        assert_eq!(name.to_str().unwrap(), "Unknown");
    }
}
