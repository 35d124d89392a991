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

//! # Values
//!
//! ## Overview
//!
//! Reads and writes of values, their metadata, polling and climate control
//! schedules. Value operations return a `ZwValueResult` envelope owned by
//! the caller (see the `result` module). Polling and schedule operations
//! forward plainly and return neutral values on failure.
//!
//! A typed read (`zw_manager_get_value_as_*`) of a value with a different
//! type raises `CannotConvertValueId`. Reading a value as a string always
//! works.
//!
//! ## Exported Functions
//!
//! ### Metadata
//! * `zw_manager_get_value_label`, `zw_manager_set_value_label`
//! * `zw_manager_get_value_units`, `zw_manager_set_value_units`
//! * `zw_manager_get_value_help`, `zw_manager_set_value_help`
//! * `zw_manager_get_value_min`, `zw_manager_get_value_max`
//! * `zw_manager_is_value_read_only`, `zw_manager_is_value_write_only`
//! * `zw_manager_is_value_set`, `zw_manager_is_value_polled`
//!
//! ### Reads
//! * `zw_manager_get_value_as_bool`, `_byte`, `_float`, `_int`, `_short`,
//!   `_string`, `_raw`
//! * `zw_manager_get_value_list_selection_as_string`,
//!   `zw_manager_get_value_list_selection_as_int`
//! * `zw_manager_get_value_list_items`, `zw_manager_get_value_list_values`
//! * `zw_manager_get_value_float_precision`
//!
//! ### Writes
//! * `zw_manager_set_value_bool`, `_byte`, `_float`, `_int`, `_short`,
//!   `_string`, `_raw`, `_list_selection`
//! * `zw_manager_refresh_value`
//! * `zw_manager_set_change_verified`, `zw_manager_get_change_verified`
//! * `zw_manager_press_button`, `zw_manager_release_button`
//!
//! ### Polling
//! * `zw_manager_enable_poll`, `zw_manager_disable_poll`, `zw_manager_is_polled`
//! * `zw_manager_set_poll_intensity`, `zw_manager_get_poll_intensity`
//!
//! ### Climate Control Schedules
//! * `zw_manager_get_num_switch_points`
//! * `zw_manager_set_switch_point`, `zw_manager_remove_switch_point`
//! * `zw_manager_clear_switch_points`, `zw_manager_get_switch_point`

use crate::buffer::ZwBytes;
use crate::context;
use crate::handle::{ZwManager, ZwValueId};
use crate::result::{envelope, Outcome, Payload, ZwValueResult};
use ozw_core::manager::{Manager, SwitchPoint, Value, ValueKind};
use ozw_core::value_id::ValueId;
use std::ptr::null_mut;

/// Rebuilds the native identifier and wraps the guarded call in an envelope.
fn with_value<T: Payload>(
    manager: *const ZwManager,
    id: ZwValueId,
    function: &'static str,
    f: impl FnOnce(&dyn Manager, &ValueId) -> Outcome<T>,
) -> *mut ZwValueResult {
    let id = ValueId::from(id);
    envelope(manager, function, |m| f(m, &id))
}

macro_rules! value_getter {
    ($($name:ident => $kind:ident;)*) => {
        paste::paste! {$(
            #[doc = concat!("Reads the value as `", stringify!($kind), "`.")]
            #[no_mangle]
            pub extern "C" fn [<zw_manager_get_value_ $name>](manager: *const ZwManager, id: ZwValueId) -> *mut ZwValueResult {
                with_value(manager, id, stringify!([<zw_manager_get_value_ $name>]), |m, id| {
                    Outcome::from_option(m.get_value_as(id, ValueKind::$kind))
                })
            }
        )*}
    };
}

value_getter! {
    as_bool => Bool;
    as_byte => Byte;
    as_float => Float;
    as_int => Int;
    as_short => Short;
    as_string => String;
    as_raw => Raw;
    list_selection_as_string => ListSelection;
    list_selection_as_int => ListValue;
}

macro_rules! value_setter {
    ($($name:ident($ty:ty) => $variant:ident;)*) => {
        paste::paste! {$(
            #[doc = concat!("Writes a `", stringify!($variant), "` value. `is_ok` reports whether it applied.")]
            #[no_mangle]
            pub extern "C" fn [<zw_manager_set_value_ $name>](
                manager: *const ZwManager,
                id: ZwValueId,
                value: $ty,
            ) -> *mut ZwValueResult {
                with_value(manager, id, stringify!([<zw_manager_set_value_ $name>]), |m, id| {
                    Outcome::from_flag(m.set_value(id, Value::$variant(value)))
                })
            }
        )*}
    };
}

value_setter! {
    bool(bool) => Bool;
    byte(u8) => Byte;
    float(f32) => Float;
    int(i32) => Int;
    short(i16) => Short;
}

/// Writes a value from its string form.
///
/// Returns null if the handle is rejected or `value` is not valid UTF-8.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `value` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_set_value_string(
    manager: *const ZwManager,
    id: ZwValueId,
    value: *const libc::c_char,
) -> *mut ZwValueResult {
    let Some(value) = context::checked_str(value, "zw_manager_set_value_string") else {
        return null_mut();
    };
    with_value(manager, id, "zw_manager_set_value_string", |m, id| {
        Outcome::from_flag(m.set_value(id, Value::String(value.to_string())))
    })
}

/// Writes a raw value. The bytes are copied; `value` stays owned by the
/// caller.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `value` points to a valid `ZwBytes`.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_set_value_raw(
    manager: *const ZwManager,
    id: ZwValueId,
    value: *const ZwBytes,
) -> *mut ZwValueResult {
    assert!(!value.is_null(), "called `zw_manager_set_value_raw` with null pointer");
    let bytes = (*value).as_slice().to_vec();
    with_value(manager, id, "zw_manager_set_value_raw", |m, id| {
        Outcome::from_flag(m.set_value(id, Value::Raw(bytes)))
    })
}

/// Selects the list item labelled `item`.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `item` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_set_value_list_selection(
    manager: *const ZwManager,
    id: ZwValueId,
    item: *const libc::c_char,
) -> *mut ZwValueResult {
    let Some(item) = context::checked_str(item, "zw_manager_set_value_list_selection") else {
        return null_mut();
    };
    with_value(manager, id, "zw_manager_set_value_list_selection", |m, id| {
        Outcome::from_flag(m.set_value(id, Value::ListSelection(item.to_string())))
    })
}

/// Labels of a list value's items, in `val_item_list`.
#[no_mangle]
pub extern "C" fn zw_manager_get_value_list_items(manager: *const ZwManager, id: ZwValueId) -> *mut ZwValueResult {
    with_value(manager, id, "zw_manager_get_value_list_items", |m, id| {
        Outcome::from_option(m.get_value_list_items(id))
    })
}

/// Values of a list value's items, in `val_value_list`.
#[no_mangle]
pub extern "C" fn zw_manager_get_value_list_values(manager: *const ZwManager, id: ZwValueId) -> *mut ZwValueResult {
    with_value(manager, id, "zw_manager_get_value_list_values", |m, id| {
        Outcome::from_option(m.get_value_list_values(id))
    })
}

/// Decimal places of a decimal value, in `val_byte`.
#[no_mangle]
pub extern "C" fn zw_manager_get_value_float_precision(manager: *const ZwManager, id: ZwValueId) -> *mut ZwValueResult {
    with_value(manager, id, "zw_manager_get_value_float_precision", |m, id| {
        Outcome::from_option(m.get_value_float_precision(id))
    })
}

macro_rules! value_query {
    ($($name:ident => $method:ident;)*) => {
        paste::paste! {$(
            #[no_mangle]
            pub extern "C" fn [<zw_manager_ $name>](manager: *const ZwManager, id: ZwValueId) -> *mut ZwValueResult {
                with_value(manager, id, stringify!([<zw_manager_ $name>]), |m, id| {
                    Outcome::from_result(m.$method(id))
                })
            }
        )*}
    };
}

value_query! {
    get_value_label => get_value_label;
    get_value_units => get_value_units;
    get_value_help => get_value_help;
    get_value_min => get_value_min;
    get_value_max => get_value_max;
    is_value_read_only => is_value_read_only;
    is_value_write_only => is_value_write_only;
    is_value_set => is_value_set;
    is_value_polled => is_polled;
    get_change_verified => get_change_verified;
}

macro_rules! value_text_setter {
    ($($name:ident => $method:ident;)*) => {
        paste::paste! {$(
            #[doc = concat!("Forwards to the native `", stringify!($method), "`.")]
            ///
            /// Returns null if the handle is rejected or `text` is not valid
            /// UTF-8.
            ///
            /// # Panics
            ///
            /// This function will panic if called with a null pointer.
            ///
            /// # Safety
            ///
            /// This function is unsafe because it dereferences a raw pointer.
            /// The caller must ensure that `text` is a valid NUL-terminated
            /// string.
            #[no_mangle]
            pub unsafe extern "C" fn [<zw_manager_ $name>](
                manager: *const ZwManager,
                id: ZwValueId,
                text: *const libc::c_char,
            ) -> *mut ZwValueResult {
                let function = stringify!([<zw_manager_ $name>]);
                let Some(text) = context::checked_str(text, function) else {
                    return null_mut();
                };
                with_value(manager, id, function, |m, id| Outcome::from_result(m.$method(id, text)))
            }
        )*}
    };
}

value_text_setter! {
    set_value_label => set_value_label;
    set_value_units => set_value_units;
    set_value_help => set_value_help;
}

macro_rules! value_action {
    ($($name:ident => $method:ident;)*) => {
        paste::paste! {$(
            #[no_mangle]
            pub extern "C" fn [<zw_manager_ $name>](manager: *const ZwManager, id: ZwValueId) -> *mut ZwValueResult {
                with_value(manager, id, stringify!([<zw_manager_ $name>]), |m, id| {
                    Outcome::from_flag(m.$method(id))
                })
            }
        )*}
    };
}

value_action! {
    refresh_value => refresh_value;
    press_button => press_button;
    release_button => release_button;
}

/// Turns verification of reported changes on or off for the value.
#[no_mangle]
pub extern "C" fn zw_manager_set_change_verified(
    manager: *const ZwManager,
    id: ZwValueId,
    verify: bool,
) -> *mut ZwValueResult {
    with_value(manager, id, "zw_manager_set_change_verified", |m, id| {
        Outcome::from_result(m.set_change_verified(id, verify))
    })
}

/// Exports `zw_manager_<name>` functions that forward to a manager method
/// taking the value identifier first.
macro_rules! forward_value {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? => $method:ident;
    )*) => {
        paste::paste! {$(
            $(#[$meta])*
            #[no_mangle]
            pub extern "C" fn [<zw_manager_ $name>](
                manager: *const ZwManager,
                id: ZwValueId,
                $($arg: $ty),*
            ) $(-> $ret)? {
                let id = ValueId::from(id);
                context::call(manager, stringify!([<zw_manager_ $name>]), |m| m.$method(&id, $($arg),*))
                    .unwrap_or_default()
            }
        )*}
    };
}

forward_value! {
    /// Polls the value with the given intensity: `1` polls it every cycle,
    /// `n` every n-th cycle.
    fn enable_poll(intensity: u8) -> bool => enable_poll;
    fn disable_poll() -> bool => disable_poll;
    fn is_polled() -> bool => is_polled;
    fn set_poll_intensity(intensity: u8) => set_poll_intensity;
    fn get_poll_intensity() -> u8 => get_poll_intensity;

    fn get_num_switch_points() -> u8 => get_num_switch_points;
    fn remove_switch_point(hours: u8, minutes: u8) -> bool => remove_switch_point;
    fn clear_switch_points() => clear_switch_points;
}

/// Adds a switch point, replacing one at the same time of day.
#[no_mangle]
pub extern "C" fn zw_manager_set_switch_point(
    manager: *const ZwManager,
    id: ZwValueId,
    hours: u8,
    minutes: u8,
    setback: i8,
) -> bool {
    let id = ValueId::from(id);
    let point = SwitchPoint {
        hours,
        minutes,
        setback,
    };
    context::call(manager, "zw_manager_set_switch_point", |m| m.set_switch_point(&id, point)).unwrap_or(false)
}

/// Reads switch point `idx` of a schedule.
///
/// Returns `false` and leaves the outputs untouched if `idx` is past the
/// end of the schedule or the call fails.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// The caller must ensure that the output pointers are valid for writes.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_get_switch_point(
    manager: *const ZwManager,
    id: ZwValueId,
    idx: u8,
    hours: *mut u8,
    minutes: *mut u8,
    setback: *mut i8,
) -> bool {
    assert!(!hours.is_null(), "called `zw_manager_get_switch_point` with null hours pointer");
    assert!(!minutes.is_null(), "called `zw_manager_get_switch_point` with null minutes pointer");
    assert!(!setback.is_null(), "called `zw_manager_get_switch_point` with null setback pointer");
    let id = ValueId::from(id);
    match context::call(manager, "zw_manager_get_switch_point", |m| m.get_switch_point(&id, idx)).flatten() {
        Some(point) => {
            *hours = point.hours;
            *minutes = point.minutes;
            *setback = point.setback;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{zw_bytes_empty, zw_bytes_free, zw_bytes_init, zw_bytes_set, zw_string_list_at, zw_int_list_at};
    use crate::context::test_support::Network;
    use crate::handle::{zw_value_id_new, ZwValueGenre, ZwValueType};
    use crate::result::{zw_value_result_free, ZwErrorKind};
    use ozw_virtual::inventory::{
        CC_CLIMATE_CONTROL_SCHEDULE, CC_SENSOR_MULTILEVEL, CC_SWITCH_BINARY, CC_THERMOSTAT_MODE, CC_USER_CODE,
        SENSOR_NODE_ID, SWITCH_NODE_ID, THERMOSTAT_NODE_ID,
    };

    fn switch(net: &Network) -> ZwValueId {
        zw_value_id_new(net.home_id, SWITCH_NODE_ID, ZwValueGenre::User as i32, CC_SWITCH_BINARY, 1, 0, ZwValueType::Bool as i32)
    }

    fn mode(net: &Network) -> ZwValueId {
        zw_value_id_new(
            net.home_id,
            THERMOSTAT_NODE_ID,
            ZwValueGenre::User as i32,
            CC_THERMOSTAT_MODE,
            1,
            0,
            ZwValueType::List as i32,
        )
    }

    fn temperature(net: &Network) -> ZwValueId {
        zw_value_id_new(
            net.home_id,
            SENSOR_NODE_ID,
            ZwValueGenre::User as i32,
            CC_SENSOR_MULTILEVEL,
            1,
            1,
            ZwValueType::Decimal as i32,
        )
    }

    fn schedule(net: &Network) -> ZwValueId {
        zw_value_id_new(
            net.home_id,
            THERMOSTAT_NODE_ID,
            ZwValueGenre::User as i32,
            CC_CLIMATE_CONTROL_SCHEDULE,
            1,
            1,
            ZwValueType::Schedule as i32,
        )
    }

    #[test]
    fn test_set_then_get_bool() {
        let net = Network::start();
        unsafe {
            let set = zw_manager_set_value_bool(net.manager, switch(&net), true);
            assert!((*set).is_ok);
            zw_value_result_free(set);

            let get = zw_manager_get_value_as_bool(net.manager, switch(&net));
            assert!((*get).is_ok);
            assert!((*get).val_bool);
            zw_value_result_free(get);
        }
    }

    #[test]
    fn test_typed_read_of_wrong_type_raises() {
        let net = Network::start();
        unsafe {
            let r = zw_manager_get_value_as_int(net.manager, switch(&net));
            assert!((*r).is_err);
            assert!(!(*r).is_ok);
            assert_eq!((*r).err_kind, ZwErrorKind::CannotConvertValueId);
            assert!((*(*r).err_msg).length > 0);
            zw_value_result_free(r);
        }
    }

    #[test]
    fn test_read_only_write_is_not_applicable() {
        let net = Network::start();
        unsafe {
            let r = zw_manager_set_value_float(net.manager, temperature(&net), 30.0);
            assert!(!(*r).is_ok);
            assert!(!(*r).is_err);
            zw_value_result_free(r);
        }
    }

    #[test]
    fn test_any_value_reads_as_string() {
        let net = Network::start();
        unsafe {
            let r = zw_manager_get_value_as_string(net.manager, temperature(&net));
            assert!((*r).is_ok);
            assert_eq!((*(*r).val_string).as_bytes(), b"21.5");
            zw_value_result_free(r);
        }
    }

    #[test]
    fn test_list_selection_and_items() {
        let net = Network::start();
        unsafe {
            let set = zw_manager_set_value_list_selection(net.manager, mode(&net), b"Cool\0".as_ptr().cast());
            assert!((*set).is_ok);
            zw_value_result_free(set);

            let label = zw_manager_get_value_list_selection_as_string(net.manager, mode(&net));
            assert_eq!((*(*label).val_string).as_bytes(), b"Cool");
            zw_value_result_free(label);

            let value = zw_manager_get_value_list_selection_as_int(net.manager, mode(&net));
            assert_eq!((*value).val_int, 2);
            zw_value_result_free(value);

            let items = zw_manager_get_value_list_items(net.manager, mode(&net));
            let list = (*items).val_item_list;
            assert_eq!((*list).length, 4);
            assert_eq!((*zw_string_list_at(list, 3)).as_bytes(), b"Auto");
            zw_value_result_free(items);

            let values = zw_manager_get_value_list_values(net.manager, mode(&net));
            assert_eq!(zw_int_list_at((*values).val_value_list, 1), 1);
            zw_value_result_free(values);

            let missing = zw_manager_set_value_list_selection(net.manager, mode(&net), b"Dry\0".as_ptr().cast());
            assert!(!(*missing).is_ok);
            assert!(!(*missing).is_err);
            zw_value_result_free(missing);
        }
    }

    #[test]
    fn test_raw_write_copies_caller_bytes() {
        let net = Network::start();
        let code = zw_value_id_new(net.home_id, THERMOSTAT_NODE_ID, ZwValueGenre::User as i32, CC_USER_CODE, 1, 1, ZwValueType::Raw as i32);
        unsafe {
            let bytes = zw_bytes_empty();
            zw_bytes_init(bytes, 2);
            zw_bytes_set(bytes, 0, 0x39);
            zw_bytes_set(bytes, 1, 0x38);
            let set = zw_manager_set_value_raw(net.manager, code, bytes);
            assert!((*set).is_ok);
            zw_value_result_free(set);
            zw_bytes_free(bytes);

            let get = zw_manager_get_value_as_raw(net.manager, code);
            assert_eq!((*(*get).val_raw).as_slice(), &[0x39, 0x38]);
            zw_value_result_free(get);
        }
    }

    #[test]
    fn test_metadata_envelopes() {
        let net = Network::start();
        unsafe {
            let label = zw_manager_get_value_label(net.manager, temperature(&net));
            assert_eq!((*(*label).val_string).as_bytes(), b"Temperature");
            zw_value_result_free(label);

            let read_only = zw_manager_is_value_read_only(net.manager, temperature(&net));
            assert!((*read_only).is_ok);
            assert!((*read_only).val_bool);
            zw_value_result_free(read_only);

            let precision = zw_manager_get_value_float_precision(net.manager, temperature(&net));
            assert_eq!((*precision).val_byte, 1);
            zw_value_result_free(precision);

            let set = zw_manager_set_value_units(net.manager, temperature(&net), b"F\0".as_ptr().cast());
            assert!((*set).is_ok);
            zw_value_result_free(set);
            let units = zw_manager_get_value_units(net.manager, temperature(&net));
            assert_eq!((*(*units).val_string).as_bytes(), b"F");
            zw_value_result_free(units);
        }
    }

    #[test]
    fn test_polling() {
        let net = Network::start();
        assert!(!zw_manager_is_polled(net.manager, switch(&net)));
        assert!(zw_manager_enable_poll(net.manager, switch(&net), 2));
        assert!(zw_manager_is_polled(net.manager, switch(&net)));
        assert_eq!(zw_manager_get_poll_intensity(net.manager, switch(&net)), 2);
        assert!(zw_manager_disable_poll(net.manager, switch(&net)));
        assert!(!zw_manager_is_polled(net.manager, switch(&net)));
    }

    #[test]
    fn test_switch_points() {
        let net = Network::start();
        let id = schedule(&net);
        assert_eq!(zw_manager_get_num_switch_points(net.manager, id), 2);
        assert!(zw_manager_set_switch_point(net.manager, id, 12, 0, 5));
        assert_eq!(zw_manager_get_num_switch_points(net.manager, id), 3);

        let (mut hours, mut minutes, mut setback) = (0u8, 0u8, 0i8);
        unsafe {
            assert!(zw_manager_get_switch_point(net.manager, id, 1, &mut hours, &mut minutes, &mut setback));
            assert_eq!((hours, minutes, setback), (12, 0, 5));
            assert!(!zw_manager_get_switch_point(net.manager, id, 3, &mut hours, &mut minutes, &mut setback));
        }

        assert!(zw_manager_remove_switch_point(net.manager, id, 12, 0));
        zw_manager_clear_switch_points(net.manager, id);
        assert_eq!(zw_manager_get_num_switch_points(net.manager, id), 0);
    }

    #[test]
    fn test_unknown_value_raises_invalid_value_id() {
        let net = Network::start();
        let unknown = zw_value_id_new(net.home_id, SWITCH_NODE_ID, ZwValueGenre::User as i32, 0x99, 1, 0, ZwValueType::Bool as i32);
        unsafe {
            let r = zw_manager_get_value_as_bool(net.manager, unknown);
            assert!((*r).is_err);
            assert_eq!((*r).err_kind, ZwErrorKind::InvalidValueId);
            zw_value_result_free(r);
        }
    }
}
