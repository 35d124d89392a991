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

//! # Scenes
//!
//! ## Overview
//!
//! A scene is a numbered set of value assignments applied together by
//! `zw_manager_activate_scene`. Scene ids start at 1; `0` means "no scene".
//! Scenes span every home network of the manager.
//!
//! Adding and setting scene values return `false` on failure. Reading a
//! stored scene value returns a `ZwValueResult` envelope, like reading a
//! live value.
//!
//! ## Exported Functions
//!
//! * `zw_manager_get_num_scenes`, `zw_manager_get_all_scenes`
//! * `zw_manager_remove_all_scenes`, `zw_manager_create_scene`,
//!   `zw_manager_remove_scene`
//! * `zw_manager_add_scene_value_{bool,byte,float,int,short,string}`,
//!   `zw_manager_add_scene_value_list_selection_{string,int}`
//! * `zw_manager_set_scene_value_{bool,byte,float,int,short,string}`,
//!   `zw_manager_set_scene_value_list_selection_{string,int}`
//! * `zw_manager_remove_scene_value`
//! * `zw_manager_scene_get_values`
//! * `zw_manager_scene_get_value_as_{bool,byte,float,int,short,string}`,
//!   `zw_manager_scene_get_value_list_selection_{string,int}`
//! * `zw_manager_get_scene_label`, `zw_manager_set_scene_label`
//! * `zw_manager_scene_exists`, `zw_manager_activate_scene`

use crate::buffer::ZwBytes;
use crate::context;
use crate::handle::{ZwManager, ZwValueId};
use crate::result::{envelope, Outcome, ZwValueResult};
use ozw_core::manager::{Manager, Value, ValueKind};
use ozw_core::value_id::ValueId;
use std::ptr::null_mut;

forward! {
    fn get_num_scenes() -> u8 => get_num_scenes;
    fn remove_all_scenes(home_id: u32) => remove_all_scenes;

    /// Creates an empty scene and returns its id, or `0` if none is free.
    fn create_scene() -> u8 => create_scene;
    fn remove_scene(scene_id: u8) -> bool => remove_scene;
    fn scene_exists(scene_id: u8) -> bool => scene_exists;

    /// Applies every assignment of the scene. Returns `false` if the scene
    /// does not exist or an assignment did not apply.
    fn activate_scene(scene_id: u8) -> bool => activate_scene;
}

forward_string! {
    fn get_scene_label(scene_id: u8) => get_scene_label;
}

/// Ids of every scene. Free the result with `zw_bytes_free`. Returns null
/// on failure.
#[no_mangle]
pub extern "C" fn zw_manager_get_all_scenes(manager: *const ZwManager) -> *mut ZwBytes {
    context::call(manager, "zw_manager_get_all_scenes", |m| m.get_all_scenes()).map_or(null_mut(), ZwBytes::new_owned)
}

/// Sets the label of a scene.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `label` is a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_set_scene_label(manager: *const ZwManager, scene_id: u8, label: *const libc::c_char) {
    if let Some(label) = context::checked_str(label, "zw_manager_set_scene_label") {
        context::call(manager, "zw_manager_set_scene_label", |m| m.set_scene_label(scene_id, label));
    }
}

fn write_scene_value(
    manager: *const ZwManager,
    function: &'static str,
    id: ZwValueId,
    f: impl FnOnce(&dyn Manager, &ValueId) -> ozw_core::exception::NativeResult<bool>,
) -> bool {
    let id = ValueId::from(id);
    context::call(manager, function, |m| f(m, &id)).unwrap_or(false)
}

macro_rules! scene_value_writer {
    ($($name:ident($ty:ty) => $variant:ident;)*) => {
        paste::paste! {$(
            #[doc = concat!("Adds a `", stringify!($variant), "` assignment to the scene. Returns `false` if the value is already part of it.")]
            #[no_mangle]
            pub extern "C" fn [<zw_manager_add_scene_value_ $name>](
                manager: *const ZwManager,
                scene_id: u8,
                id: ZwValueId,
                value: $ty,
            ) -> bool {
                write_scene_value(manager, stringify!([<zw_manager_add_scene_value_ $name>]), id, |m, id| {
                    m.add_scene_value(scene_id, id, Value::$variant(value))
                })
            }

            #[doc = concat!("Replaces a `", stringify!($variant), "` assignment of the scene. Returns `false` if the value is not part of it.")]
            #[no_mangle]
            pub extern "C" fn [<zw_manager_set_scene_value_ $name>](
                manager: *const ZwManager,
                scene_id: u8,
                id: ZwValueId,
                value: $ty,
            ) -> bool {
                write_scene_value(manager, stringify!([<zw_manager_set_scene_value_ $name>]), id, |m, id| {
                    m.set_scene_value(scene_id, id, Value::$variant(value))
                })
            }
        )*}
    };
}

scene_value_writer! {
    bool(bool) => Bool;
    byte(u8) => Byte;
    float(f32) => Float;
    int(i32) => Int;
    short(i16) => Short;
    list_selection_int(i32) => ListValue;
}

macro_rules! scene_text_writer {
    ($($name:ident => $variant:ident;)*) => {
        paste::paste! {$(
            /// Adds a text assignment to the scene.
            ///
            /// # Panics
            ///
            /// This function will panic if called with a null pointer.
            ///
            /// # Safety
            ///
            /// This function is unsafe because it dereferences a raw pointer.
            /// The caller must ensure that `value` is a valid NUL-terminated
            /// string.
            #[no_mangle]
            pub unsafe extern "C" fn [<zw_manager_add_scene_value_ $name>](
                manager: *const ZwManager,
                scene_id: u8,
                id: ZwValueId,
                value: *const libc::c_char,
            ) -> bool {
                let function = stringify!([<zw_manager_add_scene_value_ $name>]);
                let Some(value) = context::checked_str(value, function) else {
                    return false;
                };
                write_scene_value(manager, function, id, |m, id| {
                    m.add_scene_value(scene_id, id, Value::$variant(value.to_string()))
                })
            }

            /// Replaces a text assignment of the scene.
            ///
            /// # Panics
            ///
            /// This function will panic if called with a null pointer.
            ///
            /// # Safety
            ///
            /// This function is unsafe because it dereferences a raw pointer.
            /// The caller must ensure that `value` is a valid NUL-terminated
            /// string.
            #[no_mangle]
            pub unsafe extern "C" fn [<zw_manager_set_scene_value_ $name>](
                manager: *const ZwManager,
                scene_id: u8,
                id: ZwValueId,
                value: *const libc::c_char,
            ) -> bool {
                let function = stringify!([<zw_manager_set_scene_value_ $name>]);
                let Some(value) = context::checked_str(value, function) else {
                    return false;
                };
                write_scene_value(manager, function, id, |m, id| {
                    m.set_scene_value(scene_id, id, Value::$variant(value.to_string()))
                })
            }
        )*}
    };
}

scene_text_writer! {
    string => String;
    list_selection_string => ListSelection;
}

/// Removes a value from the scene.
#[no_mangle]
pub extern "C" fn zw_manager_remove_scene_value(manager: *const ZwManager, scene_id: u8, id: ZwValueId) -> bool {
    write_scene_value(manager, "zw_manager_remove_scene_value", id, |m, id| {
        m.remove_scene_value(scene_id, id)
    })
}

/// Copies up to `capacity` value ids of the scene into `out` and returns
/// the number of values in the scene.
///
/// Call with a `capacity` of zero to query the count; `out` may then be
/// null. Returns `0` on failure.
///
/// # Panics
///
/// This function will panic if `capacity` is non-zero and `out` is null.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `out` is valid for `capacity` writes.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_scene_get_values(
    manager: *const ZwManager,
    scene_id: u8,
    out: *mut ZwValueId,
    capacity: usize,
) -> usize {
    assert!(
        capacity == 0 || !out.is_null(),
        "called `zw_manager_scene_get_values` with null pointer"
    );
    let Some(ids) = context::call(manager, "zw_manager_scene_get_values", |m| m.scene_get_values(scene_id)) else {
        return 0;
    };
    for (i, id) in ids.iter().take(capacity).enumerate() {
        *out.add(i) = ZwValueId::from(id);
    }
    ids.len()
}

macro_rules! scene_value_reader {
    ($($name:ident => $kind:ident;)*) => {
        paste::paste! {$(
            #[doc = concat!("Reads a stored scene assignment as `", stringify!($kind), "`.")]
            #[no_mangle]
            pub extern "C" fn [<zw_manager_scene_get_ $name>](
                manager: *const ZwManager,
                scene_id: u8,
                id: ZwValueId,
            ) -> *mut ZwValueResult {
                let id = ValueId::from(id);
                envelope(manager, stringify!([<zw_manager_scene_get_ $name>]), |m| {
                    Outcome::from_option(m.scene_get_value_as(scene_id, &id, ValueKind::$kind))
                })
            }
        )*}
    };
}

scene_value_reader! {
    value_as_bool => Bool;
    value_as_byte => Byte;
    value_as_float => Float;
    value_as_int => Int;
    value_as_short => Short;
    value_as_string => String;
    value_list_selection_string => ListSelection;
    value_list_selection_int => ListValue;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::zw_bytes_free;
    use crate::context::test_support::Network;
    use crate::handle::{zw_value_id_new, ZwValueGenre, ZwValueType};
    use crate::result::{zw_value_result_free, ZwErrorKind};
    use crate::value::zw_manager_get_value_as_bool;
    use ozw_virtual::inventory::{CC_SWITCH_BINARY, CC_THERMOSTAT_MODE, SWITCH_NODE_ID, THERMOSTAT_NODE_ID};

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

    #[test]
    fn test_scene_lifecycle_and_activation() {
        let net = Network::start();
        let scene = zw_manager_create_scene(net.manager);
        assert_eq!(scene, 1);
        assert!(zw_manager_scene_exists(net.manager, scene));
        assert!(zw_manager_add_scene_value_bool(net.manager, scene, switch(&net), true));
        assert!(!zw_manager_add_scene_value_bool(net.manager, scene, switch(&net), true));
        unsafe {
            assert!(zw_manager_add_scene_value_list_selection_string(
                net.manager,
                scene,
                mode(&net),
                b"Auto\0".as_ptr().cast()
            ));
        }

        assert!(zw_manager_activate_scene(net.manager, scene));
        unsafe {
            let r = zw_manager_get_value_as_bool(net.manager, switch(&net));
            assert!((*r).val_bool);
            zw_value_result_free(r);
        }

        assert!(zw_manager_remove_scene(net.manager, scene));
        assert!(!zw_manager_scene_exists(net.manager, scene));
    }

    #[test]
    fn test_scene_get_values_copies_up_to_capacity() {
        let net = Network::start();
        let scene = zw_manager_create_scene(net.manager);
        assert!(zw_manager_add_scene_value_bool(net.manager, scene, switch(&net), false));
        assert!(zw_manager_add_scene_value_list_selection_int(net.manager, scene, mode(&net), 3));

        let mut ids = [ZwValueId::default(); 1];
        unsafe {
            assert_eq!(zw_manager_scene_get_values(net.manager, scene, null_mut(), 0), 2);
            assert_eq!(zw_manager_scene_get_values(net.manager, scene, ids.as_mut_ptr(), ids.len()), 2);
        }
        assert_eq!(ids[0], switch(&net));
    }

    #[test]
    fn test_scene_value_envelopes() {
        let net = Network::start();
        let scene = zw_manager_create_scene(net.manager);
        assert!(zw_manager_add_scene_value_list_selection_int(net.manager, scene, mode(&net), 2));
        assert!(zw_manager_set_scene_value_list_selection_int(net.manager, scene, mode(&net), 3));
        unsafe {
            let r = zw_manager_scene_get_value_list_selection_int(net.manager, scene, mode(&net));
            assert!((*r).is_ok);
            assert_eq!((*r).val_int, 3);
            zw_value_result_free(r);

            let absent = zw_manager_scene_get_value_as_bool(net.manager, scene, switch(&net));
            assert!(!(*absent).is_ok);
            assert!(!(*absent).is_err);
            zw_value_result_free(absent);

            let wrong = zw_manager_scene_get_value_as_int(net.manager, scene, switch(&net));
            assert!((*wrong).is_err);
            assert_eq!((*wrong).err_kind, ZwErrorKind::CannotConvertValueId);
            zw_value_result_free(wrong);
        }
    }

    #[test]
    fn test_all_scenes_and_labels() {
        let net = Network::start();
        let a = zw_manager_create_scene(net.manager);
        let b = zw_manager_create_scene(net.manager);
        assert_eq!(zw_manager_get_num_scenes(net.manager), 2);
        unsafe {
            zw_manager_set_scene_label(net.manager, b, b"Evening\0".as_ptr().cast());
            let label = zw_manager_get_scene_label(net.manager, b);
            assert_eq!((*label).as_bytes(), b"Evening");
            crate::buffer::zw_string_free(label);

            let all = zw_manager_get_all_scenes(net.manager);
            assert_eq!((*all).as_slice(), &[a, b]);
            zw_bytes_free(all);
        }
    }
}
