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

//! # Node Information
//!
//! ## Overview
//!
//! Queries and mutations of node metadata, node level commands and
//! configuration parameters. Nodes are addressed by home id and node id.
//! String results are owned `ZwString`s, null on failure.
//!
//! ## Exported Functions
//!
//! ### Queries
//! * `zw_manager_refresh_node_info`, `zw_manager_request_node_state`,
//!   `zw_manager_request_node_dynamic`
//! * `zw_manager_is_node_listening_device`,
//!   `zw_manager_is_node_frequent_listening_device`,
//!   `zw_manager_is_node_beaming_device`, `zw_manager_is_node_routing_device`,
//!   `zw_manager_is_node_security_device`
//! * `zw_manager_get_node_max_baud_rate`, `zw_manager_get_node_version`,
//!   `zw_manager_get_node_security`, `zw_manager_is_node_zwave_plus`
//! * `zw_manager_get_node_basic`, `zw_manager_get_node_generic`,
//!   `zw_manager_get_node_specific`, `zw_manager_get_node_type`
//! * `zw_manager_get_node_neighbors`, `zw_manager_synchronize_node_neighbors`
//! * `zw_manager_get_node_manufacturer_name`,
//!   `zw_manager_get_node_product_name`, `zw_manager_get_node_name`,
//!   `zw_manager_get_node_location`, `zw_manager_get_node_manufacturer_id`,
//!   `zw_manager_get_node_product_type`, `zw_manager_get_node_product_id`
//! * `zw_manager_is_node_info_received`, `zw_manager_get_node_class_information`
//! * `zw_manager_is_node_awake`, `zw_manager_is_node_failed`,
//!   `zw_manager_get_node_query_stage`
//! * `zw_manager_get_node_device_type`, `zw_manager_get_node_device_type_string`,
//!   `zw_manager_get_node_role`, `zw_manager_get_node_role_string`,
//!   `zw_manager_get_node_plus_type`, `zw_manager_get_node_plus_type_string`
//!
//! ### Mutations
//! * `zw_manager_set_node_manufacturer_name`, `zw_manager_set_node_product_name`,
//!   `zw_manager_set_node_name`, `zw_manager_set_node_location`
//! * `zw_manager_set_node_on`, `zw_manager_set_node_off`,
//!   `zw_manager_set_node_level`
//!
//! ### Configuration Parameters
//! * `zw_manager_set_config_param`
//! * `zw_manager_request_config_param`
//! * `zw_manager_request_all_config_params`

use crate::buffer::{ZwBytes, ZwString};
use crate::context;
use crate::handle::ZwManager;
use std::ptr::null_mut;

forward! {
    fn refresh_node_info(home_id: u32, node_id: u8) -> bool => refresh_node_info;
    fn request_node_state(home_id: u32, node_id: u8) -> bool => request_node_state;
    fn request_node_dynamic(home_id: u32, node_id: u8) -> bool => request_node_dynamic;
    fn is_node_listening_device(home_id: u32, node_id: u8) -> bool => is_node_listening_device;
    fn is_node_frequent_listening_device(home_id: u32, node_id: u8) -> bool => is_node_frequent_listening_device;
    fn is_node_beaming_device(home_id: u32, node_id: u8) -> bool => is_node_beaming_device;
    fn is_node_routing_device(home_id: u32, node_id: u8) -> bool => is_node_routing_device;
    fn is_node_security_device(home_id: u32, node_id: u8) -> bool => is_node_security_device;
    fn get_node_max_baud_rate(home_id: u32, node_id: u8) -> u32 => get_node_max_baud_rate;
    fn get_node_version(home_id: u32, node_id: u8) -> u8 => get_node_version;
    fn get_node_security(home_id: u32, node_id: u8) -> u8 => get_node_security;
    fn is_node_zwave_plus(home_id: u32, node_id: u8) -> bool => is_node_zwave_plus;
    fn get_node_basic(home_id: u32, node_id: u8) -> u8 => get_node_basic;
    fn get_node_generic(home_id: u32, node_id: u8) -> u8 => get_node_generic;
    fn get_node_specific(home_id: u32, node_id: u8) -> u8 => get_node_specific;
    fn is_node_info_received(home_id: u32, node_id: u8) -> bool => is_node_info_received;
    fn is_node_awake(home_id: u32, node_id: u8) -> bool => is_node_awake;
    fn is_node_failed(home_id: u32, node_id: u8) -> bool => is_node_failed;
    fn get_node_device_type(home_id: u32, node_id: u8) -> u16 => get_node_device_type;
    fn get_node_role(home_id: u32, node_id: u8) -> u8 => get_node_role;
    fn get_node_plus_type(home_id: u32, node_id: u8) -> u8 => get_node_plus_type;

    /// Reloads the neighbor list from the controller's routing table.
    fn synchronize_node_neighbors(home_id: u32, node_id: u8) => synchronize_node_neighbors;

    /// Turns the node on through its basic command class.
    fn set_node_on(home_id: u32, node_id: u8) => set_node_on;
    fn set_node_off(home_id: u32, node_id: u8) => set_node_off;

    /// Sets the basic level, `0..=99`, or `255` for "last level".
    fn set_node_level(home_id: u32, node_id: u8, level: u8) => set_node_level;

    /// Sets configuration parameter `param` of the node. `size` is the
    /// number of bytes the device stores the value in: 1, 2 or 4.
    fn set_config_param(home_id: u32, node_id: u8, param: u8, value: i32, size: u8) -> bool => set_config_param;
    fn request_config_param(home_id: u32, node_id: u8, param: u8) => request_config_param;
    fn request_all_config_params(home_id: u32, node_id: u8) => request_all_config_params;
}

forward_string! {
    fn get_node_type(home_id: u32, node_id: u8) => get_node_type;
    fn get_node_manufacturer_name(home_id: u32, node_id: u8) => get_node_manufacturer_name;
    fn get_node_product_name(home_id: u32, node_id: u8) => get_node_product_name;
    fn get_node_name(home_id: u32, node_id: u8) => get_node_name;
    fn get_node_location(home_id: u32, node_id: u8) => get_node_location;
    fn get_node_manufacturer_id(home_id: u32, node_id: u8) => get_node_manufacturer_id;
    fn get_node_product_type(home_id: u32, node_id: u8) => get_node_product_type;
    fn get_node_product_id(home_id: u32, node_id: u8) => get_node_product_id;
    fn get_node_query_stage(home_id: u32, node_id: u8) => get_node_query_stage;
    fn get_node_device_type_string(home_id: u32, node_id: u8) => get_node_device_type_string;
    fn get_node_role_string(home_id: u32, node_id: u8) => get_node_role_string;
    fn get_node_plus_type_string(home_id: u32, node_id: u8) => get_node_plus_type_string;
}

macro_rules! node_string_setter {
    ($($name:ident => $method:ident;)*) => {
        paste::paste! {$(
            #[doc = concat!("Forwards to the native `", stringify!($method), "`.")]
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
            pub unsafe extern "C" fn [<zw_manager_ $name>](
                manager: *const ZwManager,
                home_id: u32,
                node_id: u8,
                value: *const libc::c_char,
            ) {
                let function = stringify!([<zw_manager_ $name>]);
                if let Some(value) = context::checked_str(value, function) {
                    context::call(manager, function, |m| m.$method(home_id, node_id, value));
                }
            }
        )*}
    };
}

node_string_setter! {
    set_node_manufacturer_name => set_node_manufacturer_name;
    set_node_product_name => set_node_product_name;
    set_node_name => set_node_name;
    set_node_location => set_node_location;
}

/// Ids of the node's neighbors, in ascending order. Free the result with
/// `zw_bytes_free`. Returns null on failure.
#[no_mangle]
pub extern "C" fn zw_manager_get_node_neighbors(manager: *const ZwManager, home_id: u32, node_id: u8) -> *mut ZwBytes {
    context::call(manager, "zw_manager_get_node_neighbors", |m| m.get_node_neighbors(home_id, node_id))
        .map_or(null_mut(), ZwBytes::new_owned)
}

/// Looks up a command class supported by the node.
///
/// On success copies the class name into the caller's `name`, releasing its
/// previous contents, writes the class version to `version` and returns
/// `true`. Returns `false` and leaves both untouched if the node does not
/// support the class or the call fails.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// The caller must ensure that `name` points to a `ZwString` whose contents
/// were allocated by this library, and that `version` is valid for writes.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_get_node_class_information(
    manager: *const ZwManager,
    home_id: u32,
    node_id: u8,
    command_class_id: u8,
    name: *mut ZwString,
    version: *mut u8,
) -> bool {
    assert!(!name.is_null(), "called `zw_manager_get_node_class_information` with null name pointer");
    assert!(!version.is_null(), "called `zw_manager_get_node_class_information` with null version pointer");
    let info = context::call(manager, "zw_manager_get_node_class_information", |m| {
        m.get_node_class_information(home_id, node_id, command_class_id)
    });
    match info.flatten() {
        Some(info) => {
            (*name).assign(info.name.as_bytes());
            *version = info.version;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{zw_bytes_free, zw_string_free, zw_string_init};
    use crate::context::test_support::Network;
    use ozw_virtual::inventory::{CC_SWITCH_BINARY, CONTROLLER_NODE_ID, SENSOR_NODE_ID, SWITCH_NODE_ID};

    unsafe fn owned(s: *mut ZwString) -> String {
        assert!(!s.is_null());
        let text = String::from_utf8((*s).as_bytes().to_vec()).unwrap();
        zw_string_free(s);
        text
    }

    #[test]
    fn test_node_strings_and_setters() {
        let net = Network::start();
        unsafe {
            assert_eq!(
                owned(zw_manager_get_node_product_name(net.manager, net.home_id, SWITCH_NODE_ID)),
                "Virtual Switch"
            );
            zw_manager_set_node_name(net.manager, net.home_id, SWITCH_NODE_ID, b"Kitchen Lamp\0".as_ptr().cast());
            assert_eq!(
                owned(zw_manager_get_node_name(net.manager, net.home_id, SWITCH_NODE_ID)),
                "Kitchen Lamp"
            );
            assert!(zw_manager_get_node_name(net.manager, net.home_id, 99).is_null());
        }
    }

    #[test]
    fn test_node_flags() {
        let net = Network::start();
        assert!(zw_manager_is_node_listening_device(net.manager, net.home_id, SWITCH_NODE_ID));
        assert!(!zw_manager_is_node_listening_device(net.manager, net.home_id, SENSOR_NODE_ID));
        assert_eq!(zw_manager_get_node_max_baud_rate(net.manager, net.home_id, SWITCH_NODE_ID), 40_000);
        assert!(!zw_manager_is_node_failed(net.manager, net.home_id, 99));
    }

    #[test]
    fn test_sleeping_sensor_neighbors() {
        let net = Network::start();
        unsafe {
            let neighbors = zw_manager_get_node_neighbors(net.manager, net.home_id, SENSOR_NODE_ID);
            assert_eq!((*neighbors).as_slice(), &[CONTROLLER_NODE_ID]);
            zw_bytes_free(neighbors);
        }
    }

    #[test]
    fn test_synchronized_neighbors_match_the_network() {
        let net = Network::start();
        unsafe {
            let before = zw_manager_get_node_neighbors(net.manager, net.home_id, SWITCH_NODE_ID);
            zw_manager_synchronize_node_neighbors(net.manager, net.home_id, SWITCH_NODE_ID);
            zw_manager_synchronize_node_neighbors(net.manager, net.home_id, 99);
            let after = zw_manager_get_node_neighbors(net.manager, net.home_id, SWITCH_NODE_ID);
            assert_eq!((*after).as_slice(), (*before).as_slice());
            assert!((*after).as_slice().contains(&CONTROLLER_NODE_ID));
            zw_bytes_free(before);
            zw_bytes_free(after);

            zw_manager_synchronize_node_neighbors(net.manager, net.home_id, SENSOR_NODE_ID);
            let sensor = zw_manager_get_node_neighbors(net.manager, net.home_id, SENSOR_NODE_ID);
            assert_eq!((*sensor).as_slice(), &[CONTROLLER_NODE_ID]);
            zw_bytes_free(sensor);
        }
    }

    #[test]
    fn test_class_information_fills_caller_buffer() {
        let net = Network::start();
        let mut name = ZwString {
            data: null_mut(),
            length: 0,
        };
        let mut version = 0u8;
        unsafe {
            assert!(zw_manager_get_node_class_information(
                net.manager,
                net.home_id,
                SWITCH_NODE_ID,
                CC_SWITCH_BINARY,
                &mut name,
                &mut version
            ));
            assert_eq!(name.as_bytes(), b"COMMAND_CLASS_SWITCH_BINARY");
            assert_eq!(version, 1);

            assert!(!zw_manager_get_node_class_information(
                net.manager,
                net.home_id,
                SENSOR_NODE_ID,
                CC_SWITCH_BINARY,
                &mut name,
                &mut version
            ));
            assert_eq!(name.as_bytes(), b"COMMAND_CLASS_SWITCH_BINARY");
            zw_string_init(&mut name, 0);
        }
    }

    #[test]
    fn test_config_param_on_unknown_node_is_false() {
        let net = Network::start();
        assert!(!zw_manager_set_config_param(net.manager, net.home_id, 99, 1, 2, 1));
    }
}
