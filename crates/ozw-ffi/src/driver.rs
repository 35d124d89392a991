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

//! # Drivers
//!
//! ## Overview
//!
//! A driver binds one controller, reached through a serial or HID path, to
//! the home network it reports. Drivers start asynchronously: success of
//! `zw_manager_add_driver` only means the driver was accepted, readiness is
//! reported by a `DriverReady` notification.
//!
//! ## Exported Functions
//!
//! * `zw_manager_add_driver`
//! * `zw_manager_remove_driver`
//! * `zw_manager_get_controller_node_id`
//! * `zw_manager_get_suc_node_id`
//! * `zw_manager_is_primary_controller`
//! * `zw_manager_is_static_update_controller`
//! * `zw_manager_is_bridge_controller`
//! * `zw_manager_get_library_version`
//! * `zw_manager_get_library_type_name`
//! * `zw_manager_get_send_queue_count`
//! * `zw_manager_log_driver_statistics`
//! * `zw_manager_get_controller_interface_type`
//! * `zw_manager_get_controller_path`
//! * `zw_manager_get_driver_statistics`

use crate::context;
use crate::handle::ZwManager;
use ozw_core::manager::{ControllerInterface, DriverStatistics};

mirror_enum! {
    /// Physical interface of a controller.
    pub enum ZwControllerInterface mirrors ControllerInterface {
        Unknown = 0,
        Serial = 1,
        Hid = 2,
    }
}

/// Serial link counters of a driver.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZwDriverStatistics {
    pub sof_count: u32,
    pub ack_waiting: u32,
    pub read_aborts: u32,
    pub bad_checksum: u32,
    pub read_count: u32,
    pub write_count: u32,
    pub can_count: u32,
    pub nak_count: u32,
    pub ack_count: u32,
    pub oof_count: u32,
    pub dropped: u32,
    pub retries: u32,
    pub callbacks: u32,
    pub bad_routes: u32,
    pub no_ack: u32,
    pub net_busy: u32,
    pub not_idle: u32,
    pub non_delivery: u32,
    pub routed_busy: u32,
    pub broadcast_read_count: u32,
    pub broadcast_write_count: u32,
}

impl From<DriverStatistics> for ZwDriverStatistics {
    fn from(s: DriverStatistics) -> Self {
        Self {
            sof_count: s.sof_count,
            ack_waiting: s.ack_waiting,
            read_aborts: s.read_aborts,
            bad_checksum: s.bad_checksum,
            read_count: s.read_count,
            write_count: s.write_count,
            can_count: s.can_count,
            nak_count: s.nak_count,
            ack_count: s.ack_count,
            oof_count: s.oof_count,
            dropped: s.dropped,
            retries: s.retries,
            callbacks: s.callbacks,
            bad_routes: s.bad_routes,
            no_ack: s.no_ack,
            net_busy: s.net_busy,
            not_idle: s.not_idle,
            non_delivery: s.non_delivery,
            routed_busy: s.routed_busy,
            broadcast_read_count: s.broadcast_read_count,
            broadcast_write_count: s.broadcast_write_count,
        }
    }
}

/// Starts a driver for the controller at `controller_path`.
///
/// Returns `false` if a driver for the path already exists or the call
/// fails.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `controller_path` is a valid NUL-terminated
/// string.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_add_driver(
    manager: *const ZwManager,
    controller_path: *const libc::c_char,
    interface: i32,
) -> bool {
    let Some(interface) = ZwControllerInterface::from_raw(interface, "zw_manager_add_driver") else {
        return false;
    };
    let Some(path) = context::checked_str(controller_path, "zw_manager_add_driver") else {
        return false;
    };
    context::call(manager, "zw_manager_add_driver", |m| m.add_driver(path, interface.into())).unwrap_or(false)
}

/// Stops the driver for the controller at `controller_path`.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `controller_path` is a valid NUL-terminated
/// string.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_remove_driver(manager: *const ZwManager, controller_path: *const libc::c_char) -> bool {
    let Some(path) = context::checked_str(controller_path, "zw_manager_remove_driver") else {
        return false;
    };
    context::call(manager, "zw_manager_remove_driver", |m| m.remove_driver(path)).unwrap_or(false)
}

forward! {
    fn get_controller_node_id(home_id: u32) -> u8 => get_controller_node_id;
    fn get_suc_node_id(home_id: u32) -> u8 => get_suc_node_id;
    fn is_primary_controller(home_id: u32) -> bool => is_primary_controller;
    fn is_static_update_controller(home_id: u32) -> bool => is_static_update_controller;
    fn is_bridge_controller(home_id: u32) -> bool => is_bridge_controller;

    /// Messages waiting to be sent, or `0` on failure.
    fn get_send_queue_count(home_id: u32) -> i32 => get_send_queue_count;

    /// Writes the driver statistics to the log.
    fn log_driver_statistics(home_id: u32) => log_driver_statistics;
}

forward_string! {
    fn get_library_version(home_id: u32) => get_library_version;
    fn get_library_type_name(home_id: u32) => get_library_type_name;
    fn get_controller_path(home_id: u32) => get_controller_path;
}

/// Interface of the controller, or `Unknown` on failure.
#[no_mangle]
pub extern "C" fn zw_manager_get_controller_interface_type(manager: *const ZwManager, home_id: u32) -> ZwControllerInterface {
    context::call(manager, "zw_manager_get_controller_interface_type", |m| {
        m.get_controller_interface_type(home_id)
    })
    .unwrap_or_default()
    .into()
}

/// Copies the driver statistics into `out`.
///
/// Returns `false` and leaves `out` untouched on failure.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that `out` is valid for writes.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_get_driver_statistics(
    manager: *const ZwManager,
    home_id: u32,
    out: *mut ZwDriverStatistics,
) -> bool {
    assert!(!out.is_null(), "called `zw_manager_get_driver_statistics` with null pointer");
    match context::call(manager, "zw_manager_get_driver_statistics", |m| m.get_driver_statistics(home_id)) {
        Some(statistics) => {
            *out = statistics.into();
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::zw_string_free;
    use crate::context::test_support::Network;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_second_driver_on_same_path_is_refused() {
        let net = Network::start();
        unsafe {
            assert!(!zw_manager_add_driver(net.manager, b"usb\0".as_ptr().cast(), ZwControllerInterface::Serial as i32));
            assert!(zw_manager_add_driver(net.manager, b"hid0\0".as_ptr().cast(), ZwControllerInterface::Hid as i32));
            assert!(zw_manager_remove_driver(net.manager, b"hid0\0".as_ptr().cast()));
            assert!(!zw_manager_remove_driver(net.manager, b"hid0\0".as_ptr().cast()));
        }
    }

    #[test]
    fn test_invalid_utf8_path_is_rejected() {
        let net = Network::start();
        unsafe {
            assert!(!zw_manager_add_driver(net.manager, b"\xff\0".as_ptr().cast(), ZwControllerInterface::Serial as i32));
        }
    }

    #[test]
    fn test_controller_queries() {
        let net = Network::start();
        assert_eq!(zw_manager_get_controller_node_id(net.manager, net.home_id), 1);
        assert!(zw_manager_is_primary_controller(net.manager, net.home_id));
        assert_eq!(
            zw_manager_get_controller_interface_type(net.manager, net.home_id),
            ZwControllerInterface::Serial
        );
        unsafe {
            let path = zw_manager_get_controller_path(net.manager, net.home_id);
            assert_eq!((*path).as_bytes(), b"usb");
            zw_string_free(path);
        }
    }

    #[test]
    fn test_unknown_home_yields_neutral_values() {
        let net = Network::start();
        let other = net.home_id ^ 0xffff_ffff;
        assert_eq!(zw_manager_get_controller_node_id(net.manager, other), 0);
        assert!(!zw_manager_is_primary_controller(net.manager, other));
        assert!(zw_manager_get_library_version(net.manager, other).is_null());
        assert_eq!(
            zw_manager_get_controller_interface_type(net.manager, other),
            ZwControllerInterface::Unknown
        );
    }

    #[test]
    fn test_driver_statistics_out_param() {
        let net = Network::start();
        let mut stats = ZwDriverStatistics::default();
        unsafe {
            assert!(zw_manager_get_driver_statistics(net.manager, net.home_id, &mut stats));
            let before = stats;
            assert!(!zw_manager_get_driver_statistics(net.manager, net.home_id ^ 1, &mut stats));
            assert_eq!(stats, before);
        }
    }

    #[test]
    fn test_out_of_range_interface_is_refused() {
        let net = Network::start();
        unsafe {
            assert!(!zw_manager_add_driver(net.manager, b"ttyS9\0".as_ptr().cast(), 7));
            assert!(!zw_manager_add_driver(net.manager, b"ttyS9\0".as_ptr().cast(), -1));
            assert!(!zw_manager_remove_driver(net.manager, b"ttyS9\0".as_ptr().cast()));
        }
    }
}
