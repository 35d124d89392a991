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

//! # Manager Lifecycle, Controller and Network Commands
//!
//! ## Overview
//!
//! The manager is a process-wide singleton. `zw_manager_create` requires the
//! options to be created and locked; it returns null otherwise, and also
//! while a manager is already live. `zw_manager_destroy` waits for pending
//! notifications to be delivered, invalidates every manager handle and drops
//! every watcher and queue registration.
//!
//! Every other function forwards exactly one native call. Failures follow
//! the boundary's conventions: `false`, `0` or null, with the reason logged.
//!
//! ## Exported Functions
//!
//! ### Construction
//! * `zw_manager_create`
//! * `zw_manager_get`
//! * `zw_manager_destroy`
//! * `zw_manager_get_version_as_string`
//! * `zw_manager_get_version_long_as_string`
//! * `zw_manager_get_version`
//!
//! ### Configuration
//! * `zw_manager_write_config`
//! * `zw_manager_get_options`
//! * `zw_manager_get_poll_interval`
//! * `zw_manager_set_poll_interval`
//!
//! ### Switch All
//! * `zw_manager_switch_all_on`
//! * `zw_manager_switch_all_off`
//!
//! ### Controller Commands
//! * `zw_manager_reset_controller`
//! * `zw_manager_soft_reset`
//! * `zw_manager_cancel_controller_command`
//!
//! ### Network Commands
//! * `zw_manager_test_network_node`, `zw_manager_test_network`
//! * `zw_manager_heal_network_node`, `zw_manager_heal_network`
//! * `zw_manager_add_node`, `zw_manager_remove_node`
//! * `zw_manager_remove_failed_node`, `zw_manager_has_node_failed`
//! * `zw_manager_request_node_neighbor_update`
//! * `zw_manager_assign_return_route`, `zw_manager_delete_all_return_routes`
//! * `zw_manager_send_node_information`
//! * `zw_manager_create_new_primary`, `zw_manager_receive_configuration`
//! * `zw_manager_replace_failed_node`, `zw_manager_transfer_primary_role`
//! * `zw_manager_request_network_update`, `zw_manager_replication_send`
//! * `zw_manager_create_button`, `zw_manager_delete_button`

use crate::buffer::ZwString;
use crate::context;
use crate::handle::{ZwManager, ZwOptions};
use std::ptr::null_mut;

/// Creates the manager singleton and returns its handle.
///
/// Returns null if a manager is already live, or if the options are missing
/// or unlocked. Concurrent callers are serialized: exactly one of them gets
/// the handle.
#[no_mangle]
pub extern "C" fn zw_manager_create() -> *mut ZwManager {
    let _lifecycle = context::lifecycle();
    if !context::manager_handle().is_null() {
        tracing::warn!("manager already exists, destroy it before creating another");
        return null_mut();
    }
    let Some(backend) = context::backend("zw_manager_create") else {
        return null_mut();
    };
    match backend.create_manager() {
        Ok(manager) => context::install_manager(manager),
        Err(exception) => {
            tracing::warn!(
                kind = exception.kind().as_str(),
                message = exception.message(),
                "manager creation refused"
            );
            null_mut()
        }
    }
}

/// Returns the handle of the live manager, or null.
#[no_mangle]
pub extern "C" fn zw_manager_get() -> *mut ZwManager {
    context::manager_handle()
}

/// Destroys the manager singleton. Does nothing if none is live.
///
/// Every manager handle issued so far becomes stale. Watcher hooks are not
/// called after this returns.
#[no_mangle]
pub extern "C" fn zw_manager_destroy() {
    let _lifecycle = context::lifecycle();
    if context::take_manager().is_none() {
        tracing::debug!("no manager to destroy");
        return;
    }
    if let Some(backend) = context::backend("zw_manager_destroy") {
        backend.destroy_manager();
    }
    crate::notification::release_registrations();
}

/// The library version, e.g. `"1.4.0"`. Free it with `zw_string_free`.
///
/// Returns null if no backend is available.
#[no_mangle]
pub extern "C" fn zw_manager_get_version_as_string() -> *mut ZwString {
    context::backend("zw_manager_get_version_as_string")
        .map_or(null_mut(), |backend| ZwString::new_owned(&backend.version_as_string()))
}

/// The long library version. Free it with `zw_string_free`.
///
/// Returns null if no backend is available.
#[no_mangle]
pub extern "C" fn zw_manager_get_version_long_as_string() -> *mut ZwString {
    context::backend("zw_manager_get_version_long_as_string")
        .map_or(null_mut(), |backend| ZwString::new_owned(&backend.version_long_as_string()))
}

/// Writes the major and minor version, or zeros if no backend is available.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers.
/// The caller must ensure that the pointers are valid for writes.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_get_version(major: *mut u16, minor: *mut u16) {
    assert!(!major.is_null(), "called `zw_manager_get_version` with null major pointer");
    assert!(!minor.is_null(), "called `zw_manager_get_version` with null minor pointer");
    let (maj, min) = context::backend("zw_manager_get_version").map_or((0, 0), |backend| backend.version());
    *major = maj;
    *minor = min;
}

/// Returns the handle of the options the manager was created with, or null
/// if `manager` is rejected.
#[no_mangle]
pub extern "C" fn zw_manager_get_options(manager: *const ZwManager) -> *mut ZwOptions {
    match context::manager(manager, "zw_manager_get_options") {
        Some(_) => context::options_handle(),
        None => null_mut(),
    }
}

forward! {
    /// Saves the network configuration of `home_id`.
    fn write_config(home_id: u32) => write_config;

    /// The poll interval in milliseconds.
    fn get_poll_interval() -> i32 => get_poll_interval;

    /// Sets the poll interval. With `interval_between_polls` the interval is
    /// the gap between two polls instead of the length of a full cycle.
    fn set_poll_interval(milliseconds: i32, interval_between_polls: bool) => set_poll_interval;

    fn switch_all_on(home_id: u32) => switch_all_on;
    fn switch_all_off(home_id: u32) => switch_all_off;

    /// Resets the controller and erases its network. The home id survives.
    fn reset_controller(home_id: u32) => reset_controller;
    fn soft_reset(home_id: u32) => soft_reset;
    fn cancel_controller_command(home_id: u32) -> bool => cancel_controller_command;

    fn test_network_node(home_id: u32, node_id: u8, count: u32) => test_network_node;
    fn test_network(home_id: u32, count: u32) => test_network;
    fn heal_network_node(home_id: u32, node_id: u8, do_return_routes: bool) => heal_network_node;
    fn heal_network(home_id: u32, do_return_routes: bool) => heal_network;

    /// Starts inclusion. Progress is reported through `ControllerCommand`
    /// notifications.
    fn add_node(home_id: u32, secure: bool) -> bool => add_node;
    fn remove_node(home_id: u32) -> bool => remove_node;
    fn remove_failed_node(home_id: u32, node_id: u8) -> bool => remove_failed_node;
    fn has_node_failed(home_id: u32, node_id: u8) -> bool => has_node_failed;
    fn request_node_neighbor_update(home_id: u32, node_id: u8) -> bool => request_node_neighbor_update;
    fn assign_return_route(home_id: u32, node_id: u8) -> bool => assign_return_route;
    fn delete_all_return_routes(home_id: u32, node_id: u8) -> bool => delete_all_return_routes;
    fn send_node_information(home_id: u32, node_id: u8) -> bool => send_node_information;
    fn create_new_primary(home_id: u32) -> bool => create_new_primary;
    fn receive_configuration(home_id: u32) -> bool => receive_configuration;
    fn replace_failed_node(home_id: u32, node_id: u8) -> bool => replace_failed_node;
    fn transfer_primary_role(home_id: u32) -> bool => transfer_primary_role;
    fn request_network_update(home_id: u32, node_id: u8) -> bool => request_network_update;
    fn replication_send(home_id: u32, node_id: u8) -> bool => replication_send;
    fn create_button(home_id: u32, node_id: u8, button_id: u8) -> bool => create_button;
    fn delete_button(home_id: u32, node_id: u8, button_id: u8) -> bool => delete_button;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::zw_string_free;
    use crate::context::test_support::{singletons, Network};
    use crate::options::{zw_options_create, zw_options_destroy, zw_options_lock};
    use std::ffi::CStr;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_get_before_create_is_null() {
        let _guard = singletons();
        assert!(zw_manager_get().is_null());
    }

    #[test]
    fn test_create_refused_while_options_unlocked() {
        let _guard = singletons();
        let empty = b"\0".as_ptr().cast();
        unsafe {
            let options = zw_options_create(empty, empty, empty);
            assert!(!options.is_null());
            assert!(zw_manager_create().is_null());
            assert!(zw_options_destroy());
        }
    }

    #[test]
    fn test_double_create_is_refused() {
        let net = Network::start();
        assert_eq!(zw_manager_get(), net.manager);
        assert!(zw_manager_create().is_null());
        assert_eq!(zw_manager_get_options(net.manager), net.options);
    }

    #[test]
    fn test_concurrent_creates_yield_one_live_handle() {
        let _guard = singletons();
        let empty = b"\0".as_ptr().cast();
        unsafe {
            assert!(zw_options_lock(zw_options_create(empty, empty, empty)));
        }
        for _ in 0..20 {
            let barrier = Arc::new(Barrier::new(8));
            let threads: Vec<_> = (0..8)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        zw_manager_create() as usize
                    })
                })
                .collect();
            let created: Vec<usize> = threads
                .into_iter()
                .map(|t| t.join().unwrap())
                .filter(|&handle| handle != 0)
                .collect();
            assert_eq!(created, vec![zw_manager_get() as usize]);

            let handle = created[0] as *mut ZwManager;
            assert_eq!(zw_manager_get_options(handle), crate::options::zw_options_get());
            zw_manager_destroy();
        }
        assert!(zw_options_destroy());
    }

    #[test]
    fn test_destroyed_handle_is_stale() {
        let net = Network::start();
        let stale = net.manager;
        zw_manager_destroy();
        assert!(zw_manager_get().is_null());
        assert_eq!(zw_manager_get_poll_interval(stale), 0);
        assert!(!zw_manager_cancel_controller_command(stale, 1));
        assert!(zw_manager_get_options(stale).is_null());
    }

    #[test]
    fn test_recreated_manager_gets_new_handle() {
        let first = Network::start().manager;
        let net = Network::start();
        assert_ne!(first, net.manager);
    }

    #[test]
    fn test_version() {
        let _guard = singletons();
        unsafe {
            let s = zw_manager_get_version_as_string();
            assert_eq!(CStr::from_ptr((*s).data).to_str().unwrap(), "1.4.0");
            zw_string_free(s);

            let (mut major, mut minor) = (0u16, 0u16);
            zw_manager_get_version(&mut major, &mut minor);
            assert_eq!((major, minor), (1, 4));
        }
    }

    #[test]
    fn test_poll_interval_round_trip() {
        let net = Network::start();
        zw_manager_set_poll_interval(net.manager, 30_000, true);
        assert_eq!(zw_manager_get_poll_interval(net.manager), 30_000);
    }

    #[test]
    fn test_controller_command_on_unknown_home_is_false() {
        let net = Network::start();
        assert!(!zw_manager_add_node(net.manager, net.home_id.wrapping_add(1), false));
        assert!(zw_manager_add_node(net.manager, net.home_id, false));
        assert!(zw_manager_cancel_controller_command(net.manager, net.home_id));
    }
}
