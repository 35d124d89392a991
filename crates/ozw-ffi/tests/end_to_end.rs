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

//! Drives the exported surface the way a C host would.

use ozw_ffi::buffer::{zw_string_free, zw_string_list_at, ZwStringList};
use ozw_ffi::driver::{zw_manager_add_driver, zw_manager_remove_driver, ZwControllerInterface};
use ozw_ffi::handle::{zw_value_id_new, ZwManager, ZwOptions, ZwValueGenre, ZwValueId, ZwValueType};
use ozw_ffi::manager::{zw_manager_create, zw_manager_destroy, zw_manager_get, zw_manager_get_options};
use ozw_ffi::notification::{
    zw_manager_add_queue, zw_manager_add_watcher, zw_manager_remove_queue, zw_manager_remove_watcher,
    zw_notification_free, zw_notification_queue_free, zw_notification_queue_new, zw_notification_queue_poll,
    ZwNotificationType,
};
use ozw_ffi::context::set_backend;
use ozw_ffi::options::{
    zw_options_add_string, zw_options_create, zw_options_destroy, zw_options_get, zw_options_get_as_string,
    zw_options_lock,
};
use ozw_ffi::result::{zw_value_result_free, ZwErrorKind, ZwValueResult};
use ozw_ffi::value::{
    zw_manager_get_value_as_bool, zw_manager_get_value_list_items, zw_manager_get_value_units,
    zw_manager_set_value_bool, zw_manager_set_value_float,
};
use ozw_virtual::driver::home_id_for_path;
use ozw_virtual::VirtualBackend;
use ozw_virtual::inventory::{
    CC_SENSOR_MULTILEVEL, CC_SWITCH_BINARY, CC_THERMOSTAT_MODE, SENSOR_NODE_ID, SWITCH_NODE_ID, THERMOSTAT_NODE_ID,
};
use pretty_assertions::assert_eq;
use parking_lot::{const_mutex, Mutex, MutexGuard};
use std::ffi::{c_char, c_void, CStr};
use std::sync::Arc;
use std::time::{Duration, Instant};

static SERIAL: Mutex<()> = const_mutex(());

struct Host {
    options: *mut ZwOptions,
    manager: *mut ZwManager,
    home_id: u32,
    _guard: MutexGuard<'static, ()>,
}

impl Host {
    fn start() -> Self {
        let guard = SERIAL.lock();
        set_backend(Arc::new(VirtualBackend)).unwrap();
        let empty = b"\0".as_ptr().cast();
        unsafe {
            let options = zw_options_create(empty, empty, empty);
            assert!(!options.is_null());
            assert!(zw_options_lock(options));
            let manager = zw_manager_create();
            assert!(!manager.is_null());
            assert!(zw_manager_add_driver(manager, b"/dev/ttyACM0\0".as_ptr().cast(), ZwControllerInterface::Serial as i32));
            Self {
                options,
                manager,
                home_id: home_id_for_path("/dev/ttyACM0"),
                _guard: guard,
            }
        }
    }

    fn switch(&self) -> ZwValueId {
        zw_value_id_new(self.home_id, SWITCH_NODE_ID, ZwValueGenre::User as i32, CC_SWITCH_BINARY, 1, 0, ZwValueType::Bool as i32)
    }

    fn temperature(&self) -> ZwValueId {
        zw_value_id_new(
            self.home_id,
            SENSOR_NODE_ID,
            ZwValueGenre::User as i32,
            CC_SENSOR_MULTILEVEL,
            1,
            1,
            ZwValueType::Decimal as i32,
        )
    }

    fn mode(&self) -> ZwValueId {
        zw_value_id_new(
            self.home_id,
            THERMOSTAT_NODE_ID,
            ZwValueGenre::User as i32,
            CC_THERMOSTAT_MODE,
            1,
            0,
            ZwValueType::List as i32,
        )
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        zw_manager_destroy();
        zw_options_destroy();
    }
}

fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

unsafe fn take(result: *mut ZwValueResult) -> ZwValueResult {
    assert!(!result.is_null());
    let copy = ZwValueResult {
        is_ok: (*result).is_ok,
        val_bool: (*result).val_bool,
        is_err: (*result).is_err,
        err_kind: (*result).err_kind,
        ..Default::default()
    };
    zw_value_result_free(result);
    copy
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Delivery {
    kind: u8,
    home_id: u32,
    node_id: u8,
    value_id: ZwValueId,
}

static DELIVERIES: Mutex<Vec<(usize, Delivery)>> = const_mutex(Vec::new());

unsafe extern "C" fn on_notification(
    kind: u8,
    home_id: u32,
    node_id: u8,
    value_id: ZwValueId,
    _byte: u8,
    _event: u8,
    _command: u8,
    _user_alert: u8,
    _com_port: *const c_char,
    _com_port_len: usize,
    context: *mut c_void,
) {
    DELIVERIES.lock().push((
        context as usize,
        Delivery {
            kind,
            home_id,
            node_id,
            value_id,
        },
    ));
}

fn value_changes_for(context: usize) -> Vec<Delivery> {
    DELIVERIES
        .lock()
        .iter()
        .filter(|(c, d)| *c == context && d.kind == ZwNotificationType::ValueChanged as u8)
        .map(|(_, d)| *d)
        .collect()
}

#[test]
fn test_configured_network_starts_and_stops() {
    let _serial = SERIAL.lock();
    set_backend(Arc::new(VirtualBackend)).unwrap();
    let empty = b"\0".as_ptr().cast();
    unsafe {
        let options = zw_options_create(empty, empty, empty);
        assert!(!options.is_null());
        assert!(zw_options_add_string(
            options,
            b"ConfigPath\0".as_ptr().cast(),
            b"/tmp/ozwcache\0".as_ptr().cast(),
            false
        ));
        assert!(zw_options_lock(options));

        let path = zw_options_get_as_string(options, b"ConfigPath\0".as_ptr().cast());
        assert_eq!(CStr::from_ptr((*path).data).to_str().unwrap(), "/tmp/ozwcache");
        zw_string_free(path);

        let manager = zw_manager_create();
        assert!(!manager.is_null());
        assert_eq!(zw_manager_get(), manager);
        assert!(zw_manager_add_driver(manager, b"usb\0".as_ptr().cast(), ZwControllerInterface::Serial as i32));

        zw_manager_destroy();
        assert!(zw_manager_get().is_null());
        assert!(!zw_manager_remove_driver(manager, b"usb\0".as_ptr().cast()));
    }
    assert!(zw_options_destroy());
    assert!(zw_options_get().is_null());
}

#[test]
fn test_lifecycle_invalidates_handles() {
    let host = Host::start();
    assert_eq!(zw_manager_get(), host.manager);
    assert_eq!(zw_manager_get_options(host.manager), host.options);
    unsafe {
        assert!(zw_manager_remove_driver(host.manager, b"/dev/ttyACM0\0".as_ptr().cast()));
        assert!(!zw_manager_remove_driver(host.manager, b"/dev/ttyACM0\0".as_ptr().cast()));
    }

    let stale = host.manager;
    zw_manager_destroy();
    assert!(zw_manager_get().is_null());
    unsafe {
        assert!(!zw_manager_add_driver(stale, b"/dev/ttyACM0\0".as_ptr().cast(), ZwControllerInterface::Serial as i32));
    }
    assert!(zw_manager_get_value_as_bool(stale, host.switch()).is_null());
    assert!(zw_options_destroy());
}

#[test]
fn test_watcher_sees_value_change_once() {
    let host = Host::start();
    let context = 0xC0FFEE_usize;
    unsafe {
        assert!(zw_manager_add_watcher(host.manager, Some(on_notification), context as *mut c_void));
        let set = take(zw_manager_set_value_bool(host.manager, host.switch(), true));
        assert!(set.is_ok);

        assert!(wait_for(|| !value_changes_for(context).is_empty()));
        let changes = value_changes_for(context);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].home_id, host.home_id);
        assert_eq!(changes[0].node_id, SWITCH_NODE_ID);
        assert_eq!(changes[0].value_id, host.switch());

        let get = take(zw_manager_get_value_as_bool(host.manager, host.switch()));
        assert!(get.is_ok);
        assert!(get.val_bool);

        assert!(zw_manager_remove_watcher(host.manager, Some(on_notification), context as *mut c_void));
    }
}

#[test]
fn test_removed_watcher_is_silent() {
    let host = Host::start();
    let context = 0xDEAD_usize;
    unsafe {
        assert!(zw_manager_add_watcher(host.manager, Some(on_notification), context as *mut c_void));
        assert!(zw_manager_remove_watcher(host.manager, Some(on_notification), context as *mut c_void));
        take(zw_manager_set_value_bool(host.manager, host.switch(), true));
    }
    zw_manager_destroy();
    assert!(value_changes_for(context).is_empty());
}

#[test]
fn test_unknown_home_is_reported_as_error() {
    let host = Host::start();
    let foreign = zw_value_id_new(
        host.home_id ^ 0xFFFF,
        SWITCH_NODE_ID,
        ZwValueGenre::User as i32,
        CC_SWITCH_BINARY,
        1,
        0,
        ZwValueType::Bool as i32,
    );
    unsafe {
        let raw = zw_manager_get_value_as_bool(host.manager, foreign);
        assert!((*raw).is_err);
        assert!(!(*raw).is_ok);
        assert_eq!((*raw).err_kind, ZwErrorKind::InvalidHomeId);
        let msg = CStr::from_ptr((*(*raw).err_msg).data);
        assert!(!msg.to_bytes().is_empty());
        zw_value_result_free(raw);
    }
}

#[test]
fn test_not_applicable_is_not_an_error() {
    let host = Host::start();
    unsafe {
        let units = take(zw_manager_get_value_units(host.manager, host.switch()));
        assert!(units.is_ok);

        let refused = take(zw_manager_set_value_float(host.manager, host.temperature(), 30.0));
        assert!(!refused.is_ok);
        assert!(!refused.is_err);

        let items = take(zw_manager_get_value_list_items(host.manager, host.switch()));
        assert!(!items.is_ok);
        assert!(items.is_err);
        assert_eq!(items.err_kind, ZwErrorKind::CannotConvertValueId);

        let raw = zw_manager_get_value_list_items(host.manager, host.mode());
        assert!((*raw).is_ok);
        let list: *const ZwStringList = (*raw).val_item_list;
        assert!((*list).length > 0);
        let first = zw_string_list_at(list, 0);
        assert!((*first).length > 0);
        zw_value_result_free(raw);
    }
}

#[test]
fn test_queue_drains_from_host_thread() {
    let host = Host::start();
    let queue = zw_notification_queue_new(128);
    unsafe {
        assert!(zw_manager_add_queue(host.manager, queue));
        take(zw_manager_set_value_bool(host.manager, host.switch(), true));

        let queue_addr = queue as usize;
        let polled = std::thread::spawn(move || {
            let queue = queue_addr as *mut ozw_ffi::notification::ZwNotificationQueue;
            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                let n = zw_notification_queue_poll(queue);
                if n.is_null() {
                    std::thread::sleep(Duration::from_millis(5));
                    continue;
                }
                let kind = (*n).kind;
                let node = (*n).node_id;
                zw_notification_free(n);
                if kind == ZwNotificationType::ValueChanged {
                    return Some(node);
                }
            }
            None
        })
        .join()
        .unwrap_or(None);
        assert_eq!(polled, Some(SWITCH_NODE_ID));

        assert!(zw_manager_remove_queue(host.manager, queue));
        zw_notification_queue_free(queue);
    }
}
