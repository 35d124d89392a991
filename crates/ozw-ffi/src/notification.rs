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

//! # Notification Bridge
//!
//! ## Overview
//!
//! The native library emits notifications from its own worker thread. A
//! native notification lives only for the duration of the callback, so
//! both delivery paths copy what they need before returning:
//!
//! * **Watcher hooks**: `zw_manager_add_watcher` registers a foreign
//!   function that is called synchronously on the native thread with the
//!   notification decomposed into scalars. Strings passed to the hook are
//!   valid only during the call. A hook must not call back into this
//!   library.
//! * **Queues**: `zw_manager_add_queue` registers a bounded
//!   `ZwNotificationQueue`. Delivery never blocks the native thread: a
//!   notification that finds the queue full is dropped and counted. The
//!   host drains the queue from any thread with
//!   `zw_notification_queue_poll`.
//!
//! Both paths preserve emission order. Once removal returns, nothing more
//! is delivered to the hook or queue. A registration is identified by the
//! pair of hook and context; registering the same pair twice is refused.
//! Destroying the manager drops every registration.
//!
//! ## Exported Functions
//!
//! ### Watchers
//! * `zw_manager_add_watcher`
//! * `zw_manager_remove_watcher`
//!
//! ### Queues
//! * `zw_notification_queue_new`
//! * `zw_manager_add_queue`
//! * `zw_manager_remove_queue`
//! * `zw_notification_queue_poll`
//! * `zw_notification_queue_len`
//! * `zw_notification_queue_dropped`
//! * `zw_notification_queue_free`
//!
//! ### Owned Notifications
//! * `zw_notification_free`
//! * `zw_notification_get_as_string`
//!
//! ### Names
//! * `zw_notification_type_as_string`
//! * `zw_notification_code_as_string`
//! * `zw_controller_state_as_string`
//! * `zw_controller_command_as_string`
//! * `zw_controller_error_as_string`
//! * `zw_user_alert_as_string`

use crate::buffer::{alloc_box, free_box, zw_string_free, ZwString};
use crate::context;
use crate::error::FfiError;
use crate::handle::{ZwManager, ZwValueId};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use libc::c_char;
use ozw_core::notification::{
    ControllerCommand, ControllerError, ControllerState, Notification, NotificationCode, NotificationType, UserAlert,
};
use ozw_core::value_id::ValueId;
use parking_lot::{const_mutex, Mutex};
use std::ffi::{c_void, CString};
use std::ptr::null_mut;
use std::sync::atomic::{AtomicU64, Ordering};

mirror_enum! {
    /// Kind of a notification.
    pub enum ZwNotificationType mirrors NotificationType {
        ValueAdded = 0,
        ValueRemoved = 1,
        ValueChanged = 2,
        ValueRefreshed = 3,
        Group = 4,
        NodeNew = 5,
        NodeAdded = 6,
        NodeRemoved = 7,
        NodeProtocolInfo = 8,
        NodeNaming = 9,
        NodeEvent = 10,
        PollingDisabled = 11,
        PollingEnabled = 12,
        SceneEvent = 13,
        CreateButton = 14,
        DeleteButton = 15,
        ButtonOn = 16,
        ButtonOff = 17,
        DriverReady = 18,
        DriverFailed = 19,
        DriverReset = 20,
        EssentialNodeQueriesComplete = 21,
        NodeQueriesComplete = 22,
        AwakeNodesQueried = 23,
        AllNodesQueriedSomeDead = 24,
        AllNodesQueried = 25,
        Notification = 26,
        DriverRemoved = 27,
        ControllerCommand = 28,
        NodeReset = 29,
    }
}

mirror_enum! {
    /// Code carried by `Notification` notifications.
    pub enum ZwNotificationCode mirrors NotificationCode {
        MsgComplete = 0,
        Timeout = 1,
        NoOperation = 2,
        Awake = 3,
        Sleep = 4,
        Dead = 5,
        Alive = 6,
    }
}

mirror_enum! {
    /// Progress of a controller command.
    pub enum ZwControllerState mirrors ControllerState {
        Normal = 0,
        Starting = 1,
        Cancel = 2,
        Error = 3,
        Waiting = 4,
        Sleeping = 5,
        InProgress = 6,
        Completed = 7,
        Failed = 8,
        NodeOk = 9,
        NodeFailed = 10,
    }
}

mirror_enum! {
    pub enum ZwControllerCommand mirrors ControllerCommand {
        None = 0,
        AddDevice = 1,
        CreateNewPrimary = 2,
        ReceiveConfiguration = 3,
        RemoveDevice = 4,
        RemoveFailedNode = 5,
        HasNodeFailed = 6,
        ReplaceFailedNode = 7,
        TransferPrimaryRole = 8,
        RequestNetworkUpdate = 9,
        RequestNodeNeighborUpdate = 10,
        AssignReturnRoute = 11,
        DeleteAllReturnRoutes = 12,
        SendNodeInformation = 13,
        ReplicationSend = 14,
        CreateButton = 15,
        DeleteButton = 16,
    }
}

mirror_enum! {
    /// Failure reason of a controller command.
    pub enum ZwControllerError mirrors ControllerError {
        None = 0,
        ButtonNotFound = 1,
        NodeNotFound = 2,
        NotBridge = 3,
        NotSuc = 4,
        NotSecondary = 5,
        NotPrimary = 6,
        IsPrimary = 7,
        NotFound = 8,
        Busy = 9,
        Failed = 10,
        Disabled = 11,
        Overflow = 12,
    }
}

mirror_enum! {
    pub enum ZwUserAlert mirrors UserAlert {
        None = 0,
        ConfigOutOfDate = 1,
        MfsOutOfDate = 2,
        ConfigFileDownloadFailed = 3,
        DnsError = 4,
        NodeReloadRequired = 5,
        UnsupportedController = 6,
        ApplicationStatusRetry = 7,
        ApplicationStatusQueued = 8,
        ApplicationStatusRejected = 9,
    }
}

/// A foreign notification hook.
///
/// `byte` is the shared slot: group index, button id, scene id, notification
/// code or controller error depending on `kind`. `event` is the node event
/// or controller state, `command` the controller command; both are `0` for
/// other kinds. `com_port` is NUL-terminated, `com_port_len` bytes long and
/// valid only during the call.
pub type ZwNotificationHook = unsafe extern "C" fn(
    kind: u8,
    home_id: u32,
    node_id: u8,
    value_id: ZwValueId,
    byte: u8,
    event: u8,
    command: u8,
    user_alert: u8,
    com_port: *const c_char,
    com_port_len: usize,
    context: *mut c_void,
);

/// The native context of a registered hook.
struct HookRecord {
    hook: ZwNotificationHook,
    context: *mut c_void,
}

enum Registration {
    Hook { hook: usize, context: usize, record: usize },
    Queue { queue: usize },
}

static REGISTRY: Mutex<Vec<Registration>> = const_mutex(Vec::new());

fn dispatch_hook(notification: &Notification, context: *mut c_void) {
    // SAFETY: the context is a `HookRecord` that is freed only after the
    // native library confirmed its removal.
    let record = unsafe { &*(context as *const HookRecord) };
    let com_port = CString::new(notification.com_port()).unwrap_or_else(|_| {
        tracing::warn!(error = %FfiError::InteriorNul, "com port not passed to hook");
        CString::default()
    });
    tracing::trace!(kind = notification.kind().as_str(), "dispatching to hook");
    unsafe {
        (record.hook)(
            notification.kind().into(),
            notification.home_id(),
            notification.node_id(),
            notification.value_id().into(),
            notification.byte(),
            notification.event().unwrap_or(0),
            notification.command().unwrap_or(0),
            notification.user_alert().into(),
            com_port.as_ptr(),
            com_port.as_bytes().len(),
            record.context,
        );
    }
}

/// Registers `hook` to be called with every notification.
///
/// Returns `false` if the pair of `hook` and `context` is already
/// registered or the manager handle is rejected.
///
/// # Panics
///
/// This function will panic if called with a null hook.
///
/// # Safety
///
/// This function is unsafe because `hook` is called from the native
/// thread with `context`. The caller must ensure that `hook` is callable
/// from any thread until `zw_manager_remove_watcher` returns.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_add_watcher(
    manager: *const ZwManager,
    hook: Option<ZwNotificationHook>,
    context: *mut c_void,
) -> bool {
    let Some(hook) = hook else {
        panic!("called `zw_manager_add_watcher` with null hook");
    };
    let Some(manager) = context::manager(manager, "zw_manager_add_watcher") else {
        return false;
    };

    let record = alloc_box(HookRecord { hook, context });
    {
        let mut registry = REGISTRY.lock();
        let duplicate = registry.iter().any(|r| {
            matches!(r, Registration::Hook { hook: h, context: c, .. } if *h == hook as usize && *c == context as usize)
        });
        if duplicate {
            drop(registry);
            drop(free_box(record));
            tracing::warn!("watcher already registered");
            return false;
        }
        registry.push(Registration::Hook {
            hook: hook as usize,
            context: context as usize,
            record: record as usize,
        });
    }

    if manager.add_watcher(dispatch_hook, record.cast()) {
        tracing::debug!("watcher added");
        return true;
    }
    REGISTRY
        .lock()
        .retain(|r| !matches!(r, Registration::Hook { record: rec, .. } if *rec == record as usize));
    drop(free_box(record));
    tracing::warn!("native library refused the watcher");
    false
}

/// Removes the registration of exactly this pair of `hook` and `context`.
///
/// Waits for a delivery in progress; the hook is not called after this
/// returns. Returns `false` if the pair is not registered.
///
/// # Panics
///
/// This function will panic if called with a null hook.
///
/// # Safety
///
/// This function is unsafe because it must not be called from inside the
/// hook itself.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_remove_watcher(
    manager: *const ZwManager,
    hook: Option<ZwNotificationHook>,
    context: *mut c_void,
) -> bool {
    let Some(hook) = hook else {
        panic!("called `zw_manager_remove_watcher` with null hook");
    };
    let Some(manager) = context::manager(manager, "zw_manager_remove_watcher") else {
        return false;
    };

    let record = {
        let mut registry = REGISTRY.lock();
        let pos = registry.iter().position(|r| {
            matches!(r, Registration::Hook { hook: h, context: c, .. } if *h == hook as usize && *c == context as usize)
        });
        match pos.map(|pos| registry.remove(pos)) {
            Some(Registration::Hook { record, .. }) => record as *mut HookRecord,
            _ => {
                tracing::warn!("watcher not registered");
                return false;
            }
        }
    };

    let removed = manager.remove_watcher(dispatch_hook, record.cast());
    if !removed {
        tracing::warn!("native library did not know the watcher");
    }
    drop(free_box(record));
    removed
}

/// A bounded queue of notifications, drained by the host.
pub struct ZwNotificationQueue {
    sender: Sender<Notification>,
    receiver: Receiver<Notification>,
    dropped: AtomicU64,
}

fn dispatch_queue(notification: &Notification, context: *mut c_void) {
    // SAFETY: a registered queue is freed only after its removal.
    let queue = unsafe { &*(context as *const ZwNotificationQueue) };
    match queue.sender.try_send(notification.clone()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            queue.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(kind = notification.kind().as_str(), "notification queue full, dropping");
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!("notification queue disconnected");
        }
    }
}

/// Creates a queue that holds up to `capacity` notifications. A capacity of
/// zero is treated as one. Free it with `zw_notification_queue_free`.
#[no_mangle]
pub extern "C" fn zw_notification_queue_new(capacity: usize) -> *mut ZwNotificationQueue {
    let (sender, receiver) = bounded(capacity.max(1));
    alloc_box(ZwNotificationQueue {
        sender,
        receiver,
        dropped: AtomicU64::new(0),
    })
}

fn take_queue_registration(queue: *const ZwNotificationQueue) -> bool {
    let mut registry = REGISTRY.lock();
    let pos = registry
        .iter()
        .position(|r| matches!(r, Registration::Queue { queue: q } if *q == queue as usize));
    pos.map(|pos| registry.remove(pos)).is_some()
}

/// Starts delivering notifications into `queue`.
///
/// Returns `false` if the queue is already registered or the manager handle
/// is rejected.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the queue was created by
/// `zw_notification_queue_new` and has not been freed.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_add_queue(manager: *const ZwManager, queue: *mut ZwNotificationQueue) -> bool {
    assert!(!queue.is_null(), "called `zw_manager_add_queue` with null pointer");
    let Some(manager) = context::manager(manager, "zw_manager_add_queue") else {
        return false;
    };
    {
        let mut registry = REGISTRY.lock();
        if registry
            .iter()
            .any(|r| matches!(r, Registration::Queue { queue: q } if *q == queue as usize))
        {
            tracing::warn!("queue already registered");
            return false;
        }
        registry.push(Registration::Queue { queue: queue as usize });
    }
    if manager.add_watcher(dispatch_queue, queue.cast()) {
        return true;
    }
    take_queue_registration(queue);
    false
}

/// Stops delivering notifications into `queue`. Notifications already
/// queued stay available to `zw_notification_queue_poll`.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the queue was created by
/// `zw_notification_queue_new` and has not been freed.
#[no_mangle]
pub unsafe extern "C" fn zw_manager_remove_queue(manager: *const ZwManager, queue: *mut ZwNotificationQueue) -> bool {
    assert!(!queue.is_null(), "called `zw_manager_remove_queue` with null pointer");
    let Some(manager) = context::manager(manager, "zw_manager_remove_queue") else {
        return false;
    };
    if !take_queue_registration(queue) {
        tracing::warn!("queue not registered");
        return false;
    }
    manager.remove_watcher(dispatch_queue, queue.cast())
}

/// Takes the oldest queued notification, or returns null if the queue is
/// empty. Free the result with `zw_notification_free`.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the queue pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_notification_queue_poll(queue: *const ZwNotificationQueue) -> *mut ZwNotification {
    assert!(!queue.is_null(), "called `zw_notification_queue_poll` with null pointer");
    match (*queue).receiver.try_recv() {
        Ok(notification) => alloc_box(ZwNotification::from(&notification)),
        Err(_) => null_mut(),
    }
}

/// Number of notifications waiting in the queue.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the queue pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_notification_queue_len(queue: *const ZwNotificationQueue) -> usize {
    assert!(!queue.is_null(), "called `zw_notification_queue_len` with null pointer");
    (*queue).receiver.len()
}

/// Number of notifications dropped because the queue was full.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the queue pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_notification_queue_dropped(queue: *const ZwNotificationQueue) -> u64 {
    assert!(!queue.is_null(), "called `zw_notification_queue_dropped` with null pointer");
    (*queue).dropped.load(Ordering::Relaxed)
}

/// Frees a queue and every notification still in it. A queue that is still
/// registered is removed from the manager first.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is null or was returned by
/// `zw_notification_queue_new` and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn zw_notification_queue_free(queue: *mut ZwNotificationQueue) {
    if queue.is_null() {
        return;
    }
    if take_queue_registration(queue) {
        if let Some(manager) = context::live_manager() {
            manager.remove_watcher(dispatch_queue, queue.cast());
        }
    }
    drop(free_box(queue));
}

/// Drops every registration and frees the hook records.
///
/// Called after the native manager stopped delivering.
pub(crate) fn release_registrations() {
    let registrations = std::mem::take(&mut *REGISTRY.lock());
    for registration in registrations {
        if let Registration::Hook { record, .. } = registration {
            // SAFETY: the manager that delivered to this record is gone.
            drop(unsafe { free_box(record as *mut HookRecord) });
        }
    }
}

/// A notification copied out of the native library, owned by the caller.
#[repr(C)]
#[derive(Debug)]
pub struct ZwNotification {
    pub kind: ZwNotificationType,
    pub home_id: u32,
    pub node_id: u8,
    pub value_id: ZwValueId,
    pub byte: u8,
    pub event: u8,
    pub command: u8,
    pub user_alert: ZwUserAlert,
    pub com_port: *mut ZwString,
}

impl From<&Notification> for ZwNotification {
    fn from(n: &Notification) -> Self {
        Self {
            kind: n.kind().into(),
            home_id: n.home_id(),
            node_id: n.node_id(),
            value_id: n.value_id().into(),
            byte: n.byte(),
            event: n.event().unwrap_or(0),
            command: n.command().unwrap_or(0),
            user_alert: n.user_alert().into(),
            com_port: ZwString::new_owned(n.com_port()),
        }
    }
}

impl ZwNotification {
    /// Rebuilds the native notification.
    ///
    /// # Safety
    ///
    /// `com_port` must be null or a string allocated by this library.
    unsafe fn to_native(&self) -> Notification {
        let com_port = if self.com_port.is_null() {
            String::new()
        } else {
            String::from_utf8_lossy((*self.com_port).as_bytes()).into_owned()
        };
        let command = ControllerCommand::try_from(self.command).unwrap_or(ControllerCommand::None);
        Notification::new(self.kind.into(), ValueId::from(self.value_id))
            .with_byte(self.byte)
            .with_event(self.event)
            .with_command(command)
            .with_user_alert(self.user_alert.into())
            .with_com_port(com_port)
    }
}

/// Frees a notification returned by `zw_notification_queue_poll`.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is null or was returned by this
/// library and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn zw_notification_free(notification: *mut ZwNotification) {
    if notification.is_null() {
        return;
    }
    let notification = free_box(notification);
    zw_string_free(notification.com_port);
}

/// Renders the notification for humans, e.g. `"Notification - Dead"`.
/// Free the result with `zw_string_free`.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_notification_get_as_string(notification: *const ZwNotification) -> *mut ZwString {
    assert!(!notification.is_null(), "called `zw_notification_get_as_string` with null pointer");
    ZwString::new_owned(&(*notification).to_native().as_string())
}

#[no_mangle]
pub extern "C" fn zw_notification_type_as_string(kind: i32) -> *const c_char {
    ZwNotificationType::c_name_of(kind, "zw_notification_type_as_string")
}

#[no_mangle]
pub extern "C" fn zw_notification_code_as_string(code: i32) -> *const c_char {
    ZwNotificationCode::c_name_of(code, "zw_notification_code_as_string")
}

#[no_mangle]
pub extern "C" fn zw_controller_state_as_string(state: i32) -> *const c_char {
    ZwControllerState::c_name_of(state, "zw_controller_state_as_string")
}

#[no_mangle]
pub extern "C" fn zw_controller_command_as_string(command: i32) -> *const c_char {
    ZwControllerCommand::c_name_of(command, "zw_controller_command_as_string")
}

#[no_mangle]
pub extern "C" fn zw_controller_error_as_string(error: i32) -> *const c_char {
    ZwControllerError::c_name_of(error, "zw_controller_error_as_string")
}

#[no_mangle]
pub extern "C" fn zw_user_alert_as_string(alert: i32) -> *const c_char {
    ZwUserAlert::c_name_of(alert, "zw_user_alert_as_string")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::Network;
    use crate::handle::{zw_value_id_new, ZwValueGenre, ZwValueType};
    use crate::manager::zw_manager_destroy;
    use crate::result::zw_value_result_free;
    use crate::value::zw_manager_set_value_bool;
    use ozw_virtual::inventory::{CC_SWITCH_BINARY, SWITCH_NODE_ID};
    use std::ffi::CStr;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        kind: u8,
        home_id: u32,
        node_id: u8,
        com_port: String,
    }

    static SEEN: Mutex<Vec<(usize, Seen)>> = const_mutex(Vec::new());

    unsafe extern "C" fn record(
        kind: u8,
        home_id: u32,
        node_id: u8,
        _value_id: ZwValueId,
        _byte: u8,
        _event: u8,
        _command: u8,
        _user_alert: u8,
        com_port: *const c_char,
        com_port_len: usize,
        context: *mut c_void,
    ) {
        let com_port = CStr::from_ptr(com_port).to_string_lossy().into_owned();
        assert_eq!(com_port.len(), com_port_len);
        SEEN.lock().push((
            context as usize,
            Seen {
                kind,
                home_id,
                node_id,
                com_port,
            },
        ));
    }

    fn seen_by(context: usize) -> Vec<Seen> {
        SEEN.lock()
            .iter()
            .filter(|(c, _)| *c == context)
            .map(|(_, s)| s.clone())
            .collect()
    }

    fn is_registered(queue: *const ZwNotificationQueue) -> bool {
        REGISTRY
            .lock()
            .iter()
            .any(|r| matches!(r, Registration::Queue { queue: q } if *q == queue as usize))
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

    fn switch(net: &Network) -> ZwValueId {
        zw_value_id_new(net.home_id, SWITCH_NODE_ID, ZwValueGenre::User as i32, CC_SWITCH_BINARY, 1, 0, ZwValueType::Bool as i32)
    }

    fn toggle(net: &Network, on: bool) {
        let r = zw_manager_set_value_bool(net.manager, switch(net), on);
        unsafe {
            assert!((*r).is_ok);
            zw_value_result_free(r);
        }
    }

    #[test]
    fn test_hook_receives_value_changed_with_context() {
        let net = Network::start();
        let context = 0x5eed_0001usize as *mut c_void;
        unsafe {
            assert!(zw_manager_add_watcher(net.manager, Some(record), context));
            assert!(!zw_manager_add_watcher(net.manager, Some(record), context));
        }
        toggle(&net, true);

        let changed = ZwNotificationType::ValueChanged as u8;
        assert!(wait_for(|| seen_by(context as usize).iter().any(|s| s.kind == changed)));
        let seen: Vec<_> = seen_by(context as usize).into_iter().filter(|s| s.kind == changed).collect();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].home_id, net.home_id);
        assert_eq!(seen[0].node_id, SWITCH_NODE_ID);

        unsafe {
            assert!(zw_manager_remove_watcher(net.manager, Some(record), context));
            assert!(!zw_manager_remove_watcher(net.manager, Some(record), context));
        }
    }

    #[test]
    fn test_removed_hook_gets_nothing() {
        let net = Network::start();
        let context = 0x5eed_0002usize as *mut c_void;
        unsafe {
            assert!(zw_manager_add_watcher(net.manager, Some(record), context));
            assert!(zw_manager_remove_watcher(net.manager, Some(record), context));
        }
        toggle(&net, true);
        toggle(&net, false);
        zw_manager_destroy();
        assert!(seen_by(context as usize).is_empty());
    }

    unsafe fn drain(queue: *mut ZwNotificationQueue) -> Vec<ZwNotificationType> {
        let mut kinds = Vec::new();
        loop {
            let n = zw_notification_queue_poll(queue);
            if n.is_null() {
                return kinds;
            }
            if (*n).kind == ZwNotificationType::ValueChanged {
                assert_eq!((*n).node_id, SWITCH_NODE_ID);
            }
            kinds.push((*n).kind);
            zw_notification_free(n);
        }
    }

    #[test]
    fn test_queue_delivers_in_order() {
        let net = Network::start();
        let queue = zw_notification_queue_new(256);
        unsafe {
            assert!(zw_manager_add_queue(net.manager, queue));
            assert!(!zw_manager_add_queue(net.manager, queue));
            toggle(&net, true);
            toggle(&net, false);
            toggle(&net, true);

            let mut kinds = Vec::new();
            assert!(wait_for(|| {
                kinds.extend(drain(queue));
                kinds.iter().filter(|k| **k == ZwNotificationType::ValueChanged).count() == 3
            }));
            assert_eq!(kinds.last(), Some(&ZwNotificationType::ValueChanged));
            assert_eq!(zw_notification_queue_dropped(queue), 0);
            assert!(zw_manager_remove_queue(net.manager, queue));
            assert!(!zw_manager_remove_queue(net.manager, queue));
            zw_notification_queue_free(queue);
        }
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let net = Network::start();
        let queue = zw_notification_queue_new(0);
        unsafe {
            assert!(zw_manager_add_queue(net.manager, queue));
            toggle(&net, true);
            toggle(&net, false);
            toggle(&net, true);
            assert!(wait_for(|| zw_notification_queue_dropped(queue) >= 2));
            assert_eq!(zw_notification_queue_len(queue), 1);

            let kept = zw_notification_queue_poll(queue);
            assert!(!kept.is_null());
            let text = zw_notification_get_as_string(kept);
            assert!(!(*text).as_bytes().is_empty());
            zw_string_free(text);
            zw_notification_free(kept);
            assert!(zw_notification_queue_poll(queue).is_null());

            assert!(zw_manager_remove_queue(net.manager, queue));
            zw_notification_queue_free(queue);
        }
    }

    #[test]
    fn test_as_string_rebuilds_native_rendering() {
        let owned = ZwNotification::from(
            &Notification::new(NotificationType::Notification, ValueId::from_parts(7, 0, 0)).with_byte(5),
        );
        unsafe {
            let ptr = alloc_box(owned);
            let text = zw_notification_get_as_string(ptr);
            assert_eq!((*text).as_bytes(), b"Notification - Dead");
            zw_string_free(text);
            zw_notification_free(ptr);
        }
    }

    #[test]
    fn test_queue_free_while_registered_unregisters() {
        let net = Network::start();
        let queue = zw_notification_queue_new(8);
        unsafe {
            assert!(zw_manager_add_queue(net.manager, queue));
            zw_notification_queue_free(queue);
        }
        assert!(!is_registered(queue));
        toggle(&net, true);
    }

    #[test]
    fn test_destroy_releases_registrations() {
        let net = Network::start();
        let context = 0x5eed_0003usize as *mut c_void;
        unsafe {
            assert!(zw_manager_add_watcher(net.manager, Some(record), context));
        }
        zw_manager_destroy();
        assert!(REGISTRY.lock().is_empty());
    }

    #[test]
    fn test_enum_names() {
        unsafe {
            let name = CStr::from_ptr(zw_notification_type_as_string(ZwNotificationType::AllNodesQueriedSomeDead as i32));
            assert_eq!(name.to_str().unwrap(), "AllNodesQueriedSomeDead");
            let name = CStr::from_ptr(zw_controller_state_as_string(ZwControllerState::NodeOk as i32));
            assert_eq!(name.to_str().unwrap(), "NodeOk");
        }
        assert_eq!(ZwNotificationType::NodeReset as u8, 29);
        assert_eq!(ZwControllerError::Overflow as u8, 12);
    }

    #[test]
    fn test_out_of_range_names_are_unknown() {
        let names: [extern "C" fn(i32) -> *const c_char; 6] = [
            zw_notification_type_as_string,
            zw_notification_code_as_string,
            zw_controller_state_as_string,
            zw_controller_command_as_string,
            zw_controller_error_as_string,
            zw_user_alert_as_string,
        ];
        for as_string in names {
            for raw in [255, -3, i32::MAX] {
                let name = unsafe { CStr::from_ptr(as_string(raw)) };
                assert_eq!(name.to_str().unwrap(), "Unknown");
            }
        }
    }
}
