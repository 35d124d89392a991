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

//! The virtual network manager and its process-wide instance.

use crate::driver::{home_id_for_path, Driver};
use crate::inventory::{CC_BASIC, CC_CONFIGURATION, CC_SWITCH_BINARY};
use crate::node::Node;
use crate::notifier::Notifier;
use crate::options::VirtualOptions;
use crate::scene::{self, Scene};
use crate::value::{insert_switch_point, ValueData, ValueRecord};
use ozw_core::exception::{ExceptionKind, NativeResult, OzwException};
use ozw_core::manager::{
    ControllerInterface, DriverStatistics, Manager, NodeClassInfo, SwitchPoint, Value, ValueKind,
};
use ozw_core::notification::{
    ControllerCommand, ControllerError, ControllerState, Notification, NotificationCode,
    NotificationType, WatcherFn,
};
use ozw_core::options::Options;
use ozw_core::value_id::{ValueId, ValueType};
use parking_lot::{const_mutex, Mutex};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::ffi::c_void;
use std::sync::Arc;

/// Identifier of a node rather than a value: only the node slot is set.
fn node_value_id(home_id: u32, node_id: u8) -> ValueId {
    ValueId::from_parts(home_id, (node_id as u32) << 24, 0)
}

/// How a controller command finishes right after it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandOutcome {
    /// Waits for user interaction on the network; stays pending.
    Waiting,
    Completed,
    Failed(ControllerError),
    NodeOk,
    NodeFailed,
}

#[derive(Debug)]
struct Network {
    drivers: FxHashMap<u32, Driver>,
    poll_interval: i32,
    interval_between_polls: bool,
    scenes: BTreeMap<u8, Scene>,
}

/// The manager of the virtual library.
pub struct VirtualManager {
    options: Arc<VirtualOptions>,
    network: Mutex<Network>,
    notifier: Notifier,
}

impl VirtualManager {
    /// Creates a manager. The options must be locked.
    pub fn new(options: Arc<VirtualOptions>) -> NativeResult<Self> {
        if !options.are_locked() {
            tracing::error!("options have not been created and locked");
            return Err(OzwException::options("Options Not Created and Locked"));
        }
        let poll_interval = options.get_option_as_int("PollInterval").unwrap_or(30_000);
        let interval_between_polls = options
            .get_option_as_bool("IntervalBetweenPolls")
            .unwrap_or(false);
        Ok(Self {
            options,
            network: Mutex::new(Network {
                drivers: FxHashMap::default(),
                poll_interval,
                interval_between_polls,
                scenes: BTreeMap::new(),
            }),
            notifier: Notifier::start(),
        })
    }

    pub fn options(&self) -> &Arc<VirtualOptions> {
        &self.options
    }

    /// Queues a notification for delivery to the watchers.
    pub fn emit(&self, notification: Notification) {
        self.notifier.emit(notification);
    }

    /// Delivers every queued notification and stops the notification thread.
    pub fn shutdown(&self) {
        self.notifier.shutdown();
    }

    fn with_driver<T>(
        &self,
        home_id: u32,
        f: impl FnOnce(&mut Driver) -> NativeResult<T>,
    ) -> NativeResult<T> {
        let mut network = self.network.lock();
        match network.drivers.get_mut(&home_id) {
            Some(driver) => f(driver),
            None => {
                tracing::warn!(home_id = format_args!("0x{:08x}", home_id), "home id is unknown");
                Err(OzwException::invalid_home_id("Invalid HomeId passed to GetDriver"))
            }
        }
    }

    fn with_node<T>(&self, home_id: u32, node_id: u8, f: impl FnOnce(&mut Node) -> T) -> NativeResult<T> {
        self.with_driver(home_id, |driver| driver.node_mut(node_id).map(f))
    }

    fn with_value<T>(
        &self,
        id: &ValueId,
        f: impl FnOnce(&mut ValueRecord) -> NativeResult<T>,
    ) -> NativeResult<T> {
        self.with_driver(id.home_id(), |driver| f(driver.value_mut(id)?))
    }

    fn emit_value(&self, kind: NotificationType, id: &ValueId) {
        self.emit(Notification::new(kind, *id));
    }

    fn emit_node(&self, kind: NotificationType, home_id: u32, node_id: u8) {
        self.emit(Notification::new(kind, node_value_id(home_id, node_id)));
    }

    fn announce_driver(&self, driver: &Driver) {
        let home_id = driver.home_id;
        self.emit(
            Notification::new(
                NotificationType::DriverReady,
                node_value_id(home_id, driver.controller_node_id),
            )
            .with_com_port(driver.controller_path.as_str()),
        );
        for node in driver.nodes.values() {
            self.emit_node(NotificationType::NodeAdded, home_id, node.node_id);
            self.emit_node(NotificationType::NodeProtocolInfo, home_id, node.node_id);
            for value in node.values.values() {
                self.emit_value(NotificationType::ValueAdded, &value.id);
            }
            self.emit_node(NotificationType::NodeNaming, home_id, node.node_id);
            self.emit_node(NotificationType::EssentialNodeQueriesComplete, home_id, node.node_id);
            self.emit_node(NotificationType::NodeQueriesComplete, home_id, node.node_id);
        }
        let controller = driver.controller_node_id;
        self.emit_node(NotificationType::AwakeNodesQueried, home_id, controller);
        self.emit_node(NotificationType::AllNodesQueried, home_id, controller);
    }

    fn controller_notification(
        &self,
        home_id: u32,
        node_id: u8,
        command: ControllerCommand,
        state: ControllerState,
        error: ControllerError,
    ) {
        self.emit(
            Notification::new(NotificationType::ControllerCommand, node_value_id(home_id, node_id))
                .with_event(state.into())
                .with_byte(error.into())
                .with_command(command),
        );
    }

    /// Starts a controller command. Returns `false` while another command
    /// is in progress.
    fn begin_command(
        &self,
        home_id: u32,
        node_id: u8,
        command: ControllerCommand,
        run: impl FnOnce(&mut Driver) -> CommandOutcome,
    ) -> NativeResult<bool> {
        self.with_driver(home_id, |driver| {
            if driver.pending_command != ControllerCommand::None {
                tracing::warn!(
                    ?command,
                    pending = ?driver.pending_command,
                    "controller command already in progress"
                );
                return Ok(false);
            }
            driver.record_send();
            let target = if node_id == 0 { driver.controller_node_id } else { node_id };
            self.controller_notification(home_id, target, command, ControllerState::Starting, ControllerError::None);
            let (state, error) = match run(driver) {
                CommandOutcome::Waiting => {
                    driver.pending_command = command;
                    (ControllerState::Waiting, ControllerError::None)
                }
                CommandOutcome::Completed => (ControllerState::Completed, ControllerError::None),
                CommandOutcome::Failed(error) => (ControllerState::Failed, error),
                CommandOutcome::NodeOk => (ControllerState::NodeOk, ControllerError::None),
                CommandOutcome::NodeFailed => (ControllerState::NodeFailed, ControllerError::None),
            };
            self.controller_notification(home_id, target, command, state, error);
            Ok(true)
        })
    }

    /// A command that completes at once if the target node exists.
    fn node_command(&self, home_id: u32, node_id: u8, command: ControllerCommand) -> NativeResult<bool> {
        self.begin_command(home_id, node_id, command, |driver| {
            if driver.nodes.contains_key(&node_id) {
                CommandOutcome::Completed
            } else {
                CommandOutcome::Failed(ControllerError::NodeNotFound)
            }
        })
    }

    /// Writes `value` and reports the change.
    fn write_value(&self, id: &ValueId, value: Value) -> NativeResult<bool> {
        self.with_driver(id.home_id(), |driver| {
            let applied = driver.value_mut(id)?.write(value)?;
            if applied {
                driver.record_send();
                self.emit_value(NotificationType::ValueChanged, id);
            } else {
                tracing::warn!(%id, "value was not applied");
            }
            Ok(applied)
        })
    }

    /// Sets the Basic value of a node and mirrors it on a binary switch.
    fn set_node_level_inner(&self, home_id: u32, node_id: u8, level: u8) -> NativeResult<()> {
        self.with_driver(home_id, |driver| {
            let node = driver.node_mut(node_id)?;
            let mut changed = Vec::new();
            if let Some(basic) = node.find_value_mut(CC_BASIC, 0) {
                basic.data = ValueData::Byte(level);
                basic.is_set = true;
                changed.push(basic.id);
            }
            if let Some(switch) = node.find_value_mut(CC_SWITCH_BINARY, 0) {
                switch.data = ValueData::Bool(level > 0);
                switch.is_set = true;
                changed.push(switch.id);
            }
            driver.record_send();
            for id in changed {
                self.emit_value(NotificationType::ValueChanged, &id);
            }
            Ok(())
        })
    }

    fn switch_all(&self, home_id: u32, on: bool) -> NativeResult<()> {
        let targets = self.with_driver(home_id, |driver| {
            Ok(driver
                .nodes
                .values()
                .filter(|n| n.node_id != driver.controller_node_id)
                .map(|n| n.node_id)
                .collect::<Vec<_>>())
        })?;
        for node_id in targets {
            self.set_node_level_inner(home_id, node_id, if on { 0xff } else { 0 })?;
        }
        Ok(())
    }

    fn set_node_string(
        &self,
        home_id: u32,
        node_id: u8,
        set: impl FnOnce(&mut Node),
    ) -> NativeResult<()> {
        self.with_node(home_id, node_id, set)?;
        self.emit_node(NotificationType::NodeNaming, home_id, node_id);
        Ok(())
    }
}

impl Manager for VirtualManager {
    fn write_config(&self, home_id: u32) -> NativeResult<()> {
        self.with_driver(home_id, |driver| {
            tracing::info!(
                home_id = format_args!("0x{:08x}", home_id),
                nodes = driver.nodes.len(),
                "network configuration written"
            );
            Ok(())
        })
    }

    fn add_driver(&self, controller_path: &str, interface: ControllerInterface) -> NativeResult<bool> {
        let mut network = self.network.lock();
        if network
            .drivers
            .values()
            .any(|d| d.controller_path == controller_path)
        {
            tracing::warn!(controller_path, "driver already exists");
            return Ok(false);
        }
        let mut home_id = home_id_for_path(controller_path);
        while network.drivers.contains_key(&home_id) {
            home_id = home_id.wrapping_add(1).max(1);
        }
        let driver = Driver::new(controller_path, home_id, interface);
        self.announce_driver(&driver);
        network.drivers.insert(home_id, driver);
        tracing::info!(
            controller_path,
            home_id = format_args!("0x{:08x}", home_id),
            "driver added"
        );
        Ok(true)
    }

    fn remove_driver(&self, controller_path: &str) -> NativeResult<bool> {
        let mut network = self.network.lock();
        let home_id = network
            .drivers
            .values()
            .find(|d| d.controller_path == controller_path)
            .map(|d| d.home_id);
        let Some(home_id) = home_id else {
            tracing::warn!(controller_path, "no driver for controller path");
            return Ok(false);
        };
        if let Some(driver) = network.drivers.remove(&home_id) {
            self.emit(
                Notification::new(
                    NotificationType::DriverRemoved,
                    node_value_id(home_id, driver.controller_node_id),
                )
                .with_com_port(driver.controller_path),
            );
        }
        tracing::info!(controller_path, "driver removed");
        Ok(true)
    }

    fn get_controller_node_id(&self, home_id: u32) -> NativeResult<u8> {
        self.with_driver(home_id, |d| Ok(d.controller_node_id))
    }

    fn get_suc_node_id(&self, home_id: u32) -> NativeResult<u8> {
        self.with_driver(home_id, |d| Ok(d.suc_node_id))
    }

    fn is_primary_controller(&self, home_id: u32) -> NativeResult<bool> {
        self.with_driver(home_id, |d| Ok(d.primary))
    }

    fn is_static_update_controller(&self, home_id: u32) -> NativeResult<bool> {
        self.with_driver(home_id, |d| Ok(d.suc_node_id == d.controller_node_id))
    }

    fn is_bridge_controller(&self, home_id: u32) -> NativeResult<bool> {
        self.with_driver(home_id, |_| Ok(false))
    }

    fn get_library_version(&self, home_id: u32) -> NativeResult<String> {
        self.with_driver(home_id, |_| Ok("Z-Wave 4.05".to_string()))
    }

    fn get_library_type_name(&self, home_id: u32) -> NativeResult<String> {
        self.with_driver(home_id, |_| Ok("Static Controller".to_string()))
    }

    fn get_send_queue_count(&self, home_id: u32) -> NativeResult<i32> {
        self.with_driver(home_id, |_| Ok(0))
    }

    fn log_driver_statistics(&self, home_id: u32) -> NativeResult<()> {
        self.with_driver(home_id, |d| {
            let s = &d.statistics;
            tracing::info!(
                home_id = format_args!("0x{:08x}", home_id),
                sof = s.sof_count,
                reads = s.read_count,
                writes = s.write_count,
                acks = s.ack_count,
                naks = s.nak_count,
                dropped = s.dropped,
                retries = s.retries,
                "driver statistics"
            );
            Ok(())
        })
    }

    fn get_controller_interface_type(&self, home_id: u32) -> NativeResult<ControllerInterface> {
        self.with_driver(home_id, |d| Ok(d.interface))
    }

    fn get_controller_path(&self, home_id: u32) -> NativeResult<String> {
        self.with_driver(home_id, |d| Ok(d.controller_path.clone()))
    }

    fn get_driver_statistics(&self, home_id: u32) -> NativeResult<DriverStatistics> {
        self.with_driver(home_id, |d| Ok(d.statistics))
    }

    fn get_poll_interval(&self) -> NativeResult<i32> {
        Ok(self.network.lock().poll_interval)
    }

    fn set_poll_interval(&self, milliseconds: i32, interval_between_polls: bool) -> NativeResult<()> {
        let mut network = self.network.lock();
        network.poll_interval = milliseconds;
        network.interval_between_polls = interval_between_polls;
        Ok(())
    }

    fn enable_poll(&self, id: &ValueId, intensity: u8) -> NativeResult<bool> {
        self.with_value(id, |v| {
            v.poll_intensity = intensity.max(1);
            Ok(())
        })?;
        self.emit_value(NotificationType::PollingEnabled, id);
        Ok(true)
    }

    fn disable_poll(&self, id: &ValueId) -> NativeResult<bool> {
        let was_polled = self.with_value(id, |v| {
            let was = v.poll_intensity > 0;
            v.poll_intensity = 0;
            Ok(was)
        })?;
        if was_polled {
            self.emit_value(NotificationType::PollingDisabled, id);
        }
        Ok(was_polled)
    }

    fn is_polled(&self, id: &ValueId) -> NativeResult<bool> {
        self.with_value(id, |v| Ok(v.poll_intensity > 0))
    }

    fn set_poll_intensity(&self, id: &ValueId, intensity: u8) -> NativeResult<()> {
        self.with_value(id, |v| {
            v.poll_intensity = intensity;
            Ok(())
        })
    }

    fn get_poll_intensity(&self, id: &ValueId) -> NativeResult<u8> {
        self.with_value(id, |v| Ok(v.poll_intensity))
    }

    fn refresh_node_info(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info_received = true)?;
        self.emit_node(NotificationType::NodeProtocolInfo, home_id, node_id);
        self.emit_node(NotificationType::NodeQueriesComplete, home_id, node_id);
        Ok(true)
    }

    fn request_node_state(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        let ids = self.with_node(home_id, node_id, |n| {
            n.values
                .values()
                .filter(|v| !v.write_only)
                .map(|v| v.id)
                .collect::<Vec<_>>()
        })?;
        for id in &ids {
            self.emit_value(NotificationType::ValueRefreshed, id);
        }
        self.emit_node(NotificationType::NodeQueriesComplete, home_id, node_id);
        Ok(true)
    }

    fn request_node_dynamic(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        let ids = self.with_node(home_id, node_id, |n| {
            n.values
                .values()
                .filter(|v| !v.write_only && !v.read_only)
                .map(|v| v.id)
                .collect::<Vec<_>>()
        })?;
        for id in &ids {
            self.emit_value(NotificationType::ValueRefreshed, id);
        }
        Ok(true)
    }

    fn is_node_listening_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info.listening)
    }

    fn is_node_frequent_listening_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info.frequent_listening)
    }

    fn is_node_beaming_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info.beaming)
    }

    fn is_node_routing_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info.routing)
    }

    fn is_node_security_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info.security != 0)
    }

    fn get_node_max_baud_rate(&self, home_id: u32, node_id: u8) -> NativeResult<u32> {
        self.with_node(home_id, node_id, |n| n.info.max_baud_rate)
    }

    fn get_node_version(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.info.version)
    }

    fn get_node_security(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.info.security)
    }

    fn is_node_zwave_plus(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info.zwave_plus)
    }

    fn get_node_basic(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.info.basic)
    }

    fn get_node_generic(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.info.generic)
    }

    fn get_node_specific(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.info.specific)
    }

    fn get_node_type(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.type_name.clone())
    }

    fn get_node_neighbors(&self, home_id: u32, node_id: u8) -> NativeResult<Vec<u8>> {
        self.with_node(home_id, node_id, |n| n.neighbor_ids())
    }

    fn synchronize_node_neighbors(&self, home_id: u32, node_id: u8) -> NativeResult<()> {
        self.with_driver(home_id, |driver| driver.synchronize_neighbors(node_id))
    }

    fn get_node_manufacturer_name(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.manufacturer_name.clone())
    }

    fn get_node_product_name(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.product_name.clone())
    }

    fn get_node_name(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.name.clone())
    }

    fn get_node_location(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.location.clone())
    }

    fn get_node_manufacturer_id(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.manufacturer_id.clone())
    }

    fn get_node_product_type(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.product_type.clone())
    }

    fn get_node_product_id(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.product_id.clone())
    }

    fn set_node_manufacturer_name(&self, home_id: u32, node_id: u8, name: &str) -> NativeResult<()> {
        self.set_node_string(home_id, node_id, |n| n.info.manufacturer_name = name.to_string())
    }

    fn set_node_product_name(&self, home_id: u32, node_id: u8, name: &str) -> NativeResult<()> {
        self.set_node_string(home_id, node_id, |n| n.info.product_name = name.to_string())
    }

    fn set_node_name(&self, home_id: u32, node_id: u8, name: &str) -> NativeResult<()> {
        self.set_node_string(home_id, node_id, |n| n.name = name.to_string())
    }

    fn set_node_location(&self, home_id: u32, node_id: u8, location: &str) -> NativeResult<()> {
        self.set_node_string(home_id, node_id, |n| n.location = location.to_string())
    }

    fn set_node_on(&self, home_id: u32, node_id: u8) -> NativeResult<()> {
        self.set_node_level_inner(home_id, node_id, 0xff)
    }

    fn set_node_off(&self, home_id: u32, node_id: u8) -> NativeResult<()> {
        self.set_node_level_inner(home_id, node_id, 0)
    }

    fn set_node_level(&self, home_id: u32, node_id: u8, level: u8) -> NativeResult<()> {
        self.set_node_level_inner(home_id, node_id, level)
    }

    fn is_node_info_received(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.info_received)
    }

    fn get_node_class_information(
        &self,
        home_id: u32,
        node_id: u8,
        command_class_id: u8,
    ) -> NativeResult<Option<NodeClassInfo>> {
        self.with_node(home_id, node_id, |n| n.classes.get(&command_class_id).cloned())
    }

    fn is_node_awake(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.awake)
    }

    fn is_node_failed(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.with_node(home_id, node_id, |n| n.failed)
    }

    fn get_node_query_stage(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.query_stage.to_string())
    }

    fn get_node_device_type(&self, home_id: u32, node_id: u8) -> NativeResult<u16> {
        self.with_node(home_id, node_id, |n| n.info.device_type)
    }

    fn get_node_device_type_string(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.device_type_name.clone())
    }

    fn get_node_role(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.info.role)
    }

    fn get_node_role_string(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.role_name.clone())
    }

    fn get_node_plus_type(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.info.plus_type)
    }

    fn get_node_plus_type_string(&self, home_id: u32, node_id: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| n.info.plus_type_name.clone())
    }

    fn get_value_label(&self, id: &ValueId) -> NativeResult<String> {
        self.with_value(id, |v| Ok(v.label.clone()))
    }

    fn set_value_label(&self, id: &ValueId, label: &str) -> NativeResult<()> {
        self.with_value(id, |v| {
            v.label = label.to_string();
            Ok(())
        })
    }

    fn get_value_units(&self, id: &ValueId) -> NativeResult<String> {
        self.with_value(id, |v| Ok(v.units.clone()))
    }

    fn set_value_units(&self, id: &ValueId, units: &str) -> NativeResult<()> {
        self.with_value(id, |v| {
            v.units = units.to_string();
            Ok(())
        })
    }

    fn get_value_help(&self, id: &ValueId) -> NativeResult<String> {
        self.with_value(id, |v| Ok(v.help.clone()))
    }

    fn set_value_help(&self, id: &ValueId, help: &str) -> NativeResult<()> {
        self.with_value(id, |v| {
            v.help = help.to_string();
            Ok(())
        })
    }

    fn get_value_min(&self, id: &ValueId) -> NativeResult<i32> {
        self.with_value(id, |v| Ok(v.min))
    }

    fn get_value_max(&self, id: &ValueId) -> NativeResult<i32> {
        self.with_value(id, |v| Ok(v.max))
    }

    fn is_value_read_only(&self, id: &ValueId) -> NativeResult<bool> {
        self.with_value(id, |v| Ok(v.read_only))
    }

    fn is_value_write_only(&self, id: &ValueId) -> NativeResult<bool> {
        self.with_value(id, |v| Ok(v.write_only))
    }

    fn is_value_set(&self, id: &ValueId) -> NativeResult<bool> {
        self.with_value(id, |v| Ok(v.is_set))
    }

    fn get_value_as(&self, id: &ValueId, kind: ValueKind) -> NativeResult<Option<Value>> {
        self.with_value(id, |v| v.read(kind))
    }

    fn get_value_list_items(&self, id: &ValueId) -> NativeResult<Option<Vec<String>>> {
        self.with_value(id, |v| v.list_items().map(Some))
    }

    fn get_value_list_values(&self, id: &ValueId) -> NativeResult<Option<Vec<i32>>> {
        self.with_value(id, |v| v.list_values().map(Some))
    }

    fn get_value_float_precision(&self, id: &ValueId) -> NativeResult<Option<u8>> {
        self.with_value(id, |v| v.float_precision().map(Some))
    }

    fn set_value(&self, id: &ValueId, value: Value) -> NativeResult<bool> {
        self.write_value(id, value)
    }

    fn refresh_value(&self, id: &ValueId) -> NativeResult<bool> {
        let readable = self.with_driver(id.home_id(), |driver| {
            let readable = !driver.value(id)?.write_only;
            if readable {
                driver.record_send();
                driver.record_receive();
            }
            Ok(readable)
        })?;
        if readable {
            self.emit_value(NotificationType::ValueRefreshed, id);
        }
        Ok(readable)
    }

    fn set_change_verified(&self, id: &ValueId, verify: bool) -> NativeResult<()> {
        self.with_value(id, |v| {
            v.change_verified = verify;
            Ok(())
        })
    }

    fn get_change_verified(&self, id: &ValueId) -> NativeResult<bool> {
        self.with_value(id, |v| Ok(v.change_verified))
    }

    fn press_button(&self, id: &ValueId) -> NativeResult<bool> {
        let pressed = self.with_value(id, |v| v.set_button(true))?;
        self.emit_value(NotificationType::ValueChanged, id);
        Ok(pressed)
    }

    fn release_button(&self, id: &ValueId) -> NativeResult<bool> {
        let released = self.with_value(id, |v| v.set_button(false))?;
        self.emit_value(NotificationType::ValueChanged, id);
        Ok(released)
    }

    fn get_num_switch_points(&self, id: &ValueId) -> NativeResult<u8> {
        self.with_value(id, |v| Ok(v.schedule()?.len() as u8))
    }

    fn set_switch_point(&self, id: &ValueId, point: SwitchPoint) -> NativeResult<bool> {
        self.with_value(id, |v| Ok(insert_switch_point(v.schedule_mut()?, point)))
    }

    fn remove_switch_point(&self, id: &ValueId, hours: u8, minutes: u8) -> NativeResult<bool> {
        self.with_value(id, |v| {
            let points = v.schedule_mut()?;
            match points.iter().position(|p| p.hours == hours && p.minutes == minutes) {
                Some(pos) => {
                    points.remove(pos);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn clear_switch_points(&self, id: &ValueId) -> NativeResult<()> {
        self.with_value(id, |v| {
            v.schedule_mut()?.clear();
            Ok(())
        })
    }

    fn get_switch_point(&self, id: &ValueId, idx: u8) -> NativeResult<Option<SwitchPoint>> {
        self.with_value(id, |v| Ok(v.schedule()?.get(idx as usize).copied()))
    }

    fn switch_all_on(&self, home_id: u32) -> NativeResult<()> {
        self.switch_all(home_id, true)
    }

    fn switch_all_off(&self, home_id: u32) -> NativeResult<()> {
        self.switch_all(home_id, false)
    }

    fn set_config_param(&self, home_id: u32, node_id: u8, param: u8, value: i32, size: u8) -> NativeResult<bool> {
        let id = self.with_node(home_id, node_id, |n| {
            n.find_value_mut(CC_CONFIGURATION, param).map(|v| v.id)
        })?;
        let Some(id) = id else {
            tracing::warn!(node_id, param, "node has no such configuration parameter");
            return Ok(false);
        };
        let data = match id.value_type() {
            Some(ValueType::Bool) => Value::Bool(value != 0),
            Some(ValueType::Byte) => Value::Byte(value as u8),
            Some(ValueType::Short) => Value::Short(value as i16),
            Some(ValueType::List) => Value::ListValue(value),
            _ => Value::Int(value),
        };
        tracing::debug!(node_id, param, value, size, "setting configuration parameter");
        self.write_value(&id, data)
    }

    fn request_config_param(&self, home_id: u32, node_id: u8, param: u8) -> NativeResult<()> {
        let id = self.with_node(home_id, node_id, |n| {
            n.find_value_mut(CC_CONFIGURATION, param).map(|v| v.id)
        })?;
        if let Some(id) = id {
            self.emit_value(NotificationType::ValueRefreshed, &id);
        }
        Ok(())
    }

    fn request_all_config_params(&self, home_id: u32, node_id: u8) -> NativeResult<()> {
        let ids = self.with_node(home_id, node_id, |n| {
            n.values
                .values()
                .filter(|v| v.id.command_class_id() == CC_CONFIGURATION)
                .map(|v| v.id)
                .collect::<Vec<_>>()
        })?;
        for id in &ids {
            self.emit_value(NotificationType::ValueRefreshed, id);
        }
        Ok(())
    }

    fn get_num_groups(&self, home_id: u32, node_id: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| n.groups.len() as u8)
    }

    fn get_associations(&self, home_id: u32, node_id: u8, group_idx: u8) -> NativeResult<Vec<u8>> {
        self.with_node(home_id, node_id, |n| {
            n.groups
                .get(&group_idx)
                .map(|g| g.associations.to_vec())
                .unwrap_or_default()
        })
    }

    fn get_max_associations(&self, home_id: u32, node_id: u8, group_idx: u8) -> NativeResult<u8> {
        self.with_node(home_id, node_id, |n| {
            n.groups.get(&group_idx).map(|g| g.max_associations).unwrap_or(0)
        })
    }

    fn get_group_label(&self, home_id: u32, node_id: u8, group_idx: u8) -> NativeResult<String> {
        self.with_node(home_id, node_id, |n| {
            n.groups
                .get(&group_idx)
                .map(|g| g.label.clone())
                .unwrap_or_default()
        })
    }

    fn add_association(&self, home_id: u32, node_id: u8, group_idx: u8, target: u8) -> NativeResult<()> {
        let changed = self.with_node(home_id, node_id, |n| {
            n.groups.get_mut(&group_idx).map(|g| g.add(target)).unwrap_or(false)
        })?;
        if changed {
            self.emit(Notification::new(NotificationType::Group, node_value_id(home_id, node_id)).with_byte(group_idx));
        }
        Ok(())
    }

    fn remove_association(&self, home_id: u32, node_id: u8, group_idx: u8, target: u8) -> NativeResult<()> {
        let changed = self.with_node(home_id, node_id, |n| {
            n.groups.get_mut(&group_idx).map(|g| g.remove(target)).unwrap_or(false)
        })?;
        if changed {
            self.emit(Notification::new(NotificationType::Group, node_value_id(home_id, node_id)).with_byte(group_idx));
        }
        Ok(())
    }

    fn add_watcher(&self, watcher: WatcherFn, context: *mut c_void) -> bool {
        self.notifier.add(watcher, context)
    }

    fn remove_watcher(&self, watcher: WatcherFn, context: *mut c_void) -> bool {
        self.notifier.remove(watcher, context)
    }

    fn reset_controller(&self, home_id: u32) -> NativeResult<()> {
        let mut network = self.network.lock();
        let driver = network
            .drivers
            .get_mut(&home_id)
            .ok_or_else(|| OzwException::invalid_home_id("Invalid HomeId passed to GetDriver"))?;
        let removed: Vec<u8> = driver
            .nodes
            .keys()
            .copied()
            .filter(|&id| id != driver.controller_node_id)
            .collect();
        driver.reset();
        for node_id in removed {
            self.emit_node(NotificationType::NodeRemoved, home_id, node_id);
        }
        self.emit(
            Notification::new(
                NotificationType::DriverReset,
                node_value_id(home_id, driver.controller_node_id),
            )
            .with_com_port(driver.controller_path.as_str()),
        );
        for scene in network.scenes.values_mut() {
            scene.values.retain(|(id, _)| id.home_id() != home_id);
        }
        Ok(())
    }

    fn soft_reset(&self, home_id: u32) -> NativeResult<()> {
        self.with_driver(home_id, |driver| {
            driver.record_send();
            driver.pending_command = ControllerCommand::None;
            Ok(())
        })
    }

    fn cancel_controller_command(&self, home_id: u32) -> NativeResult<bool> {
        self.with_driver(home_id, |driver| {
            let pending = driver.pending_command;
            if pending == ControllerCommand::None {
                return Ok(false);
            }
            driver.pending_command = ControllerCommand::None;
            self.controller_notification(
                home_id,
                driver.controller_node_id,
                pending,
                ControllerState::Cancel,
                ControllerError::None,
            );
            Ok(true)
        })
    }

    fn test_network_node(&self, home_id: u32, node_id: u8, count: u32) -> NativeResult<()> {
        self.with_driver(home_id, |driver| {
            driver.node(node_id)?;
            for _ in 0..count {
                driver.record_send();
            }
            Ok(())
        })?;
        self.emit(
            Notification::new(NotificationType::Notification, node_value_id(home_id, node_id))
                .with_byte(NotificationCode::NoOperation.into()),
        );
        Ok(())
    }

    fn test_network(&self, home_id: u32, count: u32) -> NativeResult<()> {
        let targets = self.with_driver(home_id, |driver| {
            Ok(driver
                .nodes
                .keys()
                .copied()
                .filter(|&id| id != driver.controller_node_id)
                .collect::<Vec<_>>())
        })?;
        for node_id in targets {
            self.test_network_node(home_id, node_id, count)?;
        }
        Ok(())
    }

    fn heal_network_node(&self, home_id: u32, node_id: u8, do_return_routes: bool) -> NativeResult<()> {
        self.with_driver(home_id, |driver| {
            driver.node(node_id)?;
            driver.record_send();
            tracing::debug!(node_id, do_return_routes, "healing node");
            Ok(())
        })
    }

    fn heal_network(&self, home_id: u32, do_return_routes: bool) -> NativeResult<()> {
        let targets = self.with_driver(home_id, |driver| Ok(driver.nodes.keys().copied().collect::<Vec<_>>()))?;
        for node_id in targets {
            self.heal_network_node(home_id, node_id, do_return_routes)?;
        }
        Ok(())
    }

    fn add_node(&self, home_id: u32, secure: bool) -> NativeResult<bool> {
        tracing::debug!(secure, "entering inclusion mode");
        self.begin_command(home_id, 0, ControllerCommand::AddDevice, |_| CommandOutcome::Waiting)
    }

    fn remove_node(&self, home_id: u32) -> NativeResult<bool> {
        self.begin_command(home_id, 0, ControllerCommand::RemoveDevice, |_| CommandOutcome::Waiting)
    }

    fn remove_failed_node(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        let removed = std::cell::Cell::new(false);
        let started = self.begin_command(home_id, node_id, ControllerCommand::RemoveFailedNode, |driver| {
            match driver.nodes.get(&node_id) {
                None => CommandOutcome::Failed(ControllerError::NodeNotFound),
                Some(node) if !node.failed => CommandOutcome::Failed(ControllerError::NotFound),
                Some(_) => {
                    driver.nodes.remove(&node_id);
                    removed.set(true);
                    CommandOutcome::Completed
                }
            }
        })?;
        if removed.get() {
            self.emit_node(NotificationType::NodeRemoved, home_id, node_id);
        }
        Ok(started)
    }

    fn has_node_failed(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.begin_command(home_id, node_id, ControllerCommand::HasNodeFailed, |driver| {
            match driver.nodes.get(&node_id) {
                None => CommandOutcome::Failed(ControllerError::NodeNotFound),
                Some(node) if node.failed => CommandOutcome::NodeFailed,
                Some(_) => CommandOutcome::NodeOk,
            }
        })
    }

    fn request_node_neighbor_update(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.node_command(home_id, node_id, ControllerCommand::RequestNodeNeighborUpdate)
    }

    fn assign_return_route(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.node_command(home_id, node_id, ControllerCommand::AssignReturnRoute)
    }

    fn delete_all_return_routes(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.node_command(home_id, node_id, ControllerCommand::DeleteAllReturnRoutes)
    }

    fn send_node_information(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.node_command(home_id, node_id, ControllerCommand::SendNodeInformation)
    }

    fn create_new_primary(&self, home_id: u32) -> NativeResult<bool> {
        self.begin_command(home_id, 0, ControllerCommand::CreateNewPrimary, |_| CommandOutcome::Waiting)
    }

    fn receive_configuration(&self, home_id: u32) -> NativeResult<bool> {
        self.begin_command(home_id, 0, ControllerCommand::ReceiveConfiguration, |driver| {
            if driver.primary {
                CommandOutcome::Failed(ControllerError::IsPrimary)
            } else {
                CommandOutcome::Waiting
            }
        })
    }

    fn replace_failed_node(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.begin_command(home_id, node_id, ControllerCommand::ReplaceFailedNode, |driver| {
            match driver.nodes.get(&node_id) {
                None => CommandOutcome::Failed(ControllerError::NodeNotFound),
                Some(node) if !node.failed => CommandOutcome::Failed(ControllerError::NotFound),
                Some(_) => CommandOutcome::Waiting,
            }
        })
    }

    fn transfer_primary_role(&self, home_id: u32) -> NativeResult<bool> {
        self.begin_command(home_id, 0, ControllerCommand::TransferPrimaryRole, |driver| {
            if driver.primary {
                CommandOutcome::Waiting
            } else {
                CommandOutcome::Failed(ControllerError::NotPrimary)
            }
        })
    }

    fn request_network_update(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.node_command(home_id, node_id, ControllerCommand::RequestNetworkUpdate)
    }

    fn replication_send(&self, home_id: u32, node_id: u8) -> NativeResult<bool> {
        self.node_command(home_id, node_id, ControllerCommand::ReplicationSend)
    }

    fn create_button(&self, home_id: u32, node_id: u8, button_id: u8) -> NativeResult<bool> {
        let created = std::cell::Cell::new(false);
        let started = self.begin_command(home_id, node_id, ControllerCommand::CreateButton, |driver| {
            match driver.nodes.get_mut(&node_id) {
                None => CommandOutcome::Failed(ControllerError::NodeNotFound),
                Some(node) => {
                    if !node.buttons.contains(&button_id) {
                        node.buttons.push(button_id);
                    }
                    created.set(true);
                    CommandOutcome::Completed
                }
            }
        })?;
        if created.get() {
            self.emit(
                Notification::new(NotificationType::CreateButton, node_value_id(home_id, node_id))
                    .with_byte(button_id),
            );
        }
        Ok(started)
    }

    fn delete_button(&self, home_id: u32, node_id: u8, button_id: u8) -> NativeResult<bool> {
        let deleted = std::cell::Cell::new(false);
        let started = self.begin_command(home_id, node_id, ControllerCommand::DeleteButton, |driver| {
            match driver.nodes.get_mut(&node_id) {
                None => CommandOutcome::Failed(ControllerError::NodeNotFound),
                Some(node) => match node.buttons.iter().position(|&b| b == button_id) {
                    Some(pos) => {
                        node.buttons.remove(pos);
                        deleted.set(true);
                        CommandOutcome::Completed
                    }
                    None => CommandOutcome::Failed(ControllerError::ButtonNotFound),
                },
            }
        })?;
        if deleted.get() {
            self.emit(
                Notification::new(NotificationType::DeleteButton, node_value_id(home_id, node_id))
                    .with_byte(button_id),
            );
        }
        Ok(started)
    }

    fn get_num_scenes(&self) -> NativeResult<u8> {
        Ok(self.network.lock().scenes.len() as u8)
    }

    fn get_all_scenes(&self) -> NativeResult<Vec<u8>> {
        Ok(self.network.lock().scenes.keys().copied().collect())
    }

    fn remove_all_scenes(&self, home_id: u32) -> NativeResult<()> {
        let mut network = self.network.lock();
        for scene in network.scenes.values_mut() {
            scene.values.retain(|(id, _)| id.home_id() != home_id);
        }
        network.scenes.retain(|_, scene| !scene.values.is_empty());
        Ok(())
    }

    fn create_scene(&self) -> NativeResult<u8> {
        let mut network = self.network.lock();
        let id = scene::next_free_id(&network.scenes);
        if id == 0 {
            tracing::warn!("no free scene id");
            return Ok(0);
        }
        network.scenes.insert(id, Scene::default());
        Ok(id)
    }

    fn remove_scene(&self, scene_id: u8) -> NativeResult<bool> {
        Ok(self.network.lock().scenes.remove(&scene_id).is_some())
    }

    fn add_scene_value(&self, scene_id: u8, id: &ValueId, value: Value) -> NativeResult<bool> {
        match self.network.lock().scenes.get_mut(&scene_id) {
            Some(scene) => scene.add(*id, value),
            None => Ok(false),
        }
    }

    fn remove_scene_value(&self, scene_id: u8, id: &ValueId) -> NativeResult<bool> {
        Ok(self
            .network
            .lock()
            .scenes
            .get_mut(&scene_id)
            .map(|s| s.remove(id))
            .unwrap_or(false))
    }

    fn scene_get_values(&self, scene_id: u8) -> NativeResult<Vec<ValueId>> {
        Ok(self
            .network
            .lock()
            .scenes
            .get(&scene_id)
            .map(|s| s.values.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default())
    }

    fn scene_get_value_as(&self, scene_id: u8, id: &ValueId, kind: ValueKind) -> NativeResult<Option<Value>> {
        match self.network.lock().scenes.get(&scene_id) {
            Some(scene) => scene.get(id, kind),
            None => Ok(None),
        }
    }

    fn set_scene_value(&self, scene_id: u8, id: &ValueId, value: Value) -> NativeResult<bool> {
        match self.network.lock().scenes.get_mut(&scene_id) {
            Some(scene) => scene.set(id, value),
            None => Ok(false),
        }
    }

    fn get_scene_label(&self, scene_id: u8) -> NativeResult<String> {
        Ok(self
            .network
            .lock()
            .scenes
            .get(&scene_id)
            .map(|s| s.label.clone())
            .unwrap_or_default())
    }

    fn set_scene_label(&self, scene_id: u8, label: &str) -> NativeResult<()> {
        if let Some(scene) = self.network.lock().scenes.get_mut(&scene_id) {
            scene.label = label.to_string();
        }
        Ok(())
    }

    fn scene_exists(&self, scene_id: u8) -> NativeResult<bool> {
        Ok(self.network.lock().scenes.contains_key(&scene_id))
    }

    fn activate_scene(&self, scene_id: u8) -> NativeResult<bool> {
        let values = match self.network.lock().scenes.get(&scene_id) {
            Some(scene) => scene.values.clone(),
            None => return Ok(false),
        };
        let mut all_applied = true;
        for (id, value) in values {
            match self.write_value(&id, value) {
                Ok(applied) => all_applied &= applied,
                Err(e) if e.kind() == ExceptionKind::InvalidHomeId || e.kind() == ExceptionKind::InvalidValueId => {
                    tracing::warn!(%id, error = %e, "scene value no longer exists");
                    all_applied = false;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(all_applied)
    }
}

static INSTANCE: Mutex<Option<Arc<VirtualManager>>> = const_mutex(None);

/// Creates the process-wide manager, or returns the existing instance.
///
/// Fails with an options exception unless the options exist and are locked.
pub fn create() -> NativeResult<Arc<VirtualManager>> {
    let mut instance = INSTANCE.lock();
    if let Some(existing) = instance.as_ref() {
        return Ok(Arc::clone(existing));
    }
    let options = crate::options::get()
        .ok_or_else(|| OzwException::options("Options Not Created and Locked"))?;
    let manager = Arc::new(VirtualManager::new(options)?);
    *instance = Some(Arc::clone(&manager));
    tracing::info!("manager created");
    Ok(manager)
}

pub fn get() -> Option<Arc<VirtualManager>> {
    INSTANCE.lock().clone()
}

/// Destroys the process-wide manager after delivering pending notifications.
pub fn destroy() {
    let manager = INSTANCE.lock().take();
    if let Some(manager) = manager {
        manager.shutdown();
        tracing::info!("manager destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{SENSOR_NODE_ID, SWITCH_NODE_ID, THERMOSTAT_NODE_ID};
    use ozw_core::value_id::{ValueGenre, ValueType};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;

    fn manager() -> VirtualManager {
        let options = Arc::new(VirtualOptions::new("", "", ""));
        options.lock();
        VirtualManager::new(options).unwrap()
    }

    fn started() -> (VirtualManager, u32) {
        let m = manager();
        assert!(m.add_driver("usb", ControllerInterface::Serial).unwrap());
        (m, home_id_for_path("usb"))
    }

    fn switch_id(home: u32) -> ValueId {
        ValueId::new(home, SWITCH_NODE_ID, ValueGenre::User, CC_SWITCH_BINARY, 1, 0, ValueType::Bool)
    }

    fn record(n: &Notification, context: *mut c_void) {
        let log = unsafe { &*(context as *const StdMutex<Vec<Notification>>) };
        log.lock().unwrap().push(n.clone());
    }

    #[test]
    fn test_unlocked_options_refuse_manager() {
        let options = Arc::new(VirtualOptions::new("", "", ""));
        let err = VirtualManager::new(options).err().unwrap();
        assert_eq!(err.kind(), ExceptionKind::Options);
    }

    #[test]
    fn test_add_driver_twice_fails() {
        let (m, _) = started();
        assert!(!m.add_driver("usb", ControllerInterface::Serial).unwrap());
        assert!(m.remove_driver("usb").unwrap());
        assert!(!m.remove_driver("usb").unwrap());
    }

    #[test]
    fn test_unknown_home_id_raises() {
        let m = manager();
        let err = m.get_controller_node_id(0x1234).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::InvalidHomeId);
        let err = m.get_value_as(&switch_id(0x1234), ValueKind::Bool).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::InvalidHomeId);
    }

    #[test]
    fn test_set_and_get_switch() {
        let (m, home) = started();
        let id = switch_id(home);
        assert_eq!(m.get_value_as(&id, ValueKind::Bool).unwrap(), Some(Value::Bool(false)));
        assert!(m.set_value(&id, Value::Bool(true)).unwrap());
        assert_eq!(m.get_value_as(&id, ValueKind::Bool).unwrap(), Some(Value::Bool(true)));
        assert_eq!(m.get_driver_statistics(home).unwrap().write_count, 1);
    }

    #[test]
    fn test_set_node_off_updates_basic_and_switch() {
        let (m, home) = started();
        m.set_node_on(home, SWITCH_NODE_ID).unwrap();
        assert_eq!(m.get_value_as(&switch_id(home), ValueKind::Bool).unwrap(), Some(Value::Bool(true)));
        m.switch_all_off(home).unwrap();
        assert_eq!(m.get_value_as(&switch_id(home), ValueKind::Bool).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn test_driver_startup_and_value_change_are_notified_in_order() {
        let log = StdMutex::new(Vec::<Notification>::new());
        let ctx = &log as *const _ as *mut c_void;
        let m = manager();
        assert!(m.add_watcher(record, ctx));
        m.add_driver("usb", ControllerInterface::Serial).unwrap();
        let home = home_id_for_path("usb");
        m.set_value(&switch_id(home), Value::Bool(true)).unwrap();
        m.shutdown();

        let log = log.lock().unwrap();
        assert_eq!(log.first().map(|n| n.kind()), Some(NotificationType::DriverReady));
        assert_eq!(log[0].com_port(), "usb");
        assert_eq!(log[0].home_id(), home);
        let last = log.last().unwrap();
        assert_eq!(last.kind(), NotificationType::ValueChanged);
        assert_eq!(last.value_id(), &switch_id(home));
        let queried = log
            .iter()
            .position(|n| n.kind() == NotificationType::AllNodesQueried)
            .unwrap();
        assert!(queried < log.len() - 1);
    }

    #[test]
    fn test_config_param_maps_to_value_type() {
        let (m, home) = started();
        assert!(m.set_config_param(home, SWITCH_NODE_ID, 1, 2, 1).unwrap());
        let id = ValueId::new(home, SWITCH_NODE_ID, ValueGenre::Config, CC_CONFIGURATION, 1, 1, ValueType::List);
        assert_eq!(
            m.get_value_as(&id, ValueKind::ListSelection).unwrap(),
            Some(Value::ListSelection("On When Switched Off".into()))
        );
        assert!(!m.set_config_param(home, SWITCH_NODE_ID, 42, 1, 1).unwrap());
    }

    #[test]
    fn test_associations() {
        let (m, home) = started();
        assert_eq!(m.get_num_groups(home, SENSOR_NODE_ID).unwrap(), 2);
        assert_eq!(m.get_group_label(home, SENSOR_NODE_ID, 2).unwrap(), "Reports");
        m.add_association(home, SENSOR_NODE_ID, 2, SWITCH_NODE_ID).unwrap();
        assert_eq!(m.get_associations(home, SENSOR_NODE_ID, 2).unwrap(), vec![SWITCH_NODE_ID]);
        m.remove_association(home, SENSOR_NODE_ID, 2, SWITCH_NODE_ID).unwrap();
        assert!(m.get_associations(home, SENSOR_NODE_ID, 2).unwrap().is_empty());
    }

    #[test]
    fn test_controller_command_busy_and_cancel() {
        let (m, home) = started();
        assert!(m.add_node(home, false).unwrap());
        assert!(!m.remove_node(home).unwrap());
        assert!(m.cancel_controller_command(home).unwrap());
        assert!(!m.cancel_controller_command(home).unwrap());
        assert!(m.has_node_failed(home, SWITCH_NODE_ID).unwrap());
    }

    #[test]
    fn test_buttons() {
        let (m, home) = started();
        assert!(m.create_button(home, THERMOSTAT_NODE_ID, 3).unwrap());
        assert!(m.delete_button(home, THERMOSTAT_NODE_ID, 3).unwrap());
    }

    #[test]
    fn test_scenes_activate_values() {
        let (m, home) = started();
        let scene = m.create_scene().unwrap();
        assert_eq!(scene, 1);
        assert!(m.add_scene_value(scene, &switch_id(home), Value::Bool(true)).unwrap());
        m.set_scene_label(scene, "Evening").unwrap();
        assert_eq!(m.get_scene_label(scene).unwrap(), "Evening");
        assert_eq!(m.scene_get_values(scene).unwrap(), vec![switch_id(home)]);
        assert!(m.activate_scene(scene).unwrap());
        assert_eq!(m.get_value_as(&switch_id(home), ValueKind::Bool).unwrap(), Some(Value::Bool(true)));
        m.remove_all_scenes(home).unwrap();
        assert!(!m.scene_exists(scene).unwrap());
    }

    #[test]
    fn test_schedule_operations() {
        let (m, home) = started();
        let id = ValueId::new(
            home,
            THERMOSTAT_NODE_ID,
            ValueGenre::User,
            crate::inventory::CC_CLIMATE_CONTROL_SCHEDULE,
            1,
            1,
            ValueType::Schedule,
        );
        assert_eq!(m.get_num_switch_points(&id).unwrap(), 2);
        assert!(m.set_switch_point(&id, SwitchPoint { hours: 12, minutes: 0, setback: 5 }).unwrap());
        assert_eq!(m.get_switch_point(&id, 1).unwrap().map(|p| p.hours), Some(12));
        assert!(m.remove_switch_point(&id, 6, 30).unwrap());
        m.clear_switch_points(&id).unwrap();
        assert_eq!(m.get_num_switch_points(&id).unwrap(), 0);
        assert_eq!(m.get_switch_point(&id, 0).unwrap(), None);
    }
}
