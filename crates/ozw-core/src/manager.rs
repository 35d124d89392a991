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

//! The native manager surface.
//!
//! [`Manager`] mirrors the operations of the native network manager. Every
//! operation returns a [`NativeResult`]: an `Err` stands for an exception
//! raised by the native call. Operations documented as returning `Option`
//! report "not applicable" as `None`.

use crate::exception::NativeResult;
use crate::notification::WatcherFn;
use crate::value_id::{ValueId, ValueType};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::ffi::c_void;

/// Physical interface of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ControllerInterface {
    #[default]
    Unknown = 0,
    Serial = 1,
    Hid = 2,
}

/// Typed data read from or written to a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Float(f32),
    Int(i32),
    Short(i16),
    String(String),
    Raw(Vec<u8>),
    /// A list selection by item label.
    ListSelection(String),
    /// A list selection by item value.
    ListValue(i32),
}

/// The requested representation when reading a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Byte,
    Float,
    Int,
    Short,
    String,
    Raw,
    ListSelection,
    ListValue,
}

impl ValueKind {
    /// The value type a value must have to be read as this kind.
    ///
    /// `String` is special: every value can be rendered as a string.
    pub fn required_type(&self) -> Option<ValueType> {
        match self {
            Self::Bool => Some(ValueType::Bool),
            Self::Byte => Some(ValueType::Byte),
            Self::Float => Some(ValueType::Decimal),
            Self::Int => Some(ValueType::Int),
            Self::Short => Some(ValueType::Short),
            Self::String => None,
            Self::Raw => Some(ValueType::Raw),
            Self::ListSelection | Self::ListValue => Some(ValueType::List),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Byte(_) => ValueKind::Byte,
            Self::Float(_) => ValueKind::Float,
            Self::Int(_) => ValueKind::Int,
            Self::Short(_) => ValueKind::Short,
            Self::String(_) => ValueKind::String,
            Self::Raw(_) => ValueKind::Raw,
            Self::ListSelection(_) => ValueKind::ListSelection,
            Self::ListValue(_) => ValueKind::ListValue,
        }
    }
}

/// One entry of a climate control schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchPoint {
    pub hours: u8,
    pub minutes: u8,
    pub setback: i8,
}

/// Name and version of a command class supported by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeClassInfo {
    pub name: String,
    pub version: u8,
}

/// Serial link counters of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverStatistics {
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

/// The native network manager.
pub trait Manager: Send + Sync {
    // Configuration

    fn write_config(&self, home_id: u32) -> NativeResult<()>;

    // Drivers

    /// Starts a driver for the controller at `controller_path`. Returns
    /// `false` if a driver for that path already exists.
    fn add_driver(&self, controller_path: &str, interface: ControllerInterface) -> NativeResult<bool>;
    fn remove_driver(&self, controller_path: &str) -> NativeResult<bool>;
    fn get_controller_node_id(&self, home_id: u32) -> NativeResult<u8>;
    fn get_suc_node_id(&self, home_id: u32) -> NativeResult<u8>;
    fn is_primary_controller(&self, home_id: u32) -> NativeResult<bool>;
    fn is_static_update_controller(&self, home_id: u32) -> NativeResult<bool>;
    fn is_bridge_controller(&self, home_id: u32) -> NativeResult<bool>;
    fn get_library_version(&self, home_id: u32) -> NativeResult<String>;
    fn get_library_type_name(&self, home_id: u32) -> NativeResult<String>;
    fn get_send_queue_count(&self, home_id: u32) -> NativeResult<i32>;
    fn log_driver_statistics(&self, home_id: u32) -> NativeResult<()>;
    fn get_controller_interface_type(&self, home_id: u32) -> NativeResult<ControllerInterface>;
    fn get_controller_path(&self, home_id: u32) -> NativeResult<String>;
    fn get_driver_statistics(&self, home_id: u32) -> NativeResult<DriverStatistics>;

    // Polling

    fn get_poll_interval(&self) -> NativeResult<i32>;
    fn set_poll_interval(&self, milliseconds: i32, interval_between_polls: bool) -> NativeResult<()>;
    fn enable_poll(&self, id: &ValueId, intensity: u8) -> NativeResult<bool>;
    fn disable_poll(&self, id: &ValueId) -> NativeResult<bool>;
    fn is_polled(&self, id: &ValueId) -> NativeResult<bool>;
    fn set_poll_intensity(&self, id: &ValueId, intensity: u8) -> NativeResult<()>;
    fn get_poll_intensity(&self, id: &ValueId) -> NativeResult<u8>;

    // Node information

    fn refresh_node_info(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn request_node_state(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn request_node_dynamic(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn is_node_listening_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn is_node_frequent_listening_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn is_node_beaming_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn is_node_routing_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn is_node_security_device(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn get_node_max_baud_rate(&self, home_id: u32, node_id: u8) -> NativeResult<u32>;
    fn get_node_version(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn get_node_security(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn is_node_zwave_plus(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn get_node_basic(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn get_node_generic(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn get_node_specific(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn get_node_type(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_neighbors(&self, home_id: u32, node_id: u8) -> NativeResult<Vec<u8>>;

    /// Reloads the node's neighbor list from the controller's routing table.
    fn synchronize_node_neighbors(&self, home_id: u32, node_id: u8) -> NativeResult<()>;
    fn get_node_manufacturer_name(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_product_name(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_name(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_location(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_manufacturer_id(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_product_type(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_product_id(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn set_node_manufacturer_name(&self, home_id: u32, node_id: u8, name: &str) -> NativeResult<()>;
    fn set_node_product_name(&self, home_id: u32, node_id: u8, name: &str) -> NativeResult<()>;
    fn set_node_name(&self, home_id: u32, node_id: u8, name: &str) -> NativeResult<()>;
    fn set_node_location(&self, home_id: u32, node_id: u8, location: &str) -> NativeResult<()>;
    fn set_node_on(&self, home_id: u32, node_id: u8) -> NativeResult<()>;
    fn set_node_off(&self, home_id: u32, node_id: u8) -> NativeResult<()>;
    fn set_node_level(&self, home_id: u32, node_id: u8, level: u8) -> NativeResult<()>;
    fn is_node_info_received(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn get_node_class_information(
        &self,
        home_id: u32,
        node_id: u8,
        command_class_id: u8,
    ) -> NativeResult<Option<NodeClassInfo>>;
    fn is_node_awake(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn is_node_failed(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn get_node_query_stage(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_device_type(&self, home_id: u32, node_id: u8) -> NativeResult<u16>;
    fn get_node_device_type_string(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_role(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn get_node_role_string(&self, home_id: u32, node_id: u8) -> NativeResult<String>;
    fn get_node_plus_type(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn get_node_plus_type_string(&self, home_id: u32, node_id: u8) -> NativeResult<String>;

    // Values

    fn get_value_label(&self, id: &ValueId) -> NativeResult<String>;
    fn set_value_label(&self, id: &ValueId, label: &str) -> NativeResult<()>;
    fn get_value_units(&self, id: &ValueId) -> NativeResult<String>;
    fn set_value_units(&self, id: &ValueId, units: &str) -> NativeResult<()>;
    fn get_value_help(&self, id: &ValueId) -> NativeResult<String>;
    fn set_value_help(&self, id: &ValueId, help: &str) -> NativeResult<()>;
    fn get_value_min(&self, id: &ValueId) -> NativeResult<i32>;
    fn get_value_max(&self, id: &ValueId) -> NativeResult<i32>;
    fn is_value_read_only(&self, id: &ValueId) -> NativeResult<bool>;
    fn is_value_write_only(&self, id: &ValueId) -> NativeResult<bool>;
    fn is_value_set(&self, id: &ValueId) -> NativeResult<bool>;

    /// Reads the value in the requested representation.
    ///
    /// Raises `CannotConvertValueId` if the value's type does not match
    /// `kind`, and `InvalidValueId` if the value does not exist.
    fn get_value_as(&self, id: &ValueId, kind: ValueKind) -> NativeResult<Option<Value>>;
    fn get_value_list_items(&self, id: &ValueId) -> NativeResult<Option<Vec<String>>>;
    fn get_value_list_values(&self, id: &ValueId) -> NativeResult<Option<Vec<i32>>>;
    fn get_value_float_precision(&self, id: &ValueId) -> NativeResult<Option<u8>>;

    /// Writes a value. Returns `false` for read-only values or values the
    /// new data cannot be applied to.
    fn set_value(&self, id: &ValueId, value: Value) -> NativeResult<bool>;
    fn refresh_value(&self, id: &ValueId) -> NativeResult<bool>;
    fn set_change_verified(&self, id: &ValueId, verify: bool) -> NativeResult<()>;
    fn get_change_verified(&self, id: &ValueId) -> NativeResult<bool>;
    fn press_button(&self, id: &ValueId) -> NativeResult<bool>;
    fn release_button(&self, id: &ValueId) -> NativeResult<bool>;

    // Climate control schedules

    fn get_num_switch_points(&self, id: &ValueId) -> NativeResult<u8>;
    fn set_switch_point(&self, id: &ValueId, point: SwitchPoint) -> NativeResult<bool>;
    fn remove_switch_point(&self, id: &ValueId, hours: u8, minutes: u8) -> NativeResult<bool>;
    fn clear_switch_points(&self, id: &ValueId) -> NativeResult<()>;
    fn get_switch_point(&self, id: &ValueId, idx: u8) -> NativeResult<Option<SwitchPoint>>;

    // Switch all

    fn switch_all_on(&self, home_id: u32) -> NativeResult<()>;
    fn switch_all_off(&self, home_id: u32) -> NativeResult<()>;

    // Configuration parameters

    fn set_config_param(&self, home_id: u32, node_id: u8, param: u8, value: i32, size: u8) -> NativeResult<bool>;
    fn request_config_param(&self, home_id: u32, node_id: u8, param: u8) -> NativeResult<()>;
    fn request_all_config_params(&self, home_id: u32, node_id: u8) -> NativeResult<()>;

    // Groups

    fn get_num_groups(&self, home_id: u32, node_id: u8) -> NativeResult<u8>;
    fn get_associations(&self, home_id: u32, node_id: u8, group_idx: u8) -> NativeResult<Vec<u8>>;
    fn get_max_associations(&self, home_id: u32, node_id: u8, group_idx: u8) -> NativeResult<u8>;
    fn get_group_label(&self, home_id: u32, node_id: u8, group_idx: u8) -> NativeResult<String>;
    fn add_association(&self, home_id: u32, node_id: u8, group_idx: u8, target: u8) -> NativeResult<()>;
    fn remove_association(&self, home_id: u32, node_id: u8, group_idx: u8, target: u8) -> NativeResult<()>;

    // Watchers

    /// Registers a watcher. Returns `false` if the same pair is registered.
    fn add_watcher(&self, watcher: WatcherFn, context: *mut c_void) -> bool;

    /// Removes the watcher registered with exactly this pair. Once this
    /// returns, the watcher is not called again.
    fn remove_watcher(&self, watcher: WatcherFn, context: *mut c_void) -> bool;

    // Controller

    fn reset_controller(&self, home_id: u32) -> NativeResult<()>;
    fn soft_reset(&self, home_id: u32) -> NativeResult<()>;
    fn cancel_controller_command(&self, home_id: u32) -> NativeResult<bool>;

    // Network commands

    fn test_network_node(&self, home_id: u32, node_id: u8, count: u32) -> NativeResult<()>;
    fn test_network(&self, home_id: u32, count: u32) -> NativeResult<()>;
    fn heal_network_node(&self, home_id: u32, node_id: u8, do_return_routes: bool) -> NativeResult<()>;
    fn heal_network(&self, home_id: u32, do_return_routes: bool) -> NativeResult<()>;
    fn add_node(&self, home_id: u32, secure: bool) -> NativeResult<bool>;
    fn remove_node(&self, home_id: u32) -> NativeResult<bool>;
    fn remove_failed_node(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn has_node_failed(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn request_node_neighbor_update(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn assign_return_route(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn delete_all_return_routes(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn send_node_information(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn create_new_primary(&self, home_id: u32) -> NativeResult<bool>;
    fn receive_configuration(&self, home_id: u32) -> NativeResult<bool>;
    fn replace_failed_node(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn transfer_primary_role(&self, home_id: u32) -> NativeResult<bool>;
    fn request_network_update(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn replication_send(&self, home_id: u32, node_id: u8) -> NativeResult<bool>;
    fn create_button(&self, home_id: u32, node_id: u8, button_id: u8) -> NativeResult<bool>;
    fn delete_button(&self, home_id: u32, node_id: u8, button_id: u8) -> NativeResult<bool>;

    // Scenes

    fn get_num_scenes(&self) -> NativeResult<u8>;
    fn get_all_scenes(&self) -> NativeResult<Vec<u8>>;
    fn remove_all_scenes(&self, home_id: u32) -> NativeResult<()>;

    /// Creates a scene and returns its id, or `0` if no id is free.
    fn create_scene(&self) -> NativeResult<u8>;
    fn remove_scene(&self, scene_id: u8) -> NativeResult<bool>;
    fn add_scene_value(&self, scene_id: u8, id: &ValueId, value: Value) -> NativeResult<bool>;
    fn remove_scene_value(&self, scene_id: u8, id: &ValueId) -> NativeResult<bool>;
    fn scene_get_values(&self, scene_id: u8) -> NativeResult<Vec<ValueId>>;
    fn scene_get_value_as(&self, scene_id: u8, id: &ValueId, kind: ValueKind) -> NativeResult<Option<Value>>;
    fn set_scene_value(&self, scene_id: u8, id: &ValueId, value: Value) -> NativeResult<bool>;
    fn get_scene_label(&self, scene_id: u8) -> NativeResult<String>;
    fn set_scene_label(&self, scene_id: u8, label: &str) -> NativeResult<()>;
    fn scene_exists(&self, scene_id: u8) -> NativeResult<bool>;
    fn activate_scene(&self, scene_id: u8) -> NativeResult<bool>;
}
