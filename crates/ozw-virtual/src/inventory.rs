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

//! The device inventory every virtual controller starts with.
//!
//! | node | device                         |
//! |------|--------------------------------|
//! | 1    | static controller              |
//! | 2    | binary power switch            |
//! | 3    | battery multilevel sensor      |
//! | 4    | thermostat with energy meter   |

use crate::node::{Group, Node, NodeInfo};
use crate::value::{ListItem, ValueData, ValueRecord};
use ozw_core::manager::SwitchPoint;
use ozw_core::value_id::{ValueGenre, ValueId, ValueType};

pub const CONTROLLER_NODE_ID: u8 = 1;
pub const SWITCH_NODE_ID: u8 = 2;
pub const SENSOR_NODE_ID: u8 = 3;
pub const THERMOSTAT_NODE_ID: u8 = 4;

pub const CC_BASIC: u8 = 0x20;
pub const CC_SWITCH_BINARY: u8 = 0x25;
pub const CC_SENSOR_MULTILEVEL: u8 = 0x31;
pub const CC_METER: u8 = 0x32;
pub const CC_THERMOSTAT_MODE: u8 = 0x40;
pub const CC_THERMOSTAT_SETPOINT: u8 = 0x43;
pub const CC_CLIMATE_CONTROL_SCHEDULE: u8 = 0x46;
pub const CC_USER_CODE: u8 = 0x63;
pub const CC_CONFIGURATION: u8 = 0x70;
pub const CC_MANUFACTURER_SPECIFIC: u8 = 0x72;
pub const CC_BATTERY: u8 = 0x80;
pub const CC_WAKE_UP: u8 = 0x84;
pub const CC_ASSOCIATION: u8 = 0x85;
pub const CC_VERSION: u8 = 0x86;

fn vid(home_id: u32, node_id: u8, genre: ValueGenre, cc: u8, index: u8, ty: ValueType) -> ValueId {
    ValueId::new(home_id, node_id, genre, cc, 1, index, ty)
}

fn slave_info(generic: u8, specific: u8, type_name: &str, product: &str, listening: bool) -> NodeInfo {
    NodeInfo {
        basic: 0x04,
        generic,
        specific,
        type_name: type_name.to_string(),
        manufacturer_id: "0x7fff".to_string(),
        product_type: "0x0002".to_string(),
        product_id: format!("0x{:04x}", generic as u16),
        manufacturer_name: "Virtual Devices".to_string(),
        product_name: product.to_string(),
        listening,
        frequent_listening: false,
        beaming: true,
        routing: listening,
        security: 0,
        max_baud_rate: 40_000,
        version: 4,
        zwave_plus: true,
        device_type: 0x0700,
        device_type_name: type_name.to_string(),
        role: if listening { 5 } else { 6 },
        role_name: if listening {
            "Always On Slave".to_string()
        } else {
            "Sleeping Reporting Slave".to_string()
        },
        plus_type: 0,
        plus_type_name: "Z-Wave+ node".to_string(),
    }
}

fn add_common_classes(node: &mut Node) {
    node.add_class(CC_BASIC, "COMMAND_CLASS_BASIC", 1);
    node.add_class(CC_MANUFACTURER_SPECIFIC, "COMMAND_CLASS_MANUFACTURER_SPECIFIC", 2);
    node.add_class(CC_VERSION, "COMMAND_CLASS_VERSION", 2);
    node.add_class(CC_ASSOCIATION, "COMMAND_CLASS_ASSOCIATION", 2);
    node.add_class(CC_CONFIGURATION, "COMMAND_CLASS_CONFIGURATION", 1);
}

fn basic_value(home_id: u32, node_id: u8) -> ValueRecord {
    ValueRecord::new(
        vid(home_id, node_id, ValueGenre::Basic, CC_BASIC, 0, ValueType::Byte),
        "Basic",
        ValueData::Byte(0),
    )
    .range(0, 255)
}

fn controller(home_id: u32) -> Node {
    let mut info = slave_info(0x02, 0x07, "Static PC Controller", "Virtual Controller", true);
    info.basic = 0x02;
    info.device_type = 0x0100;
    info.device_type_name = "Central Controller".to_string();
    info.role = 0;
    info.role_name = "Central Static Controller".to_string();

    let mut node = Node::new(CONTROLLER_NODE_ID, info);
    node.add_class(CC_BASIC, "COMMAND_CLASS_BASIC", 1);
    node.add_class(CC_VERSION, "COMMAND_CLASS_VERSION", 2);
    node.add_value(
        ValueRecord::new(
            vid(home_id, CONTROLLER_NODE_ID, ValueGenre::System, CC_VERSION, 0, ValueType::String),
            "Library Version",
            ValueData::String("3".to_string()),
        )
        .read_only(),
    );
    node.add_value(
        ValueRecord::new(
            vid(home_id, CONTROLLER_NODE_ID, ValueGenre::System, CC_VERSION, 1, ValueType::String),
            "Protocol Version",
            ValueData::String("4.05".to_string()),
        )
        .read_only(),
    );
    node
}

fn switch(home_id: u32) -> Node {
    let id = SWITCH_NODE_ID;
    let mut node = Node::new(id, slave_info(0x10, 0x01, "Binary Power Switch", "Virtual Switch", true));
    add_common_classes(&mut node);
    node.add_class(CC_SWITCH_BINARY, "COMMAND_CLASS_SWITCH_BINARY", 1);

    node.add_value(basic_value(home_id, id));
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::User, CC_SWITCH_BINARY, 0, ValueType::Bool),
            "Switch",
            ValueData::Bool(false),
        )
        .help("Turn the power on or off"),
    );
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::Config, CC_CONFIGURATION, 1, ValueType::List),
            "LED Behaviour",
            ValueData::List {
                items: vec![
                    ListItem::new("Off", 0),
                    ListItem::new("On When Switched On", 1),
                    ListItem::new("On When Switched Off", 2),
                ],
                selected: Some(1),
            },
        )
        .range(0, 2),
    );
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::Config, CC_CONFIGURATION, 2, ValueType::Int),
            "Auto Off Timer",
            ValueData::Int(0),
        )
        .units("seconds")
        .range(0, 65_535)
        .help("Turn the switch off after this many seconds. 0 disables the timer."),
    );
    node.groups.insert(1, Group::new("Lifeline", 5).with(CONTROLLER_NODE_ID));
    node
}

fn sensor(home_id: u32) -> Node {
    let id = SENSOR_NODE_ID;
    let mut info = slave_info(0x21, 0x01, "Routing Multilevel Sensor", "Virtual Sensor", false);
    info.frequent_listening = false;
    let mut node = Node::new(id, info);
    add_common_classes(&mut node);
    node.add_class(CC_SENSOR_MULTILEVEL, "COMMAND_CLASS_SENSOR_MULTILEVEL", 5);
    node.add_class(CC_BATTERY, "COMMAND_CLASS_BATTERY", 1);
    node.add_class(CC_WAKE_UP, "COMMAND_CLASS_WAKE_UP", 2);

    node.add_value(basic_value(home_id, id));
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::User, CC_SENSOR_MULTILEVEL, 1, ValueType::Decimal),
            "Temperature",
            ValueData::Decimal { value: 21.5, precision: 1 },
        )
        .units("C")
        .read_only(),
    );
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::User, CC_BATTERY, 0, ValueType::Byte),
            "Battery Level",
            ValueData::Byte(100),
        )
        .units("%")
        .range(0, 100)
        .read_only(),
    );
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::System, CC_WAKE_UP, 0, ValueType::Int),
            "Wake-up Interval",
            ValueData::Int(3600),
        )
        .units("seconds")
        .range(240, 86_400),
    );
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::Config, CC_CONFIGURATION, 3, ValueType::Short),
            "Report Interval",
            ValueData::Short(10),
        )
        .units("minutes")
        .range(1, 1440),
    );
    node.groups.insert(1, Group::new("Lifeline", 5).with(CONTROLLER_NODE_ID));
    node.groups.insert(2, Group::new("Reports", 5));
    node
}

fn thermostat(home_id: u32) -> Node {
    let id = THERMOSTAT_NODE_ID;
    let mut node = Node::new(id, slave_info(0x08, 0x06, "General Thermostat V2", "Virtual Thermostat", true));
    add_common_classes(&mut node);
    node.add_class(CC_THERMOSTAT_MODE, "COMMAND_CLASS_THERMOSTAT_MODE", 3);
    node.add_class(CC_THERMOSTAT_SETPOINT, "COMMAND_CLASS_THERMOSTAT_SETPOINT", 3);
    node.add_class(CC_CLIMATE_CONTROL_SCHEDULE, "COMMAND_CLASS_CLIMATE_CONTROL_SCHEDULE", 1);
    node.add_class(CC_METER, "COMMAND_CLASS_METER", 3);
    node.add_class(CC_USER_CODE, "COMMAND_CLASS_USER_CODE", 1);

    node.add_value(basic_value(home_id, id));
    node.add_value(ValueRecord::new(
        vid(home_id, id, ValueGenre::User, CC_THERMOSTAT_MODE, 0, ValueType::List),
        "Mode",
        ValueData::List {
            items: vec![
                ListItem::new("Off", 0),
                ListItem::new("Heat", 1),
                ListItem::new("Cool", 2),
                ListItem::new("Auto", 3),
            ],
            selected: Some(1),
        },
    ));
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::User, CC_THERMOSTAT_SETPOINT, 1, ValueType::Decimal),
            "Heating 1",
            ValueData::Decimal { value: 20.0, precision: 1 },
        )
        .units("C"),
    );
    node.add_value(ValueRecord::new(
        vid(home_id, id, ValueGenre::User, CC_CLIMATE_CONTROL_SCHEDULE, 1, ValueType::Schedule),
        "Monday",
        ValueData::Schedule(vec![
            SwitchPoint { hours: 6, minutes: 30, setback: 0 },
            SwitchPoint { hours: 22, minutes: 0, setback: -20 },
        ]),
    ));
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::User, CC_METER, 0, ValueType::Decimal),
            "Energy",
            ValueData::Decimal { value: 12.345, precision: 3 },
        )
        .units("kWh")
        .read_only(),
    );
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::System, CC_METER, 33, ValueType::Button),
            "Reset",
            ValueData::Button { pressed: false },
        )
        .write_only(),
    );
    node.add_value(ValueRecord::new(
        vid(home_id, id, ValueGenre::User, CC_USER_CODE, 1, ValueType::Raw),
        "Code 1:",
        ValueData::Raw(vec![0x31, 0x32, 0x33, 0x34]),
    ));
    node.add_value(
        ValueRecord::new(
            vid(home_id, id, ValueGenre::Config, CC_CONFIGURATION, 4, ValueType::Byte),
            "Display Brightness",
            ValueData::Byte(50),
        )
        .units("%")
        .range(0, 100),
    );
    node.add_value(ValueRecord::new(
        vid(home_id, id, ValueGenre::Config, CC_CONFIGURATION, 5, ValueType::Bool),
        "Child Lock",
        ValueData::Bool(false),
    ));
    node.groups.insert(1, Group::new("Lifeline", 1).with(CONTROLLER_NODE_ID));
    node
}

/// Builds the nodes of a freshly started virtual controller.
pub fn nodes(home_id: u32) -> Vec<Node> {
    let mut nodes = vec![
        controller(home_id),
        switch(home_id),
        sensor(home_id),
        thermostat(home_id),
    ];

    let listening: Vec<u8> = nodes
        .iter()
        .filter(|n| n.info.listening)
        .map(|n| n.node_id)
        .collect();
    for node in nodes.iter_mut() {
        if node.info.listening {
            for &other in listening.iter().filter(|&&o| o != node.node_id) {
                node.neighbors.insert(other as usize);
            }
        } else {
            node.neighbors.insert(CONTROLLER_NODE_ID as usize);
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_has_one_controller_and_three_devices() {
        let nodes = nodes(0x0100_0001);
        let ids: Vec<u8> = nodes.iter().map(|n| n.node_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(nodes[0].info.basic, 0x02);
    }

    #[test]
    fn test_value_ids_carry_home_and_node() {
        for node in nodes(0xabcd_0001) {
            for value in node.values.values() {
                assert_eq!(value.id.home_id(), 0xabcd_0001);
                assert_eq!(value.id.node_id(), node.node_id);
                assert_eq!(value.id.value_type(), Some(value.data.value_type()));
            }
        }
    }

    #[test]
    fn test_sleeping_sensor_only_neighbors_controller() {
        let nodes = nodes(1);
        assert_eq!(nodes[2].neighbor_ids(), vec![CONTROLLER_NODE_ID]);
        assert_eq!(nodes[1].neighbor_ids(), vec![1, 4]);
    }
}
