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

//! A virtual controller and the network behind it.

use crate::inventory::{self, CONTROLLER_NODE_ID};
use crate::node::Node;
use crate::value::ValueRecord;
use ozw_core::exception::{NativeResult, OzwException};
use ozw_core::manager::{ControllerInterface, DriverStatistics};
use ozw_core::notification::ControllerCommand;
use ozw_core::value_id::ValueId;
use rustc_hash::FxHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Derives the home id a controller at `path` reports.
///
/// Never zero; a zero home id means "no network".
pub fn home_id_for_path(path: &str) -> u32 {
    let mut hasher = FxHasher::default();
    path.hash(&mut hasher);
    let h = hasher.finish();
    let id = (h as u32) ^ ((h >> 32) as u32);
    if id == 0 {
        1
    } else {
        id
    }
}

#[derive(Debug)]
pub struct Driver {
    pub controller_path: String,
    pub home_id: u32,
    pub interface: ControllerInterface,
    pub controller_node_id: u8,
    pub suc_node_id: u8,
    pub primary: bool,
    pub nodes: BTreeMap<u8, Node>,
    pub statistics: DriverStatistics,
    pub pending_command: ControllerCommand,
}

impl Driver {
    pub fn new(controller_path: &str, home_id: u32, interface: ControllerInterface) -> Self {
        let nodes = inventory::nodes(home_id)
            .into_iter()
            .map(|n| (n.node_id, n))
            .collect();
        Self {
            controller_path: controller_path.to_string(),
            home_id,
            interface,
            controller_node_id: CONTROLLER_NODE_ID,
            suc_node_id: CONTROLLER_NODE_ID,
            primary: true,
            nodes,
            statistics: DriverStatistics::default(),
            pending_command: ControllerCommand::None,
        }
    }

    pub fn node(&self, node_id: u8) -> NativeResult<&Node> {
        self.nodes.get(&node_id).ok_or_else(|| {
            OzwException::invalid_node_id(format!("Invalid Node ID {} passed to GetNode", node_id))
        })
    }

    pub fn node_mut(&mut self, node_id: u8) -> NativeResult<&mut Node> {
        self.nodes.get_mut(&node_id).ok_or_else(|| {
            OzwException::invalid_node_id(format!("Invalid Node ID {} passed to GetNode", node_id))
        })
    }

    pub fn value(&self, id: &ValueId) -> NativeResult<&ValueRecord> {
        self.nodes
            .get(&id.node_id())
            .and_then(|n| n.value(id))
            .ok_or_else(|| OzwException::invalid_value_id(format!("Invalid ValueID passed: {}", id)))
    }

    pub fn value_mut(&mut self, id: &ValueId) -> NativeResult<&mut ValueRecord> {
        self.nodes
            .get_mut(&id.node_id())
            .and_then(|n| n.value_mut(id))
            .ok_or_else(|| OzwException::invalid_value_id(format!("Invalid ValueID passed: {}", id)))
    }

    /// Rebuilds the node's neighbors from the nodes currently on the network.
    ///
    /// A listening node hears every other listening node that has not
    /// failed. A sleeping node only hears the controller.
    pub fn synchronize_neighbors(&mut self, node_id: u8) -> NativeResult<()> {
        let listening: Vec<u8> = self
            .nodes
            .values()
            .filter(|n| n.info.listening && !n.failed && n.node_id != node_id)
            .map(|n| n.node_id)
            .collect();
        let controller = self.controller_node_id;
        let node = self.node_mut(node_id)?;
        node.neighbors.clear();
        if node.info.listening {
            for other in listening {
                node.neighbors.insert(other as usize);
            }
        } else {
            node.neighbors.insert(controller as usize);
        }
        Ok(())
    }

    /// Accounts for one frame sent to the network and its acknowledgement.
    pub fn record_send(&mut self) {
        let s = &mut self.statistics;
        s.sof_count += 1;
        s.write_count += 1;
        s.ack_count += 1;
        s.callbacks += 1;
    }

    /// Accounts for one frame received from the network.
    pub fn record_receive(&mut self) {
        let s = &mut self.statistics;
        s.sof_count += 1;
        s.read_count += 1;
    }

    /// Removes every node except the controller.
    pub fn reset(&mut self) {
        let controller = self.controller_node_id;
        self.nodes.retain(|&id, _| id == controller);
        if let Some(node) = self.nodes.get_mut(&controller) {
            node.neighbors.clear();
        }
        self.pending_command = ControllerCommand::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ozw_core::exception::ExceptionKind;
    use ozw_core::value_id::{ValueGenre, ValueType};

    #[test]
    fn test_home_id_is_stable_and_nonzero() {
        assert_eq!(home_id_for_path("usb"), home_id_for_path("usb"));
        assert_ne!(home_id_for_path("usb"), 0);
        assert_ne!(home_id_for_path("/dev/ttyACM0"), home_id_for_path("/dev/ttyACM1"));
    }

    #[test]
    fn test_missing_node_and_value_map_to_native_errors() {
        let driver = Driver::new("usb", 7, ControllerInterface::Serial);
        assert_eq!(driver.node(99).unwrap_err().kind(), ExceptionKind::InvalidNodeId);
        let missing = ValueId::new(7, 2, ValueGenre::User, 0x99, 1, 0, ValueType::Bool);
        assert_eq!(driver.value(&missing).unwrap_err().kind(), ExceptionKind::InvalidValueId);
    }

    #[test]
    fn test_synchronize_drops_failed_and_departed_neighbors() {
        let mut driver = Driver::new("usb", 7, ControllerInterface::Serial);
        let switch = crate::inventory::SWITCH_NODE_ID;
        let before = driver.node(switch).unwrap().neighbor_ids();
        assert!(before.len() > 1);

        let departed = before.iter().copied().find(|&id| id != CONTROLLER_NODE_ID).unwrap();
        driver.nodes.remove(&departed);
        driver.node_mut(CONTROLLER_NODE_ID).unwrap().failed = true;
        driver.synchronize_neighbors(switch).unwrap();
        assert!(driver.node(switch).unwrap().neighbor_ids().is_empty());

        driver.node_mut(CONTROLLER_NODE_ID).unwrap().failed = false;
        driver.synchronize_neighbors(switch).unwrap();
        assert_eq!(driver.node(switch).unwrap().neighbor_ids(), vec![CONTROLLER_NODE_ID]);
        assert_eq!(driver.synchronize_neighbors(99).unwrap_err().kind(), ExceptionKind::InvalidNodeId);
    }

    #[test]
    fn test_reset_keeps_only_controller() {
        let mut driver = Driver::new("usb", 7, ControllerInterface::Serial);
        driver.reset();
        assert_eq!(driver.nodes.keys().copied().collect::<Vec<_>>(), vec![CONTROLLER_NODE_ID]);
    }
}
