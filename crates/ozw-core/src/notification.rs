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

//! Notifications emitted by the native library.
//!
//! A [`Notification`] is owned by the native library and lives only for the
//! duration of a watcher callback. Watchers must copy whatever they need out
//! of it before returning.

use crate::value_id::ValueId;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::ffi::c_void;
use std::fmt::Display;

/// Kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum NotificationType {
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

impl NotificationType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueAdded => "ValueAdded",
            Self::ValueRemoved => "ValueRemoved",
            Self::ValueChanged => "ValueChanged",
            Self::ValueRefreshed => "ValueRefreshed",
            Self::Group => "Group",
            Self::NodeNew => "NodeNew",
            Self::NodeAdded => "NodeAdded",
            Self::NodeRemoved => "NodeRemoved",
            Self::NodeProtocolInfo => "NodeProtocolInfo",
            Self::NodeNaming => "NodeNaming",
            Self::NodeEvent => "NodeEvent",
            Self::PollingDisabled => "PollingDisabled",
            Self::PollingEnabled => "PollingEnabled",
            Self::SceneEvent => "SceneEvent",
            Self::CreateButton => "CreateButton",
            Self::DeleteButton => "DeleteButton",
            Self::ButtonOn => "ButtonOn",
            Self::ButtonOff => "ButtonOff",
            Self::DriverReady => "DriverReady",
            Self::DriverFailed => "DriverFailed",
            Self::DriverReset => "DriverReset",
            Self::EssentialNodeQueriesComplete => "EssentialNodeQueriesComplete",
            Self::NodeQueriesComplete => "NodeQueriesComplete",
            Self::AwakeNodesQueried => "AwakeNodesQueried",
            Self::AllNodesQueriedSomeDead => "AllNodesQueriedSomeDead",
            Self::AllNodesQueried => "AllNodesQueried",
            Self::Notification => "Notification",
            Self::DriverRemoved => "DriverRemoved",
            Self::ControllerCommand => "ControllerCommand",
            Self::NodeReset => "NodeReset",
        }
    }

    #[inline]
    fn is_button(&self) -> bool {
        matches!(
            self,
            Self::CreateButton | Self::DeleteButton | Self::ButtonOn | Self::ButtonOff
        )
    }
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Code carried by [`NotificationType::Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum NotificationCode {
    MsgComplete = 0,
    Timeout = 1,
    NoOperation = 2,
    Awake = 3,
    Sleep = 4,
    Dead = 5,
    Alive = 6,
}

impl NotificationCode {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MsgComplete => "MsgComplete",
            Self::Timeout => "Timeout",
            Self::NoOperation => "NoOperation",
            Self::Awake => "Awake",
            Self::Sleep => "Sleep",
            Self::Dead => "Dead",
            Self::Alive => "Alive",
        }
    }
}

/// Controller commands that run asynchronously and report progress through
/// [`NotificationType::ControllerCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ControllerCommand {
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

/// Progress of a controller command, carried in the event slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ControllerState {
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

impl ControllerState {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Starting => "Starting",
            Self::Cancel => "Cancel",
            Self::Error => "Error",
            Self::Waiting => "Waiting",
            Self::Sleeping => "Sleeping",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::NodeOk => "NodeOK",
            Self::NodeFailed => "NodeFailed",
        }
    }
}

/// Failure reason of a controller command, carried in the code slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ControllerError {
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

/// Alerts the library raises for the application's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UserAlert {
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

/// A single event emitted by the native library.
///
/// The `byte` slot is shared: it holds the group index, button id, scene id
/// or notification code depending on [`Notification::kind`]. Use the typed
/// accessors rather than reading it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    kind: NotificationType,
    value_id: ValueId,
    byte: u8,
    event: u8,
    command: u8,
    user_alert: UserAlert,
    com_port: String,
}

impl Notification {
    pub fn new(kind: NotificationType, value_id: ValueId) -> Self {
        Self {
            kind,
            value_id,
            byte: 0,
            event: 0,
            command: 0,
            user_alert: UserAlert::None,
            com_port: String::new(),
        }
    }

    pub fn with_byte(mut self, byte: u8) -> Self {
        self.byte = byte;
        self
    }

    pub fn with_event(mut self, event: u8) -> Self {
        self.event = event;
        self
    }

    pub fn with_command(mut self, command: ControllerCommand) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_user_alert(mut self, alert: UserAlert) -> Self {
        self.user_alert = alert;
        self
    }

    pub fn with_com_port(mut self, port: impl Into<String>) -> Self {
        self.com_port = port.into();
        self
    }

    #[inline]
    pub fn kind(&self) -> NotificationType {
        self.kind
    }

    #[inline]
    pub fn home_id(&self) -> u32 {
        self.value_id.home_id()
    }

    #[inline]
    pub fn node_id(&self) -> u8 {
        self.value_id.node_id()
    }

    #[inline]
    pub fn value_id(&self) -> &ValueId {
        &self.value_id
    }

    /// The shared byte slot, whatever the kind.
    #[inline]
    pub fn byte(&self) -> u8 {
        self.byte
    }

    pub fn group_idx(&self) -> Option<u8> {
        (self.kind == NotificationType::Group).then_some(self.byte)
    }

    pub fn button_id(&self) -> Option<u8> {
        self.kind.is_button().then_some(self.byte)
    }

    pub fn scene_id(&self) -> Option<u8> {
        (self.kind == NotificationType::SceneEvent).then_some(self.byte)
    }

    /// The notification code for `Notification`, or the controller error for
    /// `ControllerCommand`.
    pub fn notification(&self) -> Option<u8> {
        matches!(
            self.kind,
            NotificationType::Notification | NotificationType::ControllerCommand
        )
        .then_some(self.byte)
    }

    /// The node event for `NodeEvent`, or the controller state for
    /// `ControllerCommand`.
    pub fn event(&self) -> Option<u8> {
        matches!(
            self.kind,
            NotificationType::NodeEvent | NotificationType::ControllerCommand
        )
        .then_some(self.event)
    }

    pub fn command(&self) -> Option<u8> {
        (self.kind == NotificationType::ControllerCommand).then_some(self.command)
    }

    #[inline]
    pub fn user_alert(&self) -> UserAlert {
        self.user_alert
    }

    /// Serial port name, set for driver lifecycle notifications.
    #[inline]
    pub fn com_port(&self) -> &str {
        &self.com_port
    }

    /// Human readable rendering.
    pub fn as_string(&self) -> String {
        match self.kind {
            NotificationType::Notification => {
                match NotificationCode::try_from(self.byte) {
                    Ok(code) => format!("Notification - {}", code.as_str()),
                    Err(_) => format!("Notification - Unknown({})", self.byte),
                }
            }
            NotificationType::ControllerCommand => {
                match ControllerState::try_from(self.event) {
                    Ok(state) => format!("ControllerCommand - {}", state.as_str()),
                    Err(_) => format!("ControllerCommand - Unknown({})", self.event),
                }
            }
            NotificationType::NodeEvent => format!("NodeEvent - {}", self.event),
            NotificationType::Group => format!("Group - {}", self.byte),
            NotificationType::SceneEvent => format!("SceneEvent - {}", self.byte),
            NotificationType::DriverFailed | NotificationType::DriverRemoved
                if !self.com_port.is_empty() =>
            {
                format!("{} - {}", self.kind.as_str(), self.com_port)
            }
            kind => kind.as_str().to_string(),
        }
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Callback invoked by the native library for every notification.
///
/// The context pointer is passed back unchanged. A watcher is identified by
/// the pair of function pointer and context.
pub type WatcherFn = fn(notification: &Notification, context: *mut c_void);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_id::{ValueGenre, ValueType};

    fn vid() -> ValueId {
        ValueId::new(0x0c0f_fee0, 3, ValueGenre::User, 0x25, 1, 0, ValueType::Bool)
    }

    #[test]
    fn test_home_and_node_come_from_value_id() {
        let n = Notification::new(NotificationType::ValueChanged, vid());
        assert_eq!(n.home_id(), 0x0c0f_fee0);
        assert_eq!(n.node_id(), 3);
    }

    #[test]
    fn test_byte_accessors_follow_kind() {
        let group = Notification::new(NotificationType::Group, vid()).with_byte(2);
        assert_eq!(group.group_idx(), Some(2));
        assert_eq!(group.button_id(), None);
        assert_eq!(group.scene_id(), None);

        let button = Notification::new(NotificationType::ButtonOn, vid()).with_byte(9);
        assert_eq!(button.button_id(), Some(9));
        assert_eq!(button.group_idx(), None);

        let scene = Notification::new(NotificationType::SceneEvent, vid()).with_byte(4);
        assert_eq!(scene.scene_id(), Some(4));

        let code = Notification::new(NotificationType::Notification, vid())
            .with_byte(NotificationCode::Dead.into());
        assert_eq!(code.notification(), Some(5));
        assert_eq!(code.event(), None);
    }

    #[test]
    fn test_controller_command_carries_event_code_and_command() {
        let n = Notification::new(NotificationType::ControllerCommand, vid())
            .with_event(ControllerState::Waiting.into())
            .with_byte(ControllerError::None.into())
            .with_command(ControllerCommand::AddDevice);
        assert_eq!(n.event(), Some(4));
        assert_eq!(n.notification(), Some(0));
        assert_eq!(n.command(), Some(1));
        assert_eq!(n.as_string(), "ControllerCommand - Waiting");
    }

    #[test]
    fn test_as_string_renders_notification_codes() {
        let n = Notification::new(NotificationType::Notification, vid())
            .with_byte(NotificationCode::Timeout.into());
        assert_eq!(n.as_string(), "Notification - Timeout");
        assert_eq!(
            Notification::new(NotificationType::AllNodesQueried, vid()).to_string(),
            "AllNodesQueried"
        );
    }

    #[test]
    fn test_driver_failed_renders_port() {
        let n = Notification::new(NotificationType::DriverFailed, ValueId::from_parts(0, 0, 0))
            .with_com_port("/dev/ttyACM0");
        assert_eq!(n.com_port(), "/dev/ttyACM0");
        assert_eq!(n.as_string(), "DriverFailed - /dev/ttyACM0");
    }
}
