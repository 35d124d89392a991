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

//! Value storage of a virtual node.

use ozw_core::exception::{NativeResult, OzwException};
use ozw_core::manager::{SwitchPoint, Value, ValueKind};
use ozw_core::value_id::{ValueId, ValueType};

/// Maximum number of switch points a schedule holds.
pub const MAX_SWITCH_POINTS: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub label: String,
    pub value: i32,
}

impl ListItem {
    pub fn new(label: &str, value: i32) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// The stored payload of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    Bool(bool),
    Byte(u8),
    Decimal { value: f32, precision: u8 },
    Int(i32),
    Short(i16),
    String(String),
    Raw(Vec<u8>),
    List { items: Vec<ListItem>, selected: Option<usize> },
    Schedule(Vec<SwitchPoint>),
    Button { pressed: bool },
}

impl ValueData {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Byte(_) => ValueType::Byte,
            Self::Decimal { .. } => ValueType::Decimal,
            Self::Int(_) => ValueType::Int,
            Self::Short(_) => ValueType::Short,
            Self::String(_) => ValueType::String,
            Self::Raw(_) => ValueType::Raw,
            Self::List { .. } => ValueType::List,
            Self::Schedule(_) => ValueType::Schedule,
            Self::Button { .. } => ValueType::Button,
        }
    }

    /// Renders the payload the way the native library's string getter does.
    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) | Self::Button { pressed: b } => {
                if *b { "True".to_string() } else { "False".to_string() }
            }
            Self::Byte(v) => v.to_string(),
            Self::Decimal { value, precision } => format!("{:.*}", *precision as usize, value),
            Self::Int(v) => v.to_string(),
            Self::Short(v) => v.to_string(),
            Self::String(s) => s.clone(),
            Self::Raw(bytes) => bytes
                .iter()
                .map(|b| format!("0x{:02x}", b))
                .collect::<Vec<_>>()
                .join(" "),
            Self::List { items, selected } => selected
                .and_then(|i| items.get(i))
                .map(|item| item.label.clone())
                .unwrap_or_default(),
            Self::Schedule(points) => points
                .iter()
                .map(|p| format!("{:02}:{:02} {}", p.hours, p.minutes, p.setback))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Parses `text` into this payload's type. Returns `false` if it does not parse.
    fn set_from_string(&mut self, text: &str) -> bool {
        let text = text.trim();
        match self {
            Self::Bool(b) => match text.to_ascii_lowercase().as_str() {
                "true" | "1" => *b = true,
                "false" | "0" => *b = false,
                _ => return false,
            },
            Self::Byte(v) => match text.parse() {
                Ok(parsed) => *v = parsed,
                Err(_) => return false,
            },
            Self::Decimal { value, .. } => match text.parse() {
                Ok(parsed) => *value = parsed,
                Err(_) => return false,
            },
            Self::Int(v) => match text.parse() {
                Ok(parsed) => *v = parsed,
                Err(_) => return false,
            },
            Self::Short(v) => match text.parse() {
                Ok(parsed) => *v = parsed,
                Err(_) => return false,
            },
            Self::String(s) => *s = text.to_string(),
            Self::List { items, selected } => match items.iter().position(|i| i.label == text) {
                Some(pos) => *selected = Some(pos),
                None => return false,
            },
            Self::Raw(_) | Self::Schedule(_) | Self::Button { .. } => return false,
        }
        true
    }
}

fn cannot_convert(what: &str, required: ValueType) -> OzwException {
    OzwException::cannot_convert(format!("ValueID passed to {} is not a {} Value", what, required))
}

/// A value together with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRecord {
    pub id: ValueId,
    pub label: String,
    pub units: String,
    pub help: String,
    pub min: i32,
    pub max: i32,
    pub read_only: bool,
    pub write_only: bool,
    pub is_set: bool,
    pub change_verified: bool,
    pub poll_intensity: u8,
    pub data: ValueData,
}

impl ValueRecord {
    pub fn new(id: ValueId, label: &str, data: ValueData) -> Self {
        Self {
            id,
            label: label.to_string(),
            units: String::new(),
            help: String::new(),
            min: 0,
            max: 0,
            read_only: false,
            write_only: false,
            is_set: true,
            change_verified: false,
            poll_intensity: 0,
            data,
        }
    }

    pub fn units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    pub fn range(mut self, min: i32, max: i32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Reads the payload as `kind`.
    pub fn read(&self, kind: ValueKind) -> NativeResult<Option<Value>> {
        if let Some(required) = kind.required_type() {
            if required != self.data.value_type() {
                return Err(cannot_convert(&format!("GetValueAs{:?}", kind), required));
            }
        }

        let value = match (&self.data, kind) {
            (data, ValueKind::String) => Some(Value::String(data.as_string())),
            (ValueData::Bool(b), ValueKind::Bool) => Some(Value::Bool(*b)),
            (ValueData::Byte(v), ValueKind::Byte) => Some(Value::Byte(*v)),
            (ValueData::Decimal { value, .. }, ValueKind::Float) => Some(Value::Float(*value)),
            (ValueData::Int(v), ValueKind::Int) => Some(Value::Int(*v)),
            (ValueData::Short(v), ValueKind::Short) => Some(Value::Short(*v)),
            (ValueData::Raw(bytes), ValueKind::Raw) => Some(Value::Raw(bytes.clone())),
            (ValueData::List { items, selected }, ValueKind::ListSelection) => selected
                .and_then(|i| items.get(i))
                .map(|item| Value::ListSelection(item.label.clone())),
            (ValueData::List { items, selected }, ValueKind::ListValue) => selected
                .and_then(|i| items.get(i))
                .map(|item| Value::ListValue(item.value)),
            _ => None,
        };
        Ok(value)
    }

    /// Applies `value`. Returns `Ok(false)` when the value is read only or
    /// the new data does not fit.
    pub fn write(&mut self, value: Value) -> NativeResult<bool> {
        if let Some(required) = value.kind().required_type() {
            if required != self.data.value_type() {
                return Err(cannot_convert("SetValue", required));
            }
        }
        if self.read_only {
            return Ok(false);
        }

        let applied = match (&mut self.data, value) {
            (data, Value::String(text)) => data.set_from_string(&text),
            (ValueData::Bool(b), Value::Bool(v)) => {
                *b = v;
                true
            }
            (ValueData::Byte(b), Value::Byte(v)) => {
                *b = v;
                true
            }
            (ValueData::Decimal { value, .. }, Value::Float(v)) => {
                *value = v;
                true
            }
            (ValueData::Int(i), Value::Int(v)) => {
                *i = v;
                true
            }
            (ValueData::Short(s), Value::Short(v)) => {
                *s = v;
                true
            }
            (ValueData::Raw(bytes), Value::Raw(v)) => {
                *bytes = v;
                true
            }
            (ValueData::List { items, selected }, Value::ListSelection(label)) => {
                match items.iter().position(|i| i.label == label) {
                    Some(pos) => {
                        *selected = Some(pos);
                        true
                    }
                    None => false,
                }
            }
            (ValueData::List { items, selected }, Value::ListValue(v)) => {
                match items.iter().position(|i| i.value == v) {
                    Some(pos) => {
                        *selected = Some(pos);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };

        if applied {
            self.is_set = true;
        }
        Ok(applied)
    }

    pub fn list_items(&self) -> NativeResult<Vec<String>> {
        match &self.data {
            ValueData::List { items, .. } => Ok(items.iter().map(|i| i.label.clone()).collect()),
            _ => Err(cannot_convert("GetValueListItems", ValueType::List)),
        }
    }

    pub fn list_values(&self) -> NativeResult<Vec<i32>> {
        match &self.data {
            ValueData::List { items, .. } => Ok(items.iter().map(|i| i.value).collect()),
            _ => Err(cannot_convert("GetValueListValues", ValueType::List)),
        }
    }

    pub fn float_precision(&self) -> NativeResult<u8> {
        match &self.data {
            ValueData::Decimal { precision, .. } => Ok(*precision),
            _ => Err(cannot_convert("GetValueFloatPrecision", ValueType::Decimal)),
        }
    }

    pub fn set_button(&mut self, pressed: bool) -> NativeResult<bool> {
        match &mut self.data {
            ValueData::Button { pressed: p } => {
                *p = pressed;
                Ok(true)
            }
            _ => Err(cannot_convert("PressButton", ValueType::Button)),
        }
    }

    pub fn schedule(&self) -> NativeResult<&Vec<SwitchPoint>> {
        match &self.data {
            ValueData::Schedule(points) => Ok(points),
            _ => Err(cannot_convert("GetSwitchPoint", ValueType::Schedule)),
        }
    }

    pub fn schedule_mut(&mut self) -> NativeResult<&mut Vec<SwitchPoint>> {
        match &mut self.data {
            ValueData::Schedule(points) => Ok(points),
            _ => Err(cannot_convert("SetSwitchPoint", ValueType::Schedule)),
        }
    }
}

/// Inserts or replaces the switch point at the same time of day, keeping
/// the schedule ordered. Returns `false` if the schedule is full.
pub fn insert_switch_point(points: &mut Vec<SwitchPoint>, point: SwitchPoint) -> bool {
    let key = |p: &SwitchPoint| (p.hours, p.minutes);
    match points.binary_search_by_key(&key(&point), key) {
        Ok(pos) => {
            points[pos] = point;
            true
        }
        Err(_) if points.len() >= MAX_SWITCH_POINTS => false,
        Err(pos) => {
            points.insert(pos, point);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ozw_core::exception::ExceptionKind;
    use ozw_core::value_id::ValueGenre;

    fn record(data: ValueData) -> ValueRecord {
        let ty = data.value_type();
        ValueRecord::new(ValueId::new(1, 2, ValueGenre::User, 0x25, 1, 0, ty), "Test", data)
    }

    #[test]
    fn test_read_matching_kind() {
        let r = record(ValueData::Bool(true));
        assert_eq!(r.read(ValueKind::Bool).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn test_read_mismatched_kind_cannot_convert() {
        let r = record(ValueData::Byte(3));
        let err = r.read(ValueKind::Bool).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::CannotConvertValueId);
    }

    #[test]
    fn test_every_value_reads_as_string() {
        let r = record(ValueData::Decimal { value: 21.26, precision: 1 });
        assert_eq!(r.read(ValueKind::String).unwrap(), Some(Value::String("21.3".into())));
        let raw = record(ValueData::Raw(vec![0x01, 0xab]));
        assert_eq!(raw.read(ValueKind::String).unwrap(), Some(Value::String("0x01 0xab".into())));
    }

    #[test]
    fn test_list_without_selection_is_not_applicable() {
        let r = record(ValueData::List {
            items: vec![ListItem::new("Off", 0), ListItem::new("On", 1)],
            selected: None,
        });
        assert_eq!(r.read(ValueKind::ListSelection).unwrap(), None);
        assert_eq!(r.list_items().unwrap(), vec!["Off".to_string(), "On".to_string()]);
        assert_eq!(r.list_values().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_write_read_only_is_rejected() {
        let mut r = record(ValueData::Byte(1)).read_only();
        assert!(!r.write(Value::Byte(2)).unwrap());
        assert_eq!(r.data, ValueData::Byte(1));
    }

    #[test]
    fn test_write_list_by_label_and_value() {
        let mut r = record(ValueData::List {
            items: vec![ListItem::new("Off", 0), ListItem::new("Heat", 1)],
            selected: Some(0),
        });
        assert!(r.write(Value::ListSelection("Heat".into())).unwrap());
        assert_eq!(r.read(ValueKind::ListValue).unwrap(), Some(Value::ListValue(1)));
        assert!(r.write(Value::ListValue(0)).unwrap());
        assert_eq!(r.read(ValueKind::ListSelection).unwrap(), Some(Value::ListSelection("Off".into())));
        assert!(!r.write(Value::ListValue(7)).unwrap());
    }

    #[test]
    fn test_write_string_parses_into_type() {
        let mut r = record(ValueData::Int(0));
        assert!(r.write(Value::String("42".into())).unwrap());
        assert_eq!(r.data, ValueData::Int(42));
        assert!(!r.write(Value::String("forty".into())).unwrap());
    }

    #[test]
    fn test_switch_points_stay_sorted_and_bounded() {
        let mut points = Vec::new();
        assert!(insert_switch_point(&mut points, SwitchPoint { hours: 8, minutes: 0, setback: 1 }));
        assert!(insert_switch_point(&mut points, SwitchPoint { hours: 6, minutes: 30, setback: 2 }));
        assert!(insert_switch_point(&mut points, SwitchPoint { hours: 8, minutes: 0, setback: 3 }));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].hours, 6);
        assert_eq!(points[1].setback, 3);

        for h in 10..17 {
            assert!(insert_switch_point(&mut points, SwitchPoint { hours: h, minutes: 0, setback: 0 }));
        }
        assert_eq!(points.len(), MAX_SWITCH_POINTS);
        assert!(!insert_switch_point(&mut points, SwitchPoint { hours: 23, minutes: 0, setback: 0 }));
    }
}
