//! Sensor read surface
//!
//! Each location exposes eight sensors: current price, next price,
//! renewables and descriptor for both tariff directions. Readings are
//! computed on demand from the latest poll state.

use crate::amber::{Direction, Snapshot};
use crate::poller::PollState;
use crate::selector::{Selected, Selection, select_at};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

pub const PRICE_UNIT: &str = "¢/kWh";
pub const PERCENT_UNIT: &str = "%";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    CurrentPrice,
    NextPrice,
    Renewables,
    Descriptor,
}

impl SensorKind {
    pub const ALL: [Self; 4] = [
        Self::CurrentPrice,
        Self::NextPrice,
        Self::Renewables,
        Self::Descriptor,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::CurrentPrice => "current_price",
            Self::NextPrice => "next_price",
            Self::Renewables => "renewables",
            Self::Descriptor => "descriptor",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CurrentPrice => "Current Price",
            Self::NextPrice => "Next Price",
            Self::Renewables => "Renewables",
            Self::Descriptor => "Descriptor",
        }
    }

    pub const fn unit(self) -> Option<&'static str> {
        match self {
            Self::CurrentPrice | Self::NextPrice => Some(PRICE_UNIT),
            Self::Renewables => Some(PERCENT_UNIT),
            Self::Descriptor => None,
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::CurrentPrice => "mdi:currency-usd",
            Self::NextPrice => "mdi:currency-usd-clock",
            Self::Renewables => "mdi:leaf",
            Self::Descriptor => "mdi:information",
        }
    }

    pub const fn device_class(self) -> Option<&'static str> {
        match self {
            Self::CurrentPrice | Self::NextPrice => Some("monetary"),
            Self::Renewables | Self::Descriptor => None,
        }
    }

    pub const fn state_class(self) -> Option<&'static str> {
        match self {
            Self::Descriptor => None,
            _ => Some("measurement"),
        }
    }
}

/// Reported sensor state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Number(f64),
    Text(String),
}

impl SensorValue {
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

/// A sensor's state at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub unique_id: String,
    pub name: String,
    pub direction: Direction,
    pub kind: SensorKind,
    pub state: Option<SensorValue>,
    pub available: bool,
    /// Value comes from a snapshot older than the last failed poll
    pub stale: bool,
    pub unit_of_measurement: Option<&'static str>,
    pub icon: &'static str,
    pub device_class: Option<&'static str>,
    pub state_class: Option<&'static str>,
    /// Start of the interval the value was taken from
    pub timestamp: Option<DateTime<Utc>>,
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    entry_id: Uuid,
    postcode: String,
    direction: Direction,
    kind: SensorKind,
}

impl Sensor {
    pub fn new(entry_id: Uuid, postcode: &str, direction: Direction, kind: SensorKind) -> Self {
        Self {
            entry_id,
            postcode: postcode.trim().to_string(),
            direction,
            kind,
        }
    }

    /// The full sensor set of one location, general direction first
    pub fn all(entry_id: Uuid, postcode: &str) -> Vec<Self> {
        Direction::ALL
            .iter()
            .flat_map(|direction| Self::for_direction(entry_id, postcode, *direction))
            .collect()
    }

    pub fn for_direction(entry_id: Uuid, postcode: &str, direction: Direction) -> Vec<Self> {
        SensorKind::ALL
            .iter()
            .map(|kind| Self::new(entry_id, postcode, direction, *kind))
            .collect()
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    pub const fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn unique_id(&self) -> String {
        format!("{}_{}_{}", self.entry_id, self.direction.key(), self.kind.key())
    }

    pub fn name(&self) -> String {
        format!("Amber {} {}", self.direction.label(), self.kind.label())
    }

    /// Read this sensor from a poll state as of `now`
    pub fn read(&self, state: &PollState, now: DateTime<Utc>) -> SensorReading {
        let selection = selection_for(state.snapshot.as_deref(), self.direction, now);
        self.read_selection(&selection, state.is_stale())
    }

    /// Read this sensor from an already computed selection
    pub fn read_selection(&self, selection: &Selection<'_>, stale: bool) -> SensorReading {
        let picked = match self.kind {
            SensorKind::NextPrice => selection.next,
            _ => selection.current,
        };

        let (state, attributes) = picked.map_or_else(
            || (None, BTreeMap::new()),
            |interval| (Some(self.value_of(&interval)), self.attributes_of(&interval)),
        );

        SensorReading {
            unique_id: self.unique_id(),
            name: self.name(),
            direction: self.direction,
            kind: self.kind,
            state,
            available: !selection.is_unavailable(),
            stale,
            unit_of_measurement: self.kind.unit(),
            icon: self.kind.icon(),
            device_class: self.kind.device_class(),
            state_class: self.kind.state_class(),
            timestamp: picked.map(|interval| interval.starts_at),
            attributes,
        }
    }

    fn value_of(&self, interval: &Selected<'_>) -> SensorValue {
        match self.kind {
            SensorKind::CurrentPrice | SensorKind::NextPrice => {
                SensorValue::Number(round_2dp(interval.per_kwh))
            }
            SensorKind::Renewables => SensorValue::Number(round_2dp(interval.renewables)),
            SensorKind::Descriptor => SensorValue::Text(interval.descriptor.as_str().to_string()),
        }
    }

    fn attributes_of(&self, interval: &Selected<'_>) -> BTreeMap<String, Value> {
        let mut attributes = BTreeMap::new();
        attributes.insert("nem_time".to_string(), json!(interval.nem_time));
        match self.kind {
            SensorKind::CurrentPrice | SensorKind::NextPrice => {
                attributes.insert("descriptor".to_string(), json!(interval.descriptor.as_str()));
                attributes.insert("renewables".to_string(), json!(interval.renewables));
            }
            SensorKind::Renewables => {}
            SensorKind::Descriptor => {
                attributes.insert("price_per_kwh".to_string(), json!(interval.per_kwh));
            }
        }
        attributes.insert("postcode".to_string(), json!(self.postcode));
        attributes
    }
}

fn selection_for(
    snapshot: Option<&Snapshot>,
    direction: Direction,
    now: DateTime<Utc>,
) -> Selection<'_> {
    snapshot.map_or_else(Selection::default, |s| select_at(s, direction, now))
}

/// Read every sensor, selecting each direction only once
pub fn read_all(sensors: &[Sensor], state: &PollState, now: DateTime<Utc>) -> Vec<SensorReading> {
    let snapshot = state.snapshot.as_deref();
    let general = selection_for(snapshot, Direction::General, now);
    let feed_in = selection_for(snapshot, Direction::FeedIn, now);
    let stale = state.is_stale();
    sensors
        .iter()
        .map(|sensor| {
            let selection = match sensor.direction {
                Direction::General => &general,
                Direction::FeedIn => &feed_in,
            };
            sensor.read_selection(selection, stale)
        })
        .collect()
}

/// Round half away from zero to two decimals.
///
/// Rounds the shortest decimal form of the float rather than its binary
/// value, so 12.345 becomes 12.35.
pub fn round_2dp(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_string().parse::<f64>().ok())
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}
