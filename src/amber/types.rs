use crate::amber::time::parse_nem_time;
use crate::error::{AmberError, Result};
use crate::logging::get_logger;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Tariff direction a price group belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Energy bought from the grid
    #[serde(rename = "general")]
    General,
    /// Energy exported to the grid
    #[serde(rename = "feedin", alias = "feed_in", alias = "feed-in")]
    FeedIn,
}

impl Direction {
    pub const ALL: [Self; 2] = [Self::General, Self::FeedIn];

    /// Stable key used in identifiers and URLs
    pub const fn key(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::FeedIn => "feedin",
        }
    }

    /// Human-readable name used in sensor names
    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General Usage",
            Self::FeedIn => "Feed-In",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Direction {
    type Err = AmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "feedin" | "feed_in" | "feed-in" => Ok(Self::FeedIn),
            other => Err(AmberError::validation(
                "direction",
                format!("unknown direction '{other}'"),
            )),
        }
    }
}

/// Price band label attached to an interval.
///
/// Unknown labels are carried through verbatim so a new band on the API side
/// still shows up instead of failing the whole interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
    ExtremelyLow,
    VeryLow,
    Low,
    Neutral,
    High,
    Spike,
    Other(String),
}

impl Descriptor {
    pub fn from_label(s: &str) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "extremelylow" => Self::ExtremelyLow,
            "verylow" => Self::VeryLow,
            "low" => Self::Low,
            "neutral" => Self::Neutral,
            "high" => Self::High,
            "spike" => Self::Spike,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ExtremelyLow => "extremelyLow",
            Self::VeryLow => "veryLow",
            Self::Low => "low",
            Self::Neutral => "neutral",
            Self::High => "high",
            Self::Spike => "spike",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// One pricing interval as published by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Interval start, NEM time unless an offset is present
    #[serde(rename = "nemTime")]
    pub nem_time: String,
    /// Price in cents per kWh
    #[serde(rename = "perKwh")]
    pub per_kwh: f64,
    /// Renewable share of generation in percent
    pub renewables: f64,
    pub descriptor: Descriptor,
}

impl Interval {
    pub fn new(nem_time: &str, per_kwh: f64, renewables: f64, descriptor: Descriptor) -> Self {
        Self {
            nem_time: nem_time.to_string(),
            per_kwh,
            renewables,
            descriptor,
        }
    }

    /// Decode a single interval record; extra fields are ignored
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AmberError::parse(format!("invalid interval record: {e}")))
    }

    /// Absolute start instant of this interval
    pub fn starts_at(&self, source_tz: Tz) -> Result<DateTime<Utc>> {
        parse_nem_time(&self.nem_time, source_tz)
    }
}

/// The intervals of one direction
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceGroup {
    pub intervals: Vec<Interval>,
}

impl PriceGroup {
    pub const fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Raw response body of the prices endpoint.
///
/// Only a JSON object decodes. Every field stays untyped here: a malformed
/// direction must only cost that direction, not the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct PricesResponse {
    pub postcode: Option<Value>,
    pub price_data: Option<Value>,
    pub feed_in_price_data: Option<Value>,
}

impl From<Map<String, Value>> for PricesResponse {
    fn from(mut body: Map<String, Value>) -> Self {
        Self {
            postcode: body.remove("postcode"),
            price_data: body.remove("priceData"),
            feed_in_price_data: body.remove("feedInPriceData"),
        }
    }
}

/// Most recent successfully fetched pricing data for a location
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Postcode echoed back by the API
    pub postcode: Option<String>,
    /// The body carried a `postcode` key, even a null one
    pub location_known: bool,
    pub general: Option<PriceGroup>,
    pub feed_in: Option<PriceGroup>,
    /// Zone in which naive interval timestamps are expressed
    pub source_tz: Tz,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        postcode: Option<String>,
        general: Option<PriceGroup>,
        feed_in: Option<PriceGroup>,
        source_tz: Tz,
    ) -> Self {
        Self {
            location_known: postcode.is_some(),
            postcode,
            general,
            feed_in,
            source_tz,
            fetched_at: Utc::now(),
        }
    }

    /// Build a snapshot from a decoded response body
    pub fn from_response(response: PricesResponse, source_tz: Tz) -> Self {
        let location_known = response.postcode.is_some();
        let postcode = response.postcode.and_then(|value| match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        Self {
            location_known,
            ..Self::new(
                postcode,
                first_group(response.price_data, Direction::General),
                first_group(response.feed_in_price_data, Direction::FeedIn),
                source_tz,
            )
        }
    }

    /// Decode a snapshot from a raw JSON body
    pub fn from_json(body: &str, source_tz: Tz) -> Result<Self> {
        let response: PricesResponse = serde_json::from_str(body)?;
        Ok(Self::from_response(response, source_tz))
    }

    pub const fn group(&self, direction: Direction) -> Option<&PriceGroup> {
        match direction {
            Direction::General => self.general.as_ref(),
            Direction::FeedIn => self.feed_in.as_ref(),
        }
    }

    /// Whether the API recognised the requested location; only the
    /// presence of the `postcode` key counts, not its value
    pub const fn has_location(&self) -> bool {
        self.location_known
    }

    pub fn interval_count(&self) -> usize {
        Direction::ALL
            .iter()
            .filter_map(|d| self.group(*d))
            .map(|g| g.intervals.len())
            .sum()
    }
}

/// Only the first group of a direction's sequence is used; a missing, empty
/// or malformed sequence makes the direction absent.
fn first_group(raw: Option<Value>, direction: Direction) -> Option<PriceGroup> {
    let logger = get_logger("snapshot");
    let groups = match raw? {
        Value::Array(groups) => groups,
        Value::Null => return None,
        _ => {
            logger.warn(&format!("{direction} price data is not a list; ignoring"));
            return None;
        }
    };
    let Some(Value::Object(mut group)) = groups.into_iter().next() else {
        logger.debug(&format!("{direction} price data has no usable group"));
        return None;
    };
    let Some(Value::Array(items)) = group.remove("intervals") else {
        logger.debug(&format!("{direction} price group has no interval list"));
        return None;
    };

    let intervals = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match Interval::from_value(item) {
            Ok(interval) => Some(interval),
            Err(e) => {
                logger.debug(&format!("Skipping {direction} interval #{index}: {e}"));
                None
            }
        })
        .collect();
    Some(PriceGroup::new(intervals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amber::NEM_TIMEZONE;
    use serde_json::json;

    #[test]
    fn test_descriptor_labels() {
        assert_eq!(Descriptor::from_label("extremelyLow"), Descriptor::ExtremelyLow);
        assert_eq!(Descriptor::from_label("VERY_LOW"), Descriptor::VeryLow);
        assert_eq!(Descriptor::from_label("spike"), Descriptor::Spike);
        assert_eq!(
            Descriptor::from_label("negative"),
            Descriptor::Other("negative".to_string())
        );
        assert_eq!(Descriptor::VeryLow.as_str(), "veryLow");
        assert_eq!(Descriptor::Other("odd".to_string()).as_str(), "odd");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("general".parse::<Direction>().unwrap(), Direction::General);
        assert_eq!("FeedIn".parse::<Direction>().unwrap(), Direction::FeedIn);
        assert_eq!("feed-in".parse::<Direction>().unwrap(), Direction::FeedIn);
        assert!("export".parse::<Direction>().is_err());
        assert_eq!(Direction::FeedIn.to_string(), "feedin");
    }

    #[test]
    fn test_interval_decoding_ignores_extra_fields() {
        let interval = Interval::from_value(json!({
            "nemTime": "2021-05-06T12:30:00",
            "perKwh": 23.5,
            "renewables": 41.0,
            "descriptor": "low",
            "spotPerKwh": 7.1
        }))
        .unwrap();
        assert_eq!(interval.per_kwh, 23.5);
        assert_eq!(interval.descriptor, Descriptor::Low);
    }

    #[test]
    fn test_interval_missing_field_is_rejected() {
        let err = Interval::from_value(json!({"nemTime": "2021-05-06T12:30:00", "perKwh": 1.0}))
            .unwrap_err();
        assert!(matches!(err, AmberError::Parse { .. }));
    }

    #[test]
    fn test_snapshot_from_json_lenient_directions() {
        let body = json!({
            "postcode": "3000",
            "priceData": [{"intervals": [
                {"nemTime": "2021-05-06T12:30:00", "perKwh": 10.0, "renewables": 30.0, "descriptor": "neutral"},
                {"nemTime": "2021-05-06T13:00:00", "perKwh": "bad"}
            ]}],
            "feedInPriceData": "nope"
        })
        .to_string();
        let snapshot = Snapshot::from_json(&body, NEM_TIMEZONE).unwrap();
        assert_eq!(snapshot.postcode.as_deref(), Some("3000"));
        assert_eq!(snapshot.group(Direction::General).unwrap().intervals.len(), 1);
        assert!(snapshot.group(Direction::FeedIn).is_none());
        assert_eq!(snapshot.interval_count(), 1);
    }

    #[test]
    fn test_snapshot_empty_and_missing_groups() {
        let body = json!({"postcode": 3000, "priceData": [], "feedInPriceData": [{"other": 1}]})
            .to_string();
        let snapshot = Snapshot::from_json(&body, NEM_TIMEZONE).unwrap();
        assert_eq!(snapshot.postcode.as_deref(), Some("3000"));
        assert!(snapshot.general.is_none());
        assert!(snapshot.feed_in.is_none());
    }

    #[test]
    fn test_snapshot_without_postcode() {
        let snapshot = Snapshot::from_json("{}", NEM_TIMEZONE).unwrap();
        assert!(!snapshot.has_location());

        let nulled = Snapshot::from_json(r#"{"postcode": null, "priceData": null}"#, NEM_TIMEZONE)
            .unwrap();
        assert!(nulled.has_location());
        assert!(nulled.postcode.is_none());
        assert!(nulled.general.is_none());
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        for body in ["[1,2]", "\"prices\"", "42", "null"] {
            let err = Snapshot::from_json(body, NEM_TIMEZONE).unwrap_err();
            assert!(matches!(err, AmberError::Serialization { .. }), "{body}");
        }
    }
}
