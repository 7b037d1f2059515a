//! Subscription record as stored in the subscriptions blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SubsTrackError};
use crate::time::parse_instant;

/// Calendar unit of a renewal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Day,
    Month,
    Year,
}

impl std::fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodUnit::Day => write!(f, "day"),
            PeriodUnit::Month => write!(f, "month"),
            PeriodUnit::Year => write!(f, "year"),
        }
    }
}

impl std::str::FromStr for PeriodUnit {
    type Err = SubsTrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(PeriodUnit::Day),
            "month" => Ok(PeriodUnit::Month),
            "year" => Ok(PeriodUnit::Year),
            other => Err(SubsTrackError::Other(format!("Unknown period unit: {other}"))),
        }
    }
}

/// A tracked subscription.
///
/// Only the lifecycle fields are typed. Everything else the CRUD layer keeps on
/// the record (price, category, notes, ...) rides along in `extra` so a
/// read-modify-write cycle never drops it.
///
/// Reading is lenient per field. A lifecycle field whose stored value has the
/// wrong shape (`"reminderMe": 1.5`, `"isActive": "yes"`) reads as unset and
/// its raw value stays in `extra`, so the record is still evaluated and is
/// written back exactly as found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub expiry_date: Option<String>,
    pub is_active: bool,
    pub auto_renew: bool,
    pub period_value: Option<u32>,
    /// Kept as text: an unrecognised unit must survive a write-back untouched.
    pub period_unit: Option<String>,
    pub is_reminder_set: bool,
    /// Lookahead window in days.
    pub reminder_me: Option<u32>,
    pub last_reminder_sent_at: Option<String>,
    pub last_checked_expiry_date: Option<String>,
    pub updated_at: Option<String>,
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for Subscription {
    fn from(mut raw: Map<String, Value>) -> Self {
        Self {
            id: take(&mut raw, "id", text).unwrap_or_default(),
            name: take(&mut raw, "name", text).unwrap_or_default(),
            expiry_date: take(&mut raw, "expiryDate", text),
            is_active: take(&mut raw, "isActive", Value::as_bool).unwrap_or(false),
            auto_renew: take(&mut raw, "autoRenew", Value::as_bool).unwrap_or(false),
            period_value: take(&mut raw, "periodValue", whole_number),
            period_unit: take(&mut raw, "periodUnit", text),
            is_reminder_set: take(&mut raw, "isReminderSet", Value::as_bool).unwrap_or(false),
            reminder_me: take(&mut raw, "reminderMe", whole_number),
            last_reminder_sent_at: take(&mut raw, "lastReminderSentAt", text),
            last_checked_expiry_date: take(&mut raw, "lastCheckedExpiryDate", text),
            updated_at: take(&mut raw, "updatedAt", text),
            extra: raw,
        }
    }
}

impl From<Subscription> for Map<String, Value> {
    fn from(sub: Subscription) -> Self {
        let mut out = sub.extra;
        // Plain fields yield to a raw value left behind on read.
        let mut plain = |key: &str, value: Value| {
            out.entry(key.to_string()).or_insert(value);
        };
        plain("id", sub.id.into());
        plain("name", sub.name.into());
        plain("isActive", sub.is_active.into());
        plain("autoRenew", sub.auto_renew.into());
        plain("isReminderSet", sub.is_reminder_set.into());

        let optional = [
            ("expiryDate", sub.expiry_date.map(Value::from)),
            ("periodValue", sub.period_value.map(Value::from)),
            ("periodUnit", sub.period_unit.map(Value::from)),
            ("reminderMe", sub.reminder_me.map(Value::from)),
            ("lastReminderSentAt", sub.last_reminder_sent_at.map(Value::from)),
            ("lastCheckedExpiryDate", sub.last_checked_expiry_date.map(Value::from)),
            ("updatedAt", sub.updated_at.map(Value::from)),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                out.insert(key.to_string(), value);
            }
        }
        out
    }
}

/// Remove `key` from `raw` if `read` accepts its value; otherwise leave it.
fn take<T>(raw: &mut Map<String, Value>, key: &str, read: fn(&Value) -> Option<T>) -> Option<T> {
    let value = read(raw.get(key)?)?;
    raw.remove(key);
    Some(value)
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// A non-negative whole number that fits in `u32`. `7.0` counts, `1.5` and
/// `-1` do not.
fn whole_number(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f) {
        Some(f as u32)
    } else {
        None
    }
}

impl Subscription {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            expiry_date: None,
            is_active: true,
            auto_renew: false,
            period_value: None,
            period_unit: None,
            is_reminder_set: true,
            reminder_me: None,
            last_reminder_sent_at: None,
            last_checked_expiry_date: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Parsed `expiry_date`, `None` when unset.
    pub fn expiry(&self) -> Result<Option<DateTime<Utc>>> {
        self.expiry_date.as_deref().map(parse_instant).transpose()
    }

    /// Parsed `last_reminder_sent_at`, `None` when unset.
    pub fn last_reminder_sent(&self) -> Result<Option<DateTime<Utc>>> {
        self.last_reminder_sent_at.as_deref().map(parse_instant).transpose()
    }

    /// Parsed period unit. `None` when unset, `Err` when unrecognised.
    pub fn period_unit(&self) -> Option<Result<PeriodUnit>> {
        self.period_unit.as_deref().map(str::parse)
    }

    /// Whether the expiry changed since the last evaluation that recorded it.
    ///
    /// Both sides are compared as instants when they parse, so a re-formatted
    /// but identical timestamp does not count as a change.
    pub fn expiry_changed_since_check(&self) -> bool {
        let (Some(checked), Some(current)) = (&self.last_checked_expiry_date, &self.expiry_date)
        else {
            return false;
        };
        match (parse_instant(checked), parse_instant(current)) {
            (Ok(a), Ok(b)) => a != b,
            _ => checked != current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case_and_keep_extra_fields() {
        let json = r#"{
            "id": "1718000000000",
            "name": "Netflix",
            "expiryDate": "2024-07-01T00:00:00.000Z",
            "isActive": true,
            "autoRenew": true,
            "periodValue": 1,
            "periodUnit": "month",
            "isReminderSet": true,
            "reminderMe": 7,
            "price": "15.99",
            "category": "video",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z"
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.name, "Netflix");
        assert_eq!(sub.reminder_me, Some(7));
        assert!(matches!(sub.period_unit(), Some(Ok(PeriodUnit::Month))));
        assert_eq!(sub.extra["price"], "15.99");

        let back = serde_json::to_value(&sub).unwrap();
        assert_eq!(back["category"], "video");
        assert_eq!(back["createdAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(back["expiryDate"], "2024-07-01T00:00:00.000Z");
        assert!(back.get("lastReminderSentAt").is_none());
    }

    #[test]
    fn test_unknown_period_unit_survives() {
        let json = r#"{"id":"a","periodUnit":"fortnight"}"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert!(matches!(sub.period_unit(), Some(Err(_))));
        let back = serde_json::to_value(&sub).unwrap();
        assert_eq!(back["periodUnit"], "fortnight");
    }

    #[test]
    fn test_expiry_changed_since_check() {
        let mut sub = Subscription::new("a", "A");
        assert!(!sub.expiry_changed_since_check());

        sub.expiry_date = Some("2024-07-01T00:00:00.000Z".into());
        sub.last_checked_expiry_date = Some("2024-07-01T00:00:00Z".into());
        assert!(!sub.expiry_changed_since_check());

        sub.last_checked_expiry_date = Some("2024-06-01T00:00:00.000Z".into());
        assert!(sub.expiry_changed_since_check());

        sub.last_checked_expiry_date = Some("garbage".into());
        assert!(sub.expiry_changed_since_check());
    }

    #[test]
    fn test_malformed_lifecycle_fields_read_as_unset_and_survive() {
        let json = r#"{
            "id": "odd",
            "name": "Gym",
            "isActive": "yes",
            "autoRenew": false,
            "isReminderSet": true,
            "reminderMe": 1.5,
            "periodValue": -1,
            "periodUnit": "month",
            "expiryDate": 1718000000000,
            "price": 30
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert!(!sub.is_active);
        assert!(sub.is_reminder_set);
        assert_eq!(sub.reminder_me, None);
        assert_eq!(sub.period_value, None);
        assert_eq!(sub.expiry_date, None);
        assert!(matches!(sub.period_unit(), Some(Ok(PeriodUnit::Month))));

        let original: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_value(&sub).unwrap(), original);
    }

    #[test]
    fn test_whole_number_reads() {
        let read = |raw: &str| whole_number(&serde_json::from_str(raw).unwrap());
        assert_eq!(read("7"), Some(7));
        assert_eq!(read("7.0"), Some(7));
        assert_eq!(read("0"), Some(0));
        assert_eq!(read("1.5"), None);
        assert_eq!(read("-1"), None);
        assert_eq!(read("4294967296"), None);
        assert_eq!(read("\"7\""), None);
        assert_eq!(read("null"), None);
    }

    #[test]
    fn test_typed_value_replaces_null_on_write() {
        let mut sub: Subscription =
            serde_json::from_str(r#"{"id":"a","lastReminderSentAt":null}"#).unwrap();
        let untouched = serde_json::to_value(&sub).unwrap();
        assert!(untouched["lastReminderSentAt"].is_null());

        sub.last_reminder_sent_at = Some("2024-01-10T08:00:00.000Z".into());
        let back = serde_json::to_value(&sub).unwrap();
        assert_eq!(back["lastReminderSentAt"], "2024-01-10T08:00:00.000Z");
    }

    #[test]
    fn test_period_unit_display_roundtrip() {
        for unit in [PeriodUnit::Day, PeriodUnit::Month, PeriodUnit::Year] {
            assert_eq!(unit.to_string().parse::<PeriodUnit>().unwrap(), unit);
        }
        assert_eq!("MONTH".parse::<PeriodUnit>().unwrap(), PeriodUnit::Month);
    }
}
