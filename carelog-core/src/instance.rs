//! Reminder instances: backend wire records and the normalized view model.

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{InstanceError, InstanceResult};
use crate::status::{DeliveryMethod, InstanceStatus};
use crate::time;

pub const DEFAULT_PLACEHOLDER_NAME: &str = "Medicina";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A reminder instance as the backend returns it, optionally pre-joined
/// with medicine name/dosage and the notification method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInstance {
    pub id: i64,
    pub reminder_id: i64,
    pub scheduled_datetime: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub taken_at: Option<String>,
    #[serde(default)]
    pub retry_count: Option<u32>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_notified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicine_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub tablets_left: Option<i32>,
}

/// One scheduled dose, with display fields guaranteed present.
///
/// Timestamps are on the viewer's wall clock (see [`crate::time`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderInstance {
    pub id: i64,
    pub reminder_id: i64,
    pub scheduled_datetime: NaiveDateTime,
    pub status: InstanceStatus,
    pub taken_at: Option<NaiveDateTime>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub medicine_name: String,
    pub dosage: String,
    pub method: DeliveryMethod,
    pub notes: Option<String>,
}

impl ReminderInstance {
    pub fn new(id: i64, reminder_id: i64, scheduled_datetime: NaiveDateTime) -> Self {
        Self {
            id,
            reminder_id,
            scheduled_datetime,
            status: InstanceStatus::Pending,
            taken_at: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            medicine_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
            dosage: String::new(),
            method: DeliveryMethod::Whatsapp,
            notes: None,
        }
    }

    pub fn with_status(mut self, status: InstanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_medicine(mut self, name: impl Into<String>, dosage: impl Into<String>) -> Self {
        self.medicine_name = name.into();
        self.dosage = dosage.into();
        self
    }

    pub fn with_method(mut self, method: DeliveryMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_taken_at(mut self, taken_at: NaiveDateTime) -> Self {
        self.taken_at = Some(taken_at);
        self
    }

    pub fn is_taken(&self) -> bool {
        self.status.is_success()
    }
}

/// Output of a batch normalization: the usable instances plus the records
/// that had to be skipped.
#[derive(Debug, Default, Clone)]
pub struct Normalized {
    pub instances: Vec<ReminderInstance>,
    pub rejected: Vec<InstanceError>,
}

/// Turns raw backend records into [`ReminderInstance`]s.
///
/// Pure: no I/O, the only context is the viewer timezone and display
/// defaults.
#[derive(Debug, Clone)]
pub struct Normalizer {
    tz: Tz,
    placeholder_name: String,
    default_method: DeliveryMethod,
}

impl Normalizer {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
            default_method: DeliveryMethod::Whatsapp,
        }
    }

    pub fn with_placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder_name = name.into();
        self
    }

    pub fn with_default_method(mut self, method: DeliveryMethod) -> Self {
        self.default_method = method;
        self
    }

    pub fn normalize(
        &self,
        raw: &RawInstance,
        medicine: Option<&Medicine>,
    ) -> InstanceResult<ReminderInstance> {
        let scheduled_datetime = time::parse_timestamp(&raw.scheduled_datetime, self.tz)
            .ok_or_else(|| InstanceError::InvalidTimestamp {
                id: raw.id,
                field: "scheduled_datetime",
                value: raw.scheduled_datetime.clone(),
            })?;

        let status = InstanceStatus::normalize(raw.status.as_deref());
        if let Some(s) = raw.status.as_deref() {
            if s != status.as_str() {
                tracing::debug!(id = raw.id, raw = s, normalized = %status, "normalized status");
            }
        }

        let taken_at = match (&raw.taken_at, status) {
            (Some(t), InstanceStatus::Success) => match time::parse_timestamp(t, self.tz) {
                Some(ts) => Some(ts),
                None => {
                    tracing::warn!(id = raw.id, taken_at = %t, "unparseable taken_at, dropping it");
                    None
                }
            },
            (Some(_), _) => {
                tracing::debug!(
                    id = raw.id,
                    %status,
                    "taken_at on a non-success instance, dropping it"
                );
                None
            }
            (None, InstanceStatus::Success) => {
                tracing::debug!(id = raw.id, "success instance without taken_at");
                None
            }
            (None, _) => None,
        };

        let medicine_name = medicine
            .map(|m| m.name.clone())
            .or_else(|| raw.medicine_name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.placeholder_name.clone());

        let dosage = medicine
            .and_then(|m| m.dosage.clone())
            .or_else(|| raw.dosage.clone())
            .unwrap_or_default();

        let method = raw
            .method
            .as_deref()
            .and_then(DeliveryMethod::parse)
            .unwrap_or(self.default_method);

        Ok(ReminderInstance {
            id: raw.id,
            reminder_id: raw.reminder_id,
            scheduled_datetime,
            status,
            taken_at,
            retry_count: raw.retry_count.unwrap_or(0),
            max_retries: raw.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            medicine_name,
            dosage,
            method,
            notes: raw.notes.clone(),
        })
    }

    /// Normalize a batch using only pre-joined fields.
    pub fn normalize_all(&self, raws: &[RawInstance]) -> Normalized {
        self.normalize_all_with(raws, |_| None)
    }

    /// Normalize a batch, joining each record against a medicine lookup.
    ///
    /// Malformed records are skipped and reported in `rejected`.
    pub fn normalize_all_with<'m, F>(&self, raws: &[RawInstance], medicine_for: F) -> Normalized
    where
        F: Fn(&RawInstance) -> Option<&'m Medicine>,
    {
        let mut out = Normalized::default();
        for raw in raws {
            match self.normalize(raw, medicine_for(raw)) {
                Ok(instance) => out.instances.push(instance),
                Err(err) => {
                    tracing::warn!(%err, "skipping reminder instance");
                    out.rejected.push(err);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(id: i64, at: &str, status: Option<&str>) -> RawInstance {
        RawInstance {
            id,
            reminder_id: 1,
            scheduled_datetime: at.to_string(),
            status: status.map(str::to_string),
            taken_at: None,
            retry_count: None,
            max_retries: None,
            family_notified: None,
            notes: None,
            medicine_name: None,
            dosage: None,
            method: None,
        }
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(chrono_tz::America::Santiago)
    }

    #[test]
    fn fills_display_defaults() {
        let inst = normalizer()
            .normalize(&raw(1, "2024-11-15T08:00:00", None), None)
            .unwrap();
        assert_eq!(inst.medicine_name, "Medicina");
        assert_eq!(inst.dosage, "");
        assert_eq!(inst.method, DeliveryMethod::Whatsapp);
        assert_eq!(inst.status, InstanceStatus::Pending);
        assert_eq!(inst.retry_count, 0);
        assert_eq!(inst.max_retries, 3);
    }

    #[test]
    fn medicine_record_wins_over_prejoined_fields() {
        let mut r = raw(2, "2024-11-15T08:00:00", Some("success"));
        r.medicine_name = Some("Old".into());
        r.method = Some("call".into());
        let med = Medicine {
            id: 9,
            name: "Losartán".into(),
            dosage: Some("50mg".into()),
            tablets_left: Some(12),
        };
        let inst = normalizer().normalize(&r, Some(&med)).unwrap();
        assert_eq!(inst.medicine_name, "Losartán");
        assert_eq!(inst.dosage, "50mg");
        assert_eq!(inst.method, DeliveryMethod::Call);
    }

    #[test]
    fn custom_placeholder_and_method() {
        let n = normalizer()
            .with_placeholder("Unknown")
            .with_default_method(DeliveryMethod::Call);
        let mut r = raw(3, "2024-11-15T08:00:00", Some("waiting"));
        r.method = Some("pigeon".into());
        let inst = n.normalize(&r, None).unwrap();
        assert_eq!(inst.medicine_name, "Unknown");
        assert_eq!(inst.method, DeliveryMethod::Call);
    }

    #[test]
    fn taken_at_only_kept_on_success() {
        let mut pending = raw(4, "2024-11-15T08:00:00", Some("failure"));
        pending.taken_at = Some("2024-11-15T08:05:00".into());
        let inst = normalizer().normalize(&pending, None).unwrap();
        assert_eq!(inst.status, InstanceStatus::Failed);
        assert_eq!(inst.taken_at, None);

        let mut done = raw(5, "2024-11-15T08:00:00", Some("success"));
        done.taken_at = Some("2024-11-15T08:05:00".into());
        let inst = normalizer().normalize(&done, None).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 11, 15)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        assert_eq!(inst.taken_at, Some(expected));
    }

    #[test]
    fn batch_skips_malformed_records() {
        let raws = vec![
            raw(1, "2024-11-15T08:00:00", Some("pending")),
            raw(2, "yesterday-ish", Some("pending")),
            raw(3, "2024-11-15T20:00:00", Some("rejected")),
        ];
        let out = normalizer().normalize_all(&raws);
        assert_eq!(out.instances.len(), 2);
        assert_eq!(out.instances[1].status, InstanceStatus::Failed);
        assert_eq!(
            out.rejected,
            vec![InstanceError::InvalidTimestamp {
                id: 2,
                field: "scheduled_datetime",
                value: "yesterday-ish".into(),
            }]
        );
    }

    #[test]
    fn deserializes_backend_payload() {
        let json = r#"{
            "id": 10, "reminder_id": 3, "scheduled_datetime": "2024-11-15T08:00:00",
            "status": null, "taken_at": null, "retry_count": 1, "max_retries": null,
            "family_notified": false, "notes": null, "created_at": "2024-11-01T00:00:00",
            "updated_at": null, "medicine_name": "Metformina", "dosage": "850mg"
        }"#;
        let r: RawInstance = serde_json::from_str(json).unwrap();
        let inst = normalizer().normalize(&r, None).unwrap();
        assert_eq!(inst.retry_count, 1);
        assert_eq!(inst.max_retries, 3);
        assert_eq!(inst.medicine_name, "Metformina");
    }
}
