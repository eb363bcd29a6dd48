use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Default color for newly created events.
pub const DEFAULT_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl EventId {
    /// Timestamp-based id; falls back to one past the highest taken id on collision.
    pub fn generate<'a>(taken: impl IntoIterator<Item = &'a EventId>) -> Self {
        let candidate = Local::now().timestamp_millis();
        let mut max = None;
        let mut collides = false;
        for id in taken {
            collides |= id.0 == candidate;
            max = max.max(Some(id.0));
        }
        match (collides, max) {
            (true, Some(max)) => EventId(max + 1),
            _ => EventId(candidate),
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recurrence::None => "Does not repeat",
            Recurrence::Daily => "Daily",
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Recurrence::None => Recurrence::Daily,
            Recurrence::Daily => Recurrence::Weekly,
            Recurrence::Weekly => Recurrence::Monthly,
            Recurrence::Monthly => Recurrence::None,
        }
    }
}

// Anything unrecognised, including a missing value, is a one-off event.
impl From<Option<String>> for Recurrence {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("daily") => Recurrence::Daily,
            Some("weekly") => Recurrence::Weekly,
            Some("monthly") => Recurrence::Monthly,
            _ => Recurrence::None,
        }
    }
}

impl From<Recurrence> for String {
    fn from(value: Recurrence) -> Self {
        value.as_str().to_string()
    }
}

/// A stored event: either a one-off or the anchor of a recurring series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEvent")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    #[serde(serialize_with = "local_datetime::serialize")]
    pub date: NaiveDateTime,
    pub time: Option<String>,
    pub recurrence: Recurrence,
    pub color: Option<String>,
}

/// On-disk shape of an event. Older files name the recurrence `repeat`, and
/// records edited by both versions carry both keys; `recurrence` wins.
#[derive(Deserialize)]
struct RawEvent {
    id: EventId,
    title: String,
    #[serde(default, deserialize_with = "non_empty")]
    description: Option<String>,
    #[serde(with = "local_datetime")]
    date: NaiveDateTime,
    #[serde(default, deserialize_with = "non_empty")]
    time: Option<String>,
    #[serde(default)]
    recurrence: Option<String>,
    #[serde(default)]
    repeat: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    color: Option<String>,
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        Event {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            date: raw.date,
            time: raw.time,
            recurrence: Recurrence::from(raw.recurrence.or(raw.repeat)),
            color: raw.color,
        }
    }
}

impl Event {
    /// Case-insensitive match against title and description. An empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    pub fn instance_at(&self, date: NaiveDateTime) -> EventInstance {
        EventInstance {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            date,
            time: self.time.clone(),
            recurrence: self.recurrence,
            color: self.color.clone(),
        }
    }
}

/// One concrete occurrence of an [`Event`], produced for a single render.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInstance {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub time: Option<String>,
    pub recurrence: Recurrence,
    pub color: Option<String>,
}

impl EventInstance {
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn time_display(&self) -> String {
        self.time.clone().unwrap_or_else(|| "All day".to_string())
    }
}

/// Input to `Calendar::create`; `id` is assigned when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub id: Option<EventId>,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub time: Option<String>,
    pub recurrence: Recurrence,
    pub color: Option<String>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            date,
            time: None,
            recurrence: Recurrence::None,
            color: Some(DEFAULT_COLOR.to_string()),
        }
    }

    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            recurrence: self.recurrence,
            color: self.color,
        }
    }
}

/// Parse a stored event date.
///
/// Accepts a naive ISO date-time, an RFC 3339 timestamp (converted to local
/// time), or a bare `YYYY-MM-DD` taken as midnight.
pub fn parse_event_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

mod local_datetime {
    use super::*;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_event_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid event date '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_event() -> Event {
        Event {
            id: EventId(1),
            title: "Team Standup".to_string(),
            description: Some("Daily sync with the Platform team".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 6, 3)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            time: Some("09:30".to_string()),
            recurrence: Recurrence::Daily,
            color: Some(DEFAULT_COLOR.to_string()),
        }
    }

    #[test]
    fn test_matches_empty_term() {
        assert!(make_test_event().matches(""));
    }

    #[test]
    fn test_matches_title_case_insensitive() {
        let event = make_test_event();
        assert!(event.matches("standup"));
        assert!(event.matches("TEAM"));
        assert!(!event.matches("retro"));
    }

    #[test]
    fn test_matches_description() {
        let event = make_test_event();
        assert!(event.matches("platform"));

        let mut no_description = event;
        no_description.description = None;
        assert!(!no_description.matches("platform"));
    }

    #[test]
    fn test_instance_copies_everything_but_date() {
        let event = make_test_event();
        let date = event.date + chrono::Duration::days(3);
        let instance = event.instance_at(date);

        assert_eq!(instance.id, event.id);
        assert_eq!(instance.title, event.title);
        assert_eq!(instance.description, event.description);
        assert_eq!(instance.time, event.time);
        assert_eq!(instance.recurrence, event.recurrence);
        assert_eq!(instance.color, event.color);
        assert_eq!(instance.date, date);
    }

    #[test]
    fn test_unknown_recurrence_is_none() {
        let json = r#"{"id":5,"title":"Gym","date":"2024-06-10T00:00:00","recurrence":"yearly"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.recurrence, Recurrence::None);
    }

    #[test]
    fn test_missing_and_null_recurrence_is_none() {
        let missing = r#"{"id":5,"title":"Gym","date":"2024-06-10T00:00:00"}"#;
        let null = r#"{"id":5,"title":"Gym","date":"2024-06-10T00:00:00","recurrence":null}"#;
        assert_eq!(serde_json::from_str::<Event>(missing).unwrap().recurrence, Recurrence::None);
        assert_eq!(serde_json::from_str::<Event>(null).unwrap().recurrence, Recurrence::None);
    }

    #[test]
    fn test_legacy_repeat_field() {
        let json = r#"{"id":5,"title":"Gym","date":"2024-06-10T00:00:00","repeat":"weekly"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.recurrence, Recurrence::Weekly);
    }

    #[test]
    fn test_recurrence_and_repeat_together() {
        let json = r#"{"id":5,"title":"Gym","date":"2024-06-10T00:00:00","recurrence":"daily","repeat":"weekly"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.recurrence, Recurrence::Daily);

        let null_recurrence = r#"{"id":5,"title":"Gym","date":"2024-06-10T00:00:00","recurrence":null,"repeat":"monthly"}"#;
        let event: Event = serde_json::from_str(null_recurrence).unwrap();
        assert_eq!(event.recurrence, Recurrence::Monthly);
    }

    #[test]
    fn test_empty_strings_read_as_absent() {
        let json = r#"{"id":5,"title":"Gym","description":"","date":"2024-06-10T00:00:00","time":"","color":""}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.description, None);
        assert_eq!(event.time, None);
        assert_eq!(event.color, None);
    }

    #[test]
    fn test_parse_event_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_event_date("2024-06-10"), Some(midnight));
        assert_eq!(parse_event_date("2024-06-10T00:00:00"), Some(midnight));
        assert_eq!(parse_event_date("2024-06-10T00:00:00.000"), Some(midnight));
        assert!(parse_event_date("2024-06-10T00:00:00.000Z").is_some());
        assert_eq!(parse_event_date("next tuesday"), None);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(make_test_event()).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["date"], "2024-06-03T09:30:00");
        assert_eq!(value["recurrence"], "daily");
    }

    #[test]
    fn test_generate_id_avoids_collision() {
        let now = Local::now().timestamp_millis();
        let taken = [EventId(now), EventId(now + 10)];
        let id = EventId::generate(taken.iter());
        // Either the clock moved on or we skipped past the highest id.
        assert!(!taken.contains(&id));
    }

    #[test]
    fn test_recurrence_cycle() {
        let mut r = Recurrence::None;
        for _ in 0..4 {
            r = r.next();
        }
        assert_eq!(r, Recurrence::None);
    }
}
