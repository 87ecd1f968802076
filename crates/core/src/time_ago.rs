//! Relative time strings ("3 days ago") with localizable labels.
//!
//! Labels come from the theme as JSON (the `data-time-ago-labels` attribute),
//! using camelCase keys. Missing keys fall back to English.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

/// Placeholder in [`TimeAgoLabels::ago`] replaced by `"<count> <unit>"`.
const COUNT_PLACEHOLDER: &str = "%s";

/// Localized unit names and phrases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeAgoLabels {
    pub year: String,
    pub years: String,
    pub month: String,
    pub months: String,
    pub week: String,
    pub weeks: String,
    pub day: String,
    pub days: String,
    pub hour: String,
    pub hours: String,
    pub minute: String,
    pub minutes: String,
    /// Sentence template, e.g. `"%s ago"`.
    pub ago: String,
    pub just_now: String,
}

impl Default for TimeAgoLabels {
    fn default() -> Self {
        Self {
            year: "year".into(),
            years: "years".into(),
            month: "month".into(),
            months: "months".into(),
            week: "week".into(),
            weeks: "weeks".into(),
            day: "day".into(),
            days: "days".into(),
            hour: "hour".into(),
            hours: "hours".into(),
            minute: "minute".into(),
            minutes: "minutes".into(),
            ago: "%s ago".into(),
            just_now: "Just now".into(),
        }
    }
}

impl TimeAgoLabels {
    /// Parse labels from the theme's JSON, falling back to English on error.
    #[must_use]
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// `(seconds, singular, plural)`, largest unit first.
    fn units(&self) -> [(i64, &str, &str); 6] {
        [
            (31_536_000, self.year.as_str(), self.years.as_str()),
            (2_592_000, self.month.as_str(), self.months.as_str()),
            (604_800, self.week.as_str(), self.weeks.as_str()),
            (86_400, self.day.as_str(), self.days.as_str()),
            (3_600, self.hour.as_str(), self.hours.as_str()),
            (60, self.minute.as_str(), self.minutes.as_str()),
        ]
    }
}

/// Format `then` relative to `now` using the largest unit that fits once.
///
/// Anything under a minute, including timestamps in the future, is
/// [`TimeAgoLabels::just_now`].
#[must_use]
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>, labels: &TimeAgoLabels) -> String {
    let elapsed = (now - then).num_seconds();

    labels
        .units()
        .into_iter()
        .find_map(|(seconds, singular, plural)| {
            let count = elapsed / seconds;
            (count >= 1).then(|| {
                let unit = if count == 1 { singular } else { plural };
                labels
                    .ago
                    .replacen(COUNT_PLACEHOLDER, &format!("{count} {unit}"), 1)
            })
        })
        .unwrap_or_else(|| labels.just_now.clone())
}

/// Parse the timestamp formats the storefront renders.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC), and a bare
/// `YYYY-MM-DD` (midnight UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn ago(duration: Duration) -> String {
        format_time_ago(now() - duration, now(), &TimeAgoLabels::default())
    }

    #[test]
    fn test_just_now() {
        assert_eq!(ago(Duration::seconds(0)), "Just now");
        assert_eq!(ago(Duration::seconds(59)), "Just now");
        assert_eq!(ago(Duration::seconds(-300)), "Just now");
    }

    #[test]
    fn test_singular_and_plural() {
        assert_eq!(ago(Duration::seconds(60)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(5)), "5 minutes ago");
        assert_eq!(ago(Duration::hours(1)), "1 hour ago");
        assert_eq!(ago(Duration::hours(23)), "23 hours ago");
        assert_eq!(ago(Duration::days(2)), "2 days ago");
    }

    #[test]
    fn test_largest_unit_wins() {
        assert_eq!(ago(Duration::days(7)), "1 week ago");
        assert_eq!(ago(Duration::days(29)), "4 weeks ago");
        assert_eq!(ago(Duration::days(30)), "1 month ago");
        assert_eq!(ago(Duration::days(365)), "1 year ago");
        assert_eq!(ago(Duration::days(800)), "2 years ago");
    }

    #[test]
    fn test_localized_labels() {
        let labels = TimeAgoLabels::from_json(
            r#"{"day": "يوم", "days": "أيام", "ago": "منذ %s", "justNow": "الآن"}"#,
        );
        assert_eq!(
            format_time_ago(now() - Duration::days(3), now(), &labels),
            "منذ 3 أيام"
        );
        assert_eq!(format_time_ago(now(), now(), &labels), "الآن");
        // Unspecified keys keep their English defaults
        assert_eq!(labels.hour, "hour");
    }

    #[test]
    fn test_invalid_labels_fall_back_to_english() {
        assert_eq!(TimeAgoLabels::from_json("not json"), TimeAgoLabels::default());
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2025, 5, 30, 8, 15, 0).unwrap();
        assert_eq!(parse_timestamp("2025-05-30T08:15:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-30T11:15:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-30 08:15:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-05-30"),
            Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
