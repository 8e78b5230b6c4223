//! Expand source-platform timestamp tags into formatted date strings.
//!
//! Tags look like `<t:1719763200:F>` (escaped to `&lt;t:…&gt;` by the time
//! they reach this module). Seven format codes are supported; `R` renders a
//! coarse relative phrase against the caller-supplied `now`.

use std::sync::LazyLock;

use {
    chrono::{DateTime, TimeZone, Utc},
    regex::{Captures, Regex},
};

static TIMESTAMP_TAG: LazyLock<Regex> =
    LazyLock::new(|| crate::pattern(r"&lt;t:(\d{10})(?::([a-zA-Z]))?&gt;"));

pub(crate) fn expand_tags(text: &str, now: DateTime<Utc>) -> String {
    TIMESTAMP_TAG
        .replace_all(text, |caps: &Captures<'_>| {
            let secs: i64 = caps[1].parse().unwrap_or_default();
            let code = caps.get(2).map_or("f", |m| m.as_str());
            render(secs, code, now)
        })
        .into_owned()
}

/// Render one tag. All absolute forms are UTC with English month and weekday
/// names; unknown codes fall back to the generic date-time form.
fn render(secs: i64, code: &str, now: DateTime<Utc>) -> String {
    let Some(date) = Utc.timestamp_opt(secs, 0).single() else {
        return String::new();
    };
    match code {
        "t" => date.format("%-I:%M %p").to_string(),
        "T" => date.format("%-I:%M:%S %p").to_string(),
        "d" => date.format("%d/%m/%Y").to_string(),
        "D" => date.format("%B %-d, %Y").to_string(),
        "f" => date.format("%B %-d, %Y at %-I:%M %p").to_string(),
        "F" => date.format("%A, %B %-d, %Y at %-I:%M %p").to_string(),
        "R" => relative(now, date),
        _ => date.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
    }
}

/// Coarse relative phrase: days if at least one, else hours, else minutes.
fn relative(now: DateTime<Utc>, date: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(date);
    let suffix = if delta >= chrono::Duration::zero() {
        "ago"
    } else {
        "from now"
    };

    let days = delta.num_days().abs();
    if days >= 1 {
        return format!("{days} day(s) {suffix}");
    }
    let hours = delta.num_hours().abs();
    if hours >= 1 {
        return format!("{hours} hour(s) {suffix}");
    }
    let minutes = delta.num_minutes().abs();
    format!("{minutes} minute(s) {suffix}")
}
