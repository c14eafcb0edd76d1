//! Human-readable age labels
//!
//! Both styles pick the largest non-zero unit and floor-divide. Anything
//! up to 30 seconds reads as "just opened".

const SECOND: u64 = 1_000;

struct Units {
    seconds: u64,
    minutes: u64,
    hours: u64,
    days: u64,
}

fn split(age_ms: u64) -> Units {
    let seconds = age_ms / SECOND;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    Units {
        seconds,
        minutes,
        hours,
        days,
    }
}

/// Short label for the in-page badge: `3d`, `5h`, `1m`, `45s`, `now`
pub fn compact(age_ms: u64) -> String {
    let u = split(age_ms);
    if u.days > 0 {
        format!("{}d", u.days)
    } else if u.hours > 0 {
        format!("{}h", u.hours)
    } else if u.minutes > 0 {
        format!("{}m", u.minutes)
    } else if u.seconds > 30 {
        format!("{}s", u.seconds)
    } else {
        "now".to_string()
    }
}

/// Sentence label for the popup list: `2 days ago`, `1 hour ago`, `Just now`
pub fn verbose(age_ms: u64) -> String {
    let u = split(age_ms);
    if u.days > 0 {
        plural(u.days, "day")
    } else if u.hours > 0 {
        plural(u.hours, "hour")
    } else if u.minutes > 0 {
        plural(u.minutes, "minute")
    } else if u.seconds > 30 {
        plural(u.seconds, "second")
    } else {
        "Just now".to_string()
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n > 1 {
        format!("{n} {unit}s ago")
    } else {
        format!("{n} {unit} ago")
    }
}
