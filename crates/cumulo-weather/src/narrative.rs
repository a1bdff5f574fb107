//! Sentence templates, one per forecast category. Every formatter is a pure
//! function over (date, day period, place, forecast entry); when no entry
//! matched the requested day they all fall back to the same sentence.

use chrono::{DateTime, Datelike, Utc};

use crate::category::ForecastCategory;
use crate::pipeline::DayPeriod;
use crate::types::ForecastEntry;

pub fn render(
    category: ForecastCategory,
    when: DateTime<Utc>,
    period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    match category {
        ForecastCategory::General => general(when, period, place, entry),
        ForecastCategory::Precipitation => precipitation(when, period, place, entry),
        ForecastCategory::Thunder => thunder(when, period, place, entry),
        ForecastCategory::Wind => wind(when, period, place, entry),
        ForecastCategory::Golf => golf(when, period, place, entry),
        ForecastCategory::Temperature => temperature(when, period, place, entry),
        ForecastCategory::OutsideActivities => outside_activities(when, period, place, entry),
    }
}

/// Shared sentence for any request the forecast window cannot answer.
pub fn fallback(when: DateTime<Utc>) -> String {
    format!(
        "You asked for weather on {} but I can only tell you weather for the next 10 days.",
        spoken_date(when)
    )
}

/// "Tuesday, September 1st 2026" — dates are spoken, not ISO.
pub fn spoken_date(when: DateTime<Utc>) -> String {
    let day = when.day();
    format!(
        "{}, {} {}{} {}",
        when.format("%A"),
        when.format("%B"),
        day,
        ordinal_suffix(day),
        when.format("%Y")
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

fn general(
    when: DateTime<Utc>,
    _period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    match entry.and_then(|e| e.narrative.as_deref()) {
        Some(narrative) => format!(
            "Weather in {place} for {} is {narrative}",
            spoken_date(when)
        ),
        None => fallback(when),
    }
}

fn precipitation(
    when: DateTime<Utc>,
    _period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    match entry {
        Some(e) if e.qpf.unwrap_or(0.0) > 0.0 => format!(
            "Looks like you might get some precipitation in {place} on {}",
            spoken_date(when)
        ),
        Some(_) => format!(
            "It looks like its going to be dry in {place} on {}",
            spoken_date(when)
        ),
        None => fallback(when),
    }
}

fn thunder(
    when: DateTime<Utc>,
    _period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    match entry
        .and_then(ForecastEntry::part)
        .and_then(|p| p.thunder_enum_phrase.as_deref())
    {
        Some(phrase) => format!(
            "It looks like there is {phrase} warnings on {} in {place}",
            spoken_date(when)
        ),
        None => fallback(when),
    }
}

fn wind(
    when: DateTime<Utc>,
    _period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    match entry
        .and_then(ForecastEntry::part)
        .and_then(|p| p.wind_phrase.as_deref())
    {
        Some(phrase) => format!(
            "There will be {phrase} on {} in {place}",
            spoken_date(when)
        ),
        None => fallback(when),
    }
}

fn golf(
    when: DateTime<Utc>,
    _period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    match entry
        .and_then(ForecastEntry::part)
        .and_then(|p| p.golf_category.as_deref())
    {
        Some(category) => format!(
            "Conditions to play golf is {category} on {} in {place}",
            spoken_date(when)
        ),
        None => fallback(when),
    }
}

fn outside_activities(
    when: DateTime<Utc>,
    _period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    match entry
        .and_then(ForecastEntry::part)
        .and_then(|p| p.golf_category.as_deref())
    {
        Some(category) => format!(
            "Conditions for outside activities are {category} on {} in {place}",
            spoken_date(when)
        ),
        None => fallback(when),
    }
}

fn temperature(
    when: DateTime<Utc>,
    _period: Option<DayPeriod>,
    place: &str,
    entry: Option<&ForecastEntry>,
) -> String {
    let hi = entry.and_then(ForecastEntry::part).and_then(|p| p.hi);
    let Some(hi) = hi else {
        return fallback(when);
    };
    // Exactly 60 and exactly 90 match no band and keep the fallback
    // sentence. Long-standing behavior, pinned by tests.
    if hi < 60.0 {
        format!(
            "It will be on the cold side with a high of {hi} on {} in {place}",
            spoken_date(when)
        )
    } else if hi > 60.0 && hi < 90.0 {
        format!(
            "It will be nice with a high of {hi} on {} in {place}",
            spoken_date(when)
        )
    } else if hi > 90.0 {
        format!(
            "It will be on the hot side with a high of {hi} on {} in {place}",
            spoken_date(when)
        )
    } else {
        fallback(when)
    }
}
