//! The sentence the clock speaks.

use chrono::{Local, NaiveDateTime};

const TIME_PHRASE_FORMAT: &str = "the time is %M minutes past %H, on %b %d, %Y";

pub fn time_phrase(at: &NaiveDateTime) -> String {
    at.format(TIME_PHRASE_FORMAT).to_string()
}

/// The phrase for the current local time.
pub fn now_phrase() -> String {
    time_phrase(&Local::now().naive_local())
}
