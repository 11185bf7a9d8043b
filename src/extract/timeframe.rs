//! Time-frame detection: seasons, dates, and explicit ranges.
//!
//! These patterns are independent of the pseudonym tables; relative phrasings
//! ("last season", "all time") come from `vocab::TIME_FRAMES` and are mapped
//! into [`TimeFrameKind`] by the extractor. More specific patterns run first
//! and claim their span, so "before 2018/19" never also yields a bare season.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbetween\s+(\d{4})\s+and\s+(\d{4})\b").unwrap()
});

static RE_SINCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsince\s+(?:the\s+)?(\d{4})(?:/(\d{2}))?\b").unwrap()
});

static RE_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbefore\s+(?:the\s+)?(\d{4})(?:/(\d{2}))?\b").unwrap()
});

static RE_DATE_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap()
});

static RE_DATE_SLASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap()
});

static RE_SEASON_SHORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})/(\d{2})\b").unwrap()
});

static RE_SEASON_LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{4})\b").unwrap()
});

/// A parsed time constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrameKind {
    /// A single season, normalized to `"YYYY/YY"`.
    Season(String),
    /// Everything from the given year onward.
    SinceYear(i32),
    /// Everything strictly before the given year.
    BeforeYear(i32),
    /// Everything strictly before the given season.
    BeforeSeason(String),
    /// An inclusive year range from "between X and Y".
    Range { from: i32, to: i32 },
    /// One calendar date.
    Date(NaiveDate),
    /// Resolved against the graph's current-season value at build time.
    LastSeason,
    ThisSeason,
    /// No time constraint; kept as an explicit marker so "all time" does not
    /// read as "no time frame mentioned".
    AllTime,
}

/// A time frame with its source span in the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrameSpan {
    pub kind: TimeFrameKind,
    pub original_text: String,
    pub position: usize,
}

/// Normalize a season start year to the schema's `"YYYY/YY"` form.
pub fn season_label(start_year: i32) -> String {
    format!("{start_year}/{:02}", (start_year + 1) % 100)
}

/// The season before the given `"YYYY/YY"` label, or `None` if the label is
/// malformed. A malformed current-season value degrades to "no filter"
/// downstream rather than failing the question.
pub fn previous_season(current: &str) -> Option<String> {
    let start: i32 = current.split(['/', '-']).next()?.parse().ok()?;
    Some(season_label(start - 1))
}

/// Detect all absolute time frames in the question, most specific first.
/// Overlapping later matches are dropped, so each span is claimed once.
pub fn detect_time_frames(question: &str) -> Vec<TimeFrameSpan> {
    let mut frames: Vec<TimeFrameSpan> = Vec::new();
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    let mut claim = |start: usize, end: usize, claimed: &mut Vec<(usize, usize)>| -> bool {
        if claimed.iter().any(|&(s, e)| start < e && s < end) {
            return false;
        }
        claimed.push((start, end));
        true
    };

    for m in RE_BETWEEN.captures_iter(question) {
        let whole = m.get(0).unwrap();
        if !claim(whole.start(), whole.end(), &mut claimed) {
            continue;
        }
        let from: i32 = m[1].parse().unwrap_or(0);
        let to: i32 = m[2].parse().unwrap_or(0);
        frames.push(TimeFrameSpan {
            kind: TimeFrameKind::Range {
                from: from.min(to),
                to: from.max(to),
            },
            original_text: whole.as_str().to_string(),
            position: whole.start(),
        });
    }

    for m in RE_SINCE.captures_iter(question) {
        let whole = m.get(0).unwrap();
        if !claim(whole.start(), whole.end(), &mut claimed) {
            continue;
        }
        if let Ok(year) = m[1].parse::<i32>() {
            frames.push(TimeFrameSpan {
                kind: TimeFrameKind::SinceYear(year),
                original_text: whole.as_str().to_string(),
                position: whole.start(),
            });
        }
    }

    for m in RE_BEFORE.captures_iter(question) {
        let whole = m.get(0).unwrap();
        if !claim(whole.start(), whole.end(), &mut claimed) {
            continue;
        }
        let Ok(year) = m[1].parse::<i32>() else { continue };
        let kind = if m.get(2).is_some() {
            TimeFrameKind::BeforeSeason(season_label(year))
        } else {
            TimeFrameKind::BeforeYear(year)
        };
        frames.push(TimeFrameSpan {
            kind,
            original_text: whole.as_str().to_string(),
            position: whole.start(),
        });
    }

    for m in RE_DATE_ISO.captures_iter(question) {
        let whole = m.get(0).unwrap();
        if !claim(whole.start(), whole.end(), &mut claimed) {
            continue;
        }
        // Malformed dates (month 13 etc.) are silently skipped.
        let (y, mo, d) = (
            m[1].parse().unwrap_or(0),
            m[2].parse().unwrap_or(0),
            m[3].parse().unwrap_or(0),
        );
        if let Some(date) = NaiveDate::from_ymd_opt(y, mo, d) {
            frames.push(TimeFrameSpan {
                kind: TimeFrameKind::Date(date),
                original_text: whole.as_str().to_string(),
                position: whole.start(),
            });
        }
    }

    for m in RE_DATE_SLASH.captures_iter(question) {
        let whole = m.get(0).unwrap();
        if !claim(whole.start(), whole.end(), &mut claimed) {
            continue;
        }
        // DD/MM/YYYY, the club's locale.
        let (d, mo, y) = (
            m[1].parse().unwrap_or(0),
            m[2].parse().unwrap_or(0),
            m[3].parse().unwrap_or(0),
        );
        if let Some(date) = NaiveDate::from_ymd_opt(y, mo, d) {
            frames.push(TimeFrameSpan {
                kind: TimeFrameKind::Date(date),
                original_text: whole.as_str().to_string(),
                position: whole.start(),
            });
        }
    }

    for m in RE_SEASON_SHORT.captures_iter(question) {
        let whole = m.get(0).unwrap();
        if !claim(whole.start(), whole.end(), &mut claimed) {
            continue;
        }
        if let Ok(start) = m[1].parse::<i32>() {
            frames.push(TimeFrameSpan {
                kind: TimeFrameKind::Season(season_label(start)),
                original_text: whole.as_str().to_string(),
                position: whole.start(),
            });
        }
    }

    for m in RE_SEASON_LONG.captures_iter(question) {
        let whole = m.get(0).unwrap();
        if !claim(whole.start(), whole.end(), &mut claimed) {
            continue;
        }
        let (Ok(a), Ok(b)) = (m[1].parse::<i32>(), m[2].parse::<i32>()) else {
            continue;
        };
        // "2017-2018" is the season starting 2017; any other gap is a range.
        let kind = if b == a + 1 {
            TimeFrameKind::Season(season_label(a))
        } else {
            TimeFrameKind::Range {
                from: a.min(b),
                to: a.max(b),
            }
        };
        frames.push(TimeFrameSpan {
            kind,
            original_text: whole.as_str().to_string(),
            position: whole.start(),
        });
    }

    frames.sort_by_key(|f| f.position);
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_short_season() {
        let frames = detect_time_frames("goals in 2017/18 please");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, TimeFrameKind::Season("2017/18".into()));
        assert_eq!(frames[0].original_text, "2017/18");
    }

    #[test]
    fn detects_long_season_and_range() {
        let frames = detect_time_frames("form in 2017-2018 and between 2015 and 2019");
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0].kind,
            TimeFrameKind::Season("2017/18".into()),
            "consecutive years read as a season"
        );
        assert_eq!(frames[1].kind, TimeFrameKind::Range { from: 2015, to: 2019 });
    }

    #[test]
    fn since_and_before_claim_their_year() {
        let frames = detect_time_frames("goals since 2020 but before 2023");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].kind, TimeFrameKind::SinceYear(2020));
        assert_eq!(frames[1].kind, TimeFrameKind::BeforeYear(2023));
    }

    #[test]
    fn before_season_keeps_season_form() {
        let frames = detect_time_frames("appearances before 2018/19");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, TimeFrameKind::BeforeSeason("2018/19".into()));
    }

    #[test]
    fn iso_date_parses() {
        let frames = detect_time_frames("the game on 2019-05-04");
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].kind,
            TimeFrameKind::Date(NaiveDate::from_ymd_opt(2019, 5, 4).unwrap())
        );
    }

    #[test]
    fn malformed_date_is_ignored() {
        let frames = detect_time_frames("the game on 2019-13-40");
        assert!(frames.is_empty(), "impossible date yields no frame, not an error");
    }

    #[test]
    fn slash_date_is_day_first() {
        let frames = detect_time_frames("what happened on 4/5/2019");
        assert_eq!(
            frames[0].kind,
            TimeFrameKind::Date(NaiveDate::from_ymd_opt(2019, 5, 4).unwrap())
        );
    }

    #[test]
    fn previous_season_arithmetic() {
        assert_eq!(previous_season("2024/25").as_deref(), Some("2023/24"));
        assert_eq!(previous_season("2000/01").as_deref(), Some("1999/00"));
        assert_eq!(previous_season("not a season"), None);
    }

    #[test]
    fn season_label_wraps_century() {
        assert_eq!(season_label(1999), "1999/00");
        assert_eq!(season_label(2017), "2017/18");
    }
}
