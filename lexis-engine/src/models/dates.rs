//! Date resolution against the request's reference date
//!
//! Sentences are always scanned for date expressions, so the result does
//! not depend on whether the entity stage ran. When it did, a mention
//! overlapping a DATE entity takes the entity's confidence.

use crate::classify::{DateValue, ModelHandle, ResolvedDate, TaskResult};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use lexis_core::{EntityType, TokenKind};

/// Confidence of mentions not backed by a DATE entity
const SCAN_CONFIDENCE: f32 = 0.7;

const MONTHS: &[(&str, u32)] = &[
    ("january", 1), ("jan", 1), ("february", 2), ("feb", 2), ("march", 3), ("mar", 3),
    ("april", 4), ("apr", 4), ("may", 5), ("june", 6), ("jun", 6), ("july", 7),
    ("jul", 7), ("august", 8), ("aug", 8), ("september", 9), ("sep", 9), ("sept", 9),
    ("october", 10), ("oct", 10), ("november", 11), ("nov", 11), ("december", 12),
    ("dec", 12),
];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon), ("mon", Weekday::Mon), ("tuesday", Weekday::Tue),
    ("tue", Weekday::Tue), ("tues", Weekday::Tue), ("wednesday", Weekday::Wed),
    ("wed", Weekday::Wed), ("thursday", Weekday::Thu), ("thu", Weekday::Thu),
    ("thur", Weekday::Thu), ("thurs", Weekday::Thu), ("friday", Weekday::Fri),
    ("fri", Weekday::Fri), ("saturday", Weekday::Sat), ("sat", Weekday::Sat),
    ("sunday", Weekday::Sun), ("sun", Weekday::Sun),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Next,
    Last,
    This,
}

impl Modifier {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "next" => Some(Modifier::Next),
            "last" | "previous" => Some(Modifier::Last),
            "this" | "coming" => Some(Modifier::This),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Week,
    Weekend,
    Month,
    Year,
}

impl Period {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "week" => Some(Period::Week),
            "weekend" => Some(Period::Weekend),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }
}

/// Resolves date mentions to calendar days and ranges
#[derive(Debug, Clone, Copy, Default)]
pub struct DateModel;

impl DateModel {
    /// Create the model
    pub fn new() -> Self {
        Self
    }
}

impl ModelHandle for DateModel {
    fn id(&self) -> &str {
        "builtin/date"
    }

    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError> {
        let reference = view.reference_date();
        let mut dates = Vec::new();

        for (index, sentence) in view.sentences().iter().enumerate() {
            let tokens = view.sentence_tokens(index);
            let mut i = 0;
            while i < tokens.len() {
                let Some((len, resolved)) = parse_at(tokens, i, reference) else {
                    i += 1;
                    continue;
                };
                let first = sentence.tokens.start + i;
                if let Some((span, text)) = view.slice_tokens(first..first + len) {
                    dates.push(ResolvedDate {
                        span,
                        text: text.to_string(),
                        sentence: index,
                        resolved,
                        confidence: SCAN_CONFIDENCE,
                    });
                }
                i += len;
            }
        }

        if view.entities_resolved() {
            let entities: Vec<_> = view
                .entities()
                .iter()
                .filter(|e| e.entity_type == EntityType::Date)
                .collect();
            for date in &mut dates {
                if let Some(confidence) = entities
                    .iter()
                    .filter(|e| e.span.overlaps(&date.span))
                    .map(|e| e.confidence)
                    .reduce(f32::max)
                {
                    date.confidence = confidence.clamp(0.0, 1.0);
                }
            }
        }

        Ok(TaskResult::Dates { dates })
    }
}

/// Parse a date expression starting at `tokens[at]`
///
/// Returns the number of tokens consumed and the resolved value.
fn parse_at(tokens: &[FeatureToken], at: usize, reference: NaiveDate) -> Option<(usize, DateValue)> {
    let word = |k: usize| tokens.get(at + k).map(|t| t.lower.as_str());
    let day = |date: NaiveDate| DateValue::Day { date };

    if let Some(modifier) = word(0).and_then(Modifier::parse) {
        if let Some(weekday) = tokens.get(at + 1).and_then(weekday_of) {
            return Some((2, day(resolve_weekday(reference, weekday, modifier)?)));
        }
        if let Some(period) = word(1).and_then(Period::parse) {
            return Some((2, period_range(reference, period, modifier)?));
        }
    }

    match word(0)? {
        "today" | "tonight" => return Some((1, day(reference))),
        "tomorrow" => return Some((1, day(reference.checked_add_days(Days::new(1))?))),
        "yesterday" => return Some((1, day(reference.checked_sub_days(Days::new(1))?))),
        _ => {}
    }

    let head = &tokens[at];
    if let Some(weekday) = weekday_of(head) {
        return Some((1, day(resolve_weekday(reference, weekday, Modifier::Next)?)));
    }
    if let Some(month) = month_of(head) {
        return parse_month_first(tokens, at, month, reference);
    }
    if head.kind == TokenKind::Number {
        if let Some(found) = parse_day_first(tokens, at, reference) {
            return Some(found);
        }
        return parse_numeric(&head.lower, reference).map(|value| (1, value));
    }
    None
}

/// "March 3", "March 3rd, 2025", "March 2025", "March"
fn parse_month_first(
    tokens: &[FeatureToken],
    at: usize,
    month: u32,
    reference: NaiveDate,
) -> Option<(usize, DateValue)> {
    let next = tokens.get(at + 1);

    if let Some(d) = next.and_then(|t| day_number(&t.lower)) {
        let comma = tokens.get(at + 2).is_some_and(|t| t.text == ",");
        let year_at = if comma { at + 3 } else { at + 2 };
        if let Some(year) = tokens.get(year_at).and_then(|t| year_number(&t.lower)) {
            let date = NaiveDate::from_ymd_opt(year, month, d)?;
            return Some((year_at - at + 1, DateValue::Day { date }));
        }
        return Some((2, DateValue::Day { date: next_occurrence(reference, month, d)? }));
    }

    if let Some(year) = next.and_then(|t| year_number(&t.lower)) {
        return Some((2, month_range(year, month)?));
    }

    // a bare "May" is almost always the modal verb, a bare "Jan" a name
    if tokens[at].lower == "may" || !is_full_month_name(&tokens[at].lower) {
        return None;
    }
    let year = if month >= reference.month() {
        reference.year()
    } else {
        reference.year() + 1
    };
    Some((1, month_range(year, month)?))
}

/// "3 March", "3rd of March 2025"
fn parse_day_first(
    tokens: &[FeatureToken],
    at: usize,
    reference: NaiveDate,
) -> Option<(usize, DateValue)> {
    let d = day_number(&tokens[at].lower)?;
    let mut month_at = at + 1;
    if tokens.get(month_at).is_some_and(|t| t.lower == "of") {
        month_at += 1;
    }
    let month = tokens.get(month_at).and_then(month_of)?;

    if let Some(year) = tokens.get(month_at + 1).and_then(|t| year_number(&t.lower)) {
        let date = NaiveDate::from_ymd_opt(year, month, d)?;
        return Some((month_at + 2 - at, DateValue::Day { date }));
    }
    Some((
        month_at + 1 - at,
        DateValue::Day {
            date: next_occurrence(reference, month, d)?,
        },
    ))
}

/// "2024-03-05", "12/25/2024", "25/12/24", "12/25"
fn parse_numeric(literal: &str, reference: NaiveDate) -> Option<DateValue> {
    let parts: Vec<&str> = literal.split(['-', '/']).collect();
    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;

    let date = match (parts.as_slice(), numbers.as_slice()) {
        ([y, _, _], &[year, month, d]) if literal.contains('-') && y.len() == 4 => {
            NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, d)?
        }
        (_, &[a, b, year]) if literal.contains('/') => {
            let year = if year < 100 { 2000 + year } else { year };
            let (month, d) = if a > 12 && b <= 12 { (b, a) } else { (a, b) };
            NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, d)?
        }
        (_, &[month, d]) if literal.contains('/') => next_occurrence(reference, month, d)?,
        _ => return None,
    };
    Some(DateValue::Day { date })
}

fn weekday_of(token: &FeatureToken) -> Option<Weekday> {
    let (name, weekday) = WEEKDAYS.iter().find(|(name, _)| *name == token.lower)?;
    // abbreviations such as "sun" and "sat" are also ordinary words
    (name.len() > 4 || token.text.starts_with(char::is_uppercase)).then_some(*weekday)
}

fn month_of(token: &FeatureToken) -> Option<u32> {
    if !token.text.starts_with(char::is_uppercase) {
        return None;
    }
    MONTHS
        .iter()
        .find(|(name, _)| *name == token.lower)
        .map(|(_, month)| *month)
}

fn is_full_month_name(lower: &str) -> bool {
    lower.len() > 4 || matches!(lower, "june" | "july")
}

fn day_number(literal: &str) -> Option<u32> {
    let digits = literal.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let suffix = &literal[digits.len()..];
    if !matches!(suffix, "" | "st" | "nd" | "rd" | "th") {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

fn year_number(literal: &str) -> Option<i32> {
    (literal.len() == 4)
        .then(|| literal.parse().ok())
        .flatten()
        .filter(|y| (1000..=9999).contains(y))
}

/// Upcoming `weekday`: strictly after the reference for `Next`, on or
/// after it for `This`, strictly before it for `Last`
fn resolve_weekday(reference: NaiveDate, weekday: Weekday, modifier: Modifier) -> Option<NaiveDate> {
    let target = weekday.num_days_from_monday();
    let current = reference.weekday().num_days_from_monday();

    match modifier {
        Modifier::Next | Modifier::This => {
            let mut ahead = (target + 7 - current) % 7;
            if ahead == 0 && modifier == Modifier::Next {
                ahead = 7;
            }
            reference.checked_add_days(Days::new(u64::from(ahead)))
        }
        Modifier::Last => {
            let back = match (current + 7 - target) % 7 {
                0 => 7,
                n => n,
            };
            reference.checked_sub_days(Days::new(u64::from(back)))
        }
    }
}

fn period_range(reference: NaiveDate, period: Period, modifier: Modifier) -> Option<DateValue> {
    let shift = |date: NaiveDate, days: u64| match modifier {
        Modifier::Next => date.checked_add_days(Days::new(days)),
        Modifier::Last => date.checked_sub_days(Days::new(days)),
        Modifier::This => Some(date),
    };
    let range = |start: NaiveDate, len: u64| {
        Some(DateValue::Range {
            start,
            end: start.checked_add_days(Days::new(len - 1))?,
        })
    };
    let monday = reference.checked_sub_days(Days::new(u64::from(
        reference.weekday().num_days_from_monday(),
    )))?;

    match period {
        Period::Week => range(shift(monday, 7)?, 7),
        Period::Weekend => range(shift(monday.checked_add_days(Days::new(5))?, 7)?, 2),
        Period::Month => {
            let (year, month) = match modifier {
                Modifier::Next if reference.month() == 12 => (reference.year() + 1, 1),
                Modifier::Next => (reference.year(), reference.month() + 1),
                Modifier::Last if reference.month() == 1 => (reference.year() - 1, 12),
                Modifier::Last => (reference.year(), reference.month() - 1),
                Modifier::This => (reference.year(), reference.month()),
            };
            month_range(year, month)
        }
        Period::Year => {
            let year = match modifier {
                Modifier::Next => reference.year() + 1,
                Modifier::Last => reference.year() - 1,
                Modifier::This => reference.year(),
            };
            Some(DateValue::Range {
                start: NaiveDate::from_ymd_opt(year, 1, 1)?,
                end: NaiveDate::from_ymd_opt(year, 12, 31)?,
            })
        }
    }
}

fn month_range(year: i32, month: u32) -> Option<DateValue> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let following = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(DateValue::Range {
        start,
        end: following.pred_opt()?,
    })
}

/// `month`/`d` in the reference year, or the next year if already past
fn next_occurrence(reference: NaiveDate, month: u32, d: u32) -> Option<NaiveDate> {
    match NaiveDate::from_ymd_opt(reference.year(), month, d) {
        Some(date) if date >= reference => Some(date),
        _ => NaiveDate::from_ymd_opt(reference.year() + 1, month, d),
    }
}
