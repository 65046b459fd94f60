use crate::index::{Collection, DateBucket, Record};
use crate::vertical::Vertical;
use serde_json::Value;
use std::fmt;
use std::ops::Range;

/// A fixed-width slice of an `MM/DD/YYYY` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSegment {
    Month,
    Day,
    Year,
}

impl DateSegment {
    fn range(self) -> Range<usize> {
        match self {
            DateSegment::Month => 0..2,
            DateSegment::Day => 3..5,
            DateSegment::Year => 6..10,
        }
    }

    /// `None` when the key is too short to contain the segment.
    pub fn of(self, key: &str) -> Option<&str> {
        key.get(self.range())
    }
}

/// One narrowing step. Named variants resolve their field through a [`Vertical`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Month(String),
    Day(String),
    Year(String),
    Audience(String),
    Spotlight,
    Virtual,
    InPerson,
    Category(String),
    Flag { field: String, expected: String },
    /// A step whose request value was not a string; keeps nothing.
    Unmatched(Box<Filter>),
}

impl Filter {
    pub fn apply(&self, view: &Collection, vertical: &Vertical) -> Collection {
        match self {
            Filter::Month(v) => by_date_segment(view, DateSegment::Month, v),
            Filter::Day(v) => by_date_segment(view, DateSegment::Day, v),
            Filter::Year(v) => by_date_segment(view, DateSegment::Year, v),
            Filter::Audience(which) => by_audience(view, vertical, which),
            Filter::Spotlight => by_named_flag(view, vertical, vertical.spotlight_field.as_deref()),
            Filter::Virtual => by_named_flag(view, vertical, vertical.virtual_field.as_deref()),
            Filter::InPerson => by_named_flag(view, vertical, vertical.in_person_field.as_deref()),
            Filter::Category(category) => by_category(view, vertical, category),
            Filter::Flag { field, expected } => by_flag(view, field, expected),
            Filter::Unmatched(_) => Collection::default(),
        }
    }

    /// False for named flags the vertical has no field for.
    pub fn is_bound(&self, vertical: &Vertical) -> bool {
        match self {
            Filter::Spotlight => vertical.spotlight_field.is_some(),
            Filter::Virtual => vertical.virtual_field.is_some(),
            Filter::InPerson => vertical.in_person_field.is_some(),
            Filter::Audience(_) => !vertical.audience_fields.is_empty(),
            Filter::Unmatched(inner) => inner.is_bound(vertical),
            _ => true,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Month(v) => write!(f, "month={}", v),
            Filter::Day(v) => write!(f, "day={}", v),
            Filter::Year(v) => write!(f, "year={}", v),
            Filter::Audience(v) => write!(f, "audience={}", v),
            Filter::Spotlight => write!(f, "spotlight"),
            Filter::Virtual => write!(f, "virtual"),
            Filter::InPerson => write!(f, "inperson"),
            Filter::Category(v) => write!(f, "category={}", v),
            Filter::Flag { field, expected } => write!(f, "{}={}", field, expected),
            Filter::Unmatched(inner) => write!(f, "{} (not a string)", inner),
        }
    }
}

/// Keeps or drops whole buckets by one segment of their date key.
pub fn by_date_segment(view: &Collection, segment: DateSegment, value: &str) -> Collection {
    let buckets = view
        .buckets()
        .iter()
        .filter(|b| segment.of(&b.date) == Some(value))
        .cloned()
        .collect();
    Collection::from_ordered(buckets)
}

/// Keeps records whose `field` is the string `expected`.
pub fn by_flag(view: &Collection, field: &str, expected: &str) -> Collection {
    retain_records(view, |record| {
        record.get(field).and_then(Value::as_str) == Some(expected)
    })
}

/// Anything other than one of the vertical's audience fields matches nothing.
pub fn by_audience(view: &Collection, vertical: &Vertical, which: &str) -> Collection {
    if !vertical.is_audience(which) {
        return Collection::default();
    }
    by_flag(view, which, &vertical.flag_value)
}

pub fn by_category(view: &Collection, vertical: &Vertical, category: &str) -> Collection {
    by_flag(view, &vertical.category_field, category)
}

fn by_named_flag(view: &Collection, vertical: &Vertical, field: Option<&str>) -> Collection {
    match field {
        Some(field) => by_flag(view, field, &vertical.flag_value),
        None => Collection::default(),
    }
}

fn retain_records<F>(view: &Collection, keep: F) -> Collection
where
    F: Fn(&Record) -> bool,
{
    let buckets = view
        .buckets()
        .iter()
        .filter_map(|bucket| {
            let records: Vec<Record> = bucket.records.iter().filter(|r| keep(r)).cloned().collect();
            if records.is_empty() {
                None
            } else {
                Some(DateBucket {
                    date: bucket.date.clone(),
                    records,
                })
            }
        })
        .collect();
    Collection::from_ordered(buckets)
}
