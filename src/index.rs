use crate::error::{Error, Result};
use crate::vertical::{DateOrder, Vertical};
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

pub type Record = Map<String, Value>;

/// All records sharing one date key, in snapshot order.
#[derive(Debug, Clone, PartialEq)]
pub struct DateBucket {
    pub date: String,
    pub records: Vec<Record>,
}

/// Date buckets in key order. Never holds an empty bucket.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    buckets: Vec<DateBucket>,
}

impl Collection {
    /// Callers must pass buckets already in key order with no empty bucket.
    pub(crate) fn from_ordered(buckets: Vec<DateBucket>) -> Self {
        debug_assert!(buckets.iter().all(|b| !b.records.is_empty()));
        Self { buckets }
    }

    pub fn buckets(&self) -> &[DateBucket] {
        &self.buckets
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.date.as_str())
    }

    pub fn get(&self, date: &str) -> Option<&[Record]> {
        self.buckets
            .iter()
            .find(|b| b.date == date)
            .map(|b| b.records.as_slice())
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.buckets.iter().flat_map(|b| b.records.iter())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|b| b.records.len()).sum()
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for bucket in &self.buckets {
            map.serialize_entry(&bucket.date, &bucket.records)?;
        }
        map.end()
    }
}

/// Groups the snapshot's record list by date and sorts the keys.
///
/// A root without the record list fails the whole build. Individual entries
/// that are not objects or carry no string date are skipped.
pub fn build(raw: Value, vertical: &Vertical) -> Result<Collection> {
    let Value::Object(mut container) = raw else {
        return Err(Error::MalformedInput(
            "snapshot root is not a JSON object".to_string(),
        ));
    };

    let rows = match container.remove(&vertical.records_field) {
        Some(Value::Array(rows)) => rows,
        Some(_) => {
            return Err(Error::MalformedInput(format!(
                "'{}' is not a list",
                vertical.records_field
            )))
        }
        None => {
            return Err(Error::MalformedInput(format!(
                "missing '{}' record list",
                vertical.records_field
            )))
        }
    };

    let total = rows.len();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<DateBucket> = Vec::new();

    let mut skipped = 0;

    for (i, row) in rows.into_iter().enumerate() {
        let Value::Object(record) = row else {
            warn!(vertical = %vertical.name, entry = i, "skipping non-object record");
            skipped += 1;
            continue;
        };
        let date = match record.get(&vertical.date_field) {
            Some(Value::String(s)) => s.clone(),
            _ => {
                warn!(
                    vertical = %vertical.name,
                    entry = i,
                    field = %vertical.date_field,
                    "skipping record without a string date"
                );
                skipped += 1;
                continue;
            }
        };

        match positions.get(&date) {
            Some(&idx) => buckets[idx].records.push(record),
            None => {
                positions.insert(date.clone(), buckets.len());
                buckets.push(DateBucket {
                    date,
                    records: vec![record],
                });
            }
        }
    }

    sort_buckets(&mut buckets, vertical.date_order);

    debug!(
        vertical = %vertical.name,
        records = total,
        skipped,
        dates = buckets.len(),
        "built date index"
    );

    Ok(Collection::from_ordered(buckets))
}

fn sort_buckets(buckets: &mut [DateBucket], order: DateOrder) {
    match order {
        DateOrder::Lexical => buckets.sort_by(|a, b| a.date.cmp(&b.date)),
        DateOrder::Chronological => buckets.sort_by(|a, b| {
            chronological_key(&a.date)
                .cmp(&chronological_key(&b.date))
                .then_with(|| a.date.cmp(&b.date))
        }),
    }
}

// Unparseable keys sort after every real date.
fn chronological_key(date: &str) -> (bool, Option<NaiveDate>) {
    let parsed = NaiveDate::parse_from_str(date, "%m/%d/%Y").ok();
    (parsed.is_none(), parsed)
}
