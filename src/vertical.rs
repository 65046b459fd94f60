use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// How date keys are ordered in a built collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// Plain string order on `MM/DD/YYYY`. Matches the legacy listings API,
    /// which puts `01/01/2025` before `12/31/2024`.
    #[default]
    Lexical,
    /// Year, then month, then day.
    Chronological,
}

/// Field bindings for one listings feed (events, tours, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertical {
    pub name: String,
    pub records_field: String,
    pub date_field: String,
    pub category_field: String,
    pub flag_value: String,
    pub spotlight_field: Option<String>,
    pub virtual_field: Option<String>,
    pub in_person_field: Option<String>,
    pub audience_fields: Vec<String>,
    pub date_order: DateOrder,
}

/// One `verticals:` entry. Absent keys keep the value of the vertical it
/// lands on.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct VerticalEntry {
    name: String,
    records_field: Option<String>,
    date_field: Option<String>,
    category_field: Option<String>,
    flag_value: Option<String>,
    spotlight_field: Option<String>,
    virtual_field: Option<String>,
    in_person_field: Option<String>,
    audience_fields: Option<Vec<String>>,
    date_order: Option<DateOrder>,
}

impl VerticalEntry {
    fn merge_onto(self, base: &mut Vertical) {
        if let Some(v) = self.records_field {
            base.records_field = v;
        }
        if let Some(v) = self.date_field {
            base.date_field = v;
        }
        if let Some(v) = self.category_field {
            base.category_field = v;
        }
        if let Some(v) = self.flag_value {
            base.flag_value = v;
        }
        if let Some(v) = self.spotlight_field {
            base.spotlight_field = Some(v);
        }
        if let Some(v) = self.virtual_field {
            base.virtual_field = Some(v);
        }
        if let Some(v) = self.in_person_field {
            base.in_person_field = Some(v);
        }
        if let Some(v) = self.audience_fields {
            base.audience_fields = v;
        }
        if let Some(v) = self.date_order {
            base.date_order = v;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    verticals: Vec<VerticalEntry>,
}

fn default_records_field() -> String {
    "row".to_string()
}

fn default_date_field() -> String {
    "StartDate".to_string()
}

fn default_category_field() -> String {
    "Category".to_string()
}

fn default_flag_value() -> String {
    "Y".to_string()
}

impl Vertical {
    /// A vertical with generic defaults and no named flags bound.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records_field: default_records_field(),
            date_field: default_date_field(),
            category_field: default_category_field(),
            flag_value: default_flag_value(),
            spotlight_field: None,
            virtual_field: None,
            in_person_field: None,
            audience_fields: Vec::new(),
            date_order: DateOrder::Lexical,
        }
    }

    pub fn events() -> Self {
        Self {
            spotlight_field: Some("SPOTLIGHTEvent".to_string()),
            virtual_field: Some("VIRTUALEvent".to_string()),
            in_person_field: Some("INPERSONEvent".to_string()),
            audience_fields: vec!["TREvent".to_string(), "FYEvent".to_string()],
            ..Self::new("events")
        }
    }

    pub fn tours() -> Self {
        Self {
            spotlight_field: Some("SPOTLIGHTTour".to_string()),
            ..Self::new("tours")
        }
    }

    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    pub fn is_audience(&self, which: &str) -> bool {
        self.audience_fields.iter().any(|f| f == which)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub verticals: Vec<Vertical>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verticals: vec![Vertical::events(), Vertical::tours()],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Entries named like a built-in are merged onto it; other names start
    /// from the generic defaults of [`Vertical::new`].
    pub fn from_yaml(content: &str) -> Result<Self> {
        let parsed: ConfigFile = serde_yaml::from_str(content)?;

        let mut merged = Config::default();
        let mut seen: Vec<String> = Vec::new();
        for (i, entry) in parsed.verticals.into_iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(Error::Config(format!("vertical #{} has an empty name", i + 1)));
            }
            if seen.contains(&entry.name) {
                return Err(Error::Config(format!("vertical '{}' is defined twice", entry.name)));
            }
            seen.push(entry.name.clone());

            match merged.verticals.iter_mut().find(|v| v.name == entry.name) {
                Some(slot) => entry.merge_onto(slot),
                None => {
                    let mut vertical = Vertical::new(entry.name.clone());
                    entry.merge_onto(&mut vertical);
                    merged.verticals.push(vertical);
                }
            }
        }
        merged.validate()?;
        Ok(merged)
    }

    pub fn vertical(&self, name: &str) -> Result<&Vertical> {
        self.verticals
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| Error::UnknownVertical(name.to_string()))
    }

    fn validate(&self) -> Result<()> {
        for v in &self.verticals {
            if v.date_field.is_empty() || v.records_field.is_empty() {
                return Err(Error::Config(format!(
                    "vertical '{}' needs non-empty records_field and date_field",
                    v.name
                )));
            }
        }
        Ok(())
    }
}
