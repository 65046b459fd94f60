use crate::error::Result;
use crate::filter::{DateSegment, Filter};
use crate::index::{self, Collection};
use crate::vertical::Vertical;
use serde_json::Value;
use tracing::debug;

/// Baseline plus a progressively narrowed view over one snapshot.
///
/// Every filter method replaces the view with a new collection; the baseline
/// is never touched after construction.
#[derive(Debug, Clone)]
pub struct QueryEngine<'v> {
    vertical: &'v Vertical,
    baseline: Collection,
    view: Collection,
}

impl<'v> QueryEngine<'v> {
    pub fn new(raw: Value, vertical: &'v Vertical) -> Result<Self> {
        let baseline = index::build(raw, vertical)?;
        Ok(Self {
            vertical,
            view: baseline.clone(),
            baseline,
        })
    }

    pub fn vertical(&self) -> &Vertical {
        self.vertical
    }

    pub fn baseline(&self) -> &Collection {
        &self.baseline
    }

    pub fn view(&self) -> &Collection {
        &self.view
    }

    pub fn into_view(self) -> Collection {
        self.view
    }

    /// Puts the view back to the full baseline.
    pub fn reset(&mut self) -> &mut Self {
        self.view = self.baseline.clone();
        self
    }

    pub fn apply(&mut self, step: &Filter) -> &mut Self {
        let narrowed = step.apply(&self.view, self.vertical);
        debug!(
            filter = %step,
            before = self.view.record_count(),
            after = narrowed.record_count(),
            "applied filter"
        );
        self.view = narrowed;
        self
    }

    pub fn by_date_segment(&mut self, segment: DateSegment, value: &str) -> &mut Self {
        let value = value.to_string();
        let step = match segment {
            DateSegment::Month => Filter::Month(value),
            DateSegment::Day => Filter::Day(value),
            DateSegment::Year => Filter::Year(value),
        };
        self.apply(&step)
    }

    pub fn by_month(&mut self, mm: &str) -> &mut Self {
        self.by_date_segment(DateSegment::Month, mm)
    }

    pub fn by_day(&mut self, dd: &str) -> &mut Self {
        self.by_date_segment(DateSegment::Day, dd)
    }

    pub fn by_year(&mut self, yyyy: &str) -> &mut Self {
        self.by_date_segment(DateSegment::Year, yyyy)
    }

    pub fn by_audience(&mut self, which: &str) -> &mut Self {
        self.apply(&Filter::Audience(which.to_string()))
    }

    pub fn spotlight(&mut self) -> &mut Self {
        self.apply(&Filter::Spotlight)
    }

    pub fn virtual_only(&mut self) -> &mut Self {
        self.apply(&Filter::Virtual)
    }

    pub fn in_person(&mut self) -> &mut Self {
        self.apply(&Filter::InPerson)
    }

    pub fn by_category(&mut self, category: &str) -> &mut Self {
        self.apply(&Filter::Category(category.to_string()))
    }

    pub fn by_flag(&mut self, field: &str, expected: &str) -> &mut Self {
        self.apply(&Filter::Flag {
            field: field.to_string(),
            expected: expected.to_string(),
        })
    }
}
