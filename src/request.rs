use crate::engine::QueryEngine;
use crate::error::Result;
use crate::filter::Filter;
use crate::index::Collection;
use crate::vertical::Vertical;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Inbound query description. Every field is optional and unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub month: Option<Value>,
    #[serde(default)]
    pub day: Option<Value>,
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default)]
    pub audience: Option<Value>,
    #[serde(default)]
    pub spotlight: Option<Value>,
    #[serde(default, rename = "virtual")]
    pub virtual_only: Option<Value>,
    #[serde(default)]
    pub inperson: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
}

impl QueryRequest {
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Filters in the fixed order month, day, year, audience, spotlight,
    /// virtual, inperson, category. Falsy fields are skipped; a truthy value
    /// that is not a string becomes a step matching nothing.
    pub fn filters(&self) -> Vec<Filter> {
        let mut steps = Vec::new();
        steps.extend(text_step(&self.month, Filter::Month));
        steps.extend(text_step(&self.day, Filter::Day));
        steps.extend(text_step(&self.year, Filter::Year));
        steps.extend(text_step(&self.audience, Filter::Audience));
        if self.spotlight.as_ref().is_some_and(truthy) {
            steps.push(Filter::Spotlight);
        }
        if self.virtual_only.as_ref().is_some_and(truthy) {
            steps.push(Filter::Virtual);
        }
        if self.inperson.as_ref().is_some_and(truthy) {
            steps.push(Filter::InPerson);
        }
        steps.extend(text_step(&self.category, Filter::Category));
        steps
    }

    /// Like [`filters`](Self::filters), minus steps the vertical does not
    /// support. Tours listings have no audience, virtual or in-person flags,
    /// so those request fields are ignored there.
    pub fn plan(&self, vertical: &Vertical) -> Vec<Filter> {
        self.filters()
            .into_iter()
            .filter(|step| {
                let bound = step.is_bound(vertical);
                if !bound {
                    warn!(vertical = %vertical.name, filter = %step, "filter not supported, ignoring");
                }
                bound
            })
            .collect()
    }
}

fn text_step(field: &Option<Value>, make: fn(String) -> Filter) -> Option<Filter> {
    match field.as_ref().filter(|v| truthy(v))? {
        Value::String(s) => Some(make(s.clone())),
        other => Some(Filter::Unmatched(Box::new(make(other.to_string())))),
    }
}

/// Loose truthiness for request fields: `false`, `0`, `""` and `null` are off.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Builds the engine, runs the request's plan and returns the final view.
pub fn execute(raw: Value, vertical: &Vertical, request: &QueryRequest) -> Result<Collection> {
    let mut engine = QueryEngine::new(raw, vertical)?;
    for step in request.plan(vertical) {
        engine.apply(&step);
    }
    info!(
        vertical = %vertical.name,
        dates = engine.view().len(),
        records = engine.view().record_count(),
        "query complete"
    );
    Ok(engine.into_view())
}

/// HTTP-style success envelope around a view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<'a> {
    pub status_code: u16,
    pub headers: BTreeMap<&'static str, &'static str>,
    pub body: &'a Collection,
}

impl<'a> Response<'a> {
    pub fn ok(body: &'a Collection) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Origin", "*"),
        ]);
        Self {
            status_code: 200,
            headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn raw() -> Value {
        json!({"row": [
            {"StartDate": "03/05/2024", "Category": "Tour", "SPOTLIGHTEvent": "Y", "SPOTLIGHTTour": "Y"},
            {"StartDate": "03/05/2024", "Category": "Talk", "VIRTUALEvent": "Y"},
            {"StartDate": "04/01/2024", "Category": "Tour", "FYEvent": "Y"}
        ]})
    }

    #[test]
    fn test_fixed_filter_order() {
        let request = QueryRequest::from_json(
            r#"{"category": "Tour", "inperson": true, "virtual": "yes", "spotlight": 1,
                "audience": "FYEvent", "year": "2024", "day": "05", "month": "03"}"#,
        )
        .unwrap();
        let names: Vec<String> = request.filters().iter().map(|f| f.to_string()).collect();
        assert_eq!(
            names,
            [
                "month=03",
                "day=05",
                "year=2024",
                "audience=FYEvent",
                "spotlight",
                "virtual",
                "inperson",
                "category=Tour"
            ]
        );
    }

    #[test]
    fn test_falsy_fields_are_skipped() {
        let request = QueryRequest::from_json(
            r#"{"month": "", "spotlight": false, "virtual": 0, "inperson": null, "httpMethod": "GET"}"#,
        )
        .unwrap();
        assert!(request.filters().is_empty());
    }

    #[test]
    fn test_plan_drops_unbound_filters_for_tours() {
        let request = QueryRequest {
            audience: Some(json!("TREvent")),
            spotlight: Some(json!(true)),
            virtual_only: Some(json!(true)),
            inperson: Some(json!(true)),
            ..Default::default()
        };
        assert_eq!(request.plan(&Vertical::tours()), vec![Filter::Spotlight]);
        assert_eq!(request.plan(&Vertical::events()).len(), 4);
    }

    #[test]
    fn test_execute_events() {
        let request = QueryRequest {
            month: Some(json!("03")),
            spotlight: Some(json!(true)),
            ..Default::default()
        };
        let view = execute(raw(), &Vertical::events(), &request).unwrap();
        assert_eq!(view.record_count(), 1);
        assert_eq!(view.get("03/05/2024").unwrap()[0]["Category"], "Tour");
    }

    #[test]
    fn test_execute_tours_ignores_virtual() {
        let request = QueryRequest {
            virtual_only: Some(json!(true)),
            category: Some(json!("Tour")),
            ..Default::default()
        };
        let view = execute(raw(), &Vertical::tours(), &request).unwrap();
        assert_eq!(view.record_count(), 2);
    }

    #[test]
    fn test_non_string_values_match_nothing() {
        let request = QueryRequest::from_json(r#"{"month": 3}"#).unwrap();
        let steps = request.filters();
        assert_eq!(
            steps,
            vec![Filter::Unmatched(Box::new(Filter::Month("3".to_string())))]
        );
        assert!(execute(raw(), &Vertical::events(), &request).unwrap().is_empty());

        let request = QueryRequest::from_json(r#"{"category": ["Tour"], "day": 0}"#).unwrap();
        assert_eq!(request.filters().len(), 1);
        assert!(execute(raw(), &Vertical::events(), &request).unwrap().is_empty());
    }

    #[test]
    fn test_non_string_audience_still_ignored_for_tours() {
        let request = QueryRequest::from_json(r#"{"audience": 1}"#).unwrap();
        assert!(request.plan(&Vertical::tours()).is_empty());
        assert_eq!(request.plan(&Vertical::events()).len(), 1);
    }

    #[test]
    fn test_records_without_dates_do_not_block_queries() {
        let raw = json!({"row": [
            {"StartDate": "03/05/2024", "Category": "Tour"},
            {"Category": "Talk"}
        ]});
        let request = QueryRequest::from_json(r#"{"category": "Tour"}"#).unwrap();
        let view = execute(raw, &Vertical::events(), &request).unwrap();
        assert_eq!(view.keys().collect::<Vec<_>>(), ["03/05/2024"]);
        assert_eq!(view.record_count(), 1);
    }

    #[test]
    fn test_empty_request_returns_baseline() {
        let view = execute(raw(), &Vertical::events(), &QueryRequest::default()).unwrap();
        assert_eq!(view.record_count(), 3);
    }

    #[test]
    fn test_execute_propagates_malformed_input() {
        let err = execute(json!({}), &Vertical::events(), &QueryRequest::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_response_envelope() {
        let view = execute(raw(), &Vertical::events(), &QueryRequest::default()).unwrap();
        let value = serde_json::to_value(Response::ok(&view)).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["headers"]["Content-Type"], "application/json");
        assert_eq!(value["headers"]["Access-Control-Allow-Origin"], "*");
        assert_eq!(value["body"]["04/01/2024"][0]["FYEvent"], "Y");
    }
}
