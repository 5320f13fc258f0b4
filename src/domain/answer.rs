//! Type-tagged answer values.
//!
//! Every stored answer carries the field type it was captured for, so it can be
//! displayed and exported even after the form has been replaced.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::form::{Field, FieldType};

/// Decoded answer, stored as `{"type": ..., "value": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum AnswerValue {
    Text(String),
    Textarea(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Select(String),
    Radio(String),
    Checkbox(Vec<String>),
}

/// Raw input that does not fit its field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerError {
    pub field_id: Uuid,
    pub label: String,
    pub message: String,
}

impl std::fmt::Display for AnswerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' {}", self.label, self.message)
    }
}

impl AnswerValue {
    /// Decode raw input for `field`.
    ///
    /// Blank input (null, whitespace, empty list) decodes to `None`.
    pub fn decode(field: &Field, raw: &Value) -> Result<Option<Self>, AnswerError> {
        let fail = |message: &str| AnswerError {
            field_id: field.id,
            label: field.label.clone(),
            message: message.to_string(),
        };

        if raw.is_null() {
            return Ok(None);
        }

        let value = match field.field_type {
            FieldType::Text | FieldType::Textarea => {
                let text = raw.as_str().ok_or_else(|| fail("expects text"))?;
                if text.trim().is_empty() {
                    return Ok(None);
                }
                if field.field_type == FieldType::Text {
                    AnswerValue::Text(text.to_string())
                } else {
                    AnswerValue::Textarea(text.to_string())
                }
            }
            FieldType::Number => {
                let number = match raw {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) if s.trim().is_empty() => return Ok(None),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                match number {
                    Some(n) if n.is_finite() => AnswerValue::Number(n),
                    _ => return Err(fail("expects a number")),
                }
            }
            FieldType::Boolean => {
                AnswerValue::Boolean(raw.as_bool().ok_or_else(|| fail("expects true or false"))?)
            }
            FieldType::Date => {
                let text = raw.as_str().ok_or_else(|| fail("expects a date"))?.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                AnswerValue::Date(parse_date(text).ok_or_else(|| fail("expects a YYYY-MM-DD date"))?)
            }
            FieldType::Select | FieldType::Radio => {
                let text = raw.as_str().ok_or_else(|| fail("expects one option"))?.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                let option = field
                    .options
                    .iter()
                    .find(|o| o.as_str() == text)
                    .ok_or_else(|| fail("is not one of the available options"))?
                    .clone();
                if field.field_type == FieldType::Select {
                    AnswerValue::Select(option)
                } else {
                    AnswerValue::Radio(option)
                }
            }
            FieldType::Checkbox => {
                let items = raw.as_array().ok_or_else(|| fail("expects a list of options"))?;
                if items.is_empty() {
                    return Ok(None);
                }
                let mut chosen = Vec::with_capacity(items.len());
                for item in items {
                    let text = item.as_str().ok_or_else(|| fail("expects a list of options"))?.trim();
                    if !field.options.iter().any(|o| o == text) {
                        return Err(fail("contains an option that is not available"));
                    }
                    if chosen.contains(&text) {
                        return Err(fail("repeats an option"));
                    }
                    chosen.push(text);
                }
                // canonical order is the field's option order
                AnswerValue::Checkbox(
                    field
                        .options
                        .iter()
                        .filter(|o| chosen.contains(&o.as_str()))
                        .cloned()
                        .collect(),
                )
            }
        };

        Ok(Some(value))
    }

    /// Field type this answer was captured for
    pub fn field_type(&self) -> FieldType {
        match self {
            AnswerValue::Text(_) => FieldType::Text,
            AnswerValue::Textarea(_) => FieldType::Textarea,
            AnswerValue::Number(_) => FieldType::Number,
            AnswerValue::Boolean(_) => FieldType::Boolean,
            AnswerValue::Date(_) => FieldType::Date,
            AnswerValue::Select(_) => FieldType::Select,
            AnswerValue::Radio(_) => FieldType::Radio,
            AnswerValue::Checkbox(_) => FieldType::Checkbox,
        }
    }

    /// Untagged JSON value as a client would send it
    pub fn raw(&self) -> Value {
        match self {
            AnswerValue::Text(s)
            | AnswerValue::Textarea(s)
            | AnswerValue::Select(s)
            | AnswerValue::Radio(s) => Value::String(s.clone()),
            AnswerValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AnswerValue::Boolean(b) => Value::Bool(*b),
            AnswerValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            AnswerValue::Checkbox(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Human readable rendering for listings and exports
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(s)
            | AnswerValue::Textarea(s)
            | AnswerValue::Select(s)
            | AnswerValue::Radio(s) => s.clone(),
            AnswerValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            AnswerValue::Boolean(true) => "Yes".to_string(),
            AnswerValue::Boolean(false) => "No".to_string(),
            AnswerValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            AnswerValue::Checkbox(items) => items.join(", "),
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(field_type: FieldType, options: &[&str]) -> Field {
        Field {
            id: Uuid::new_v4(),
            label: "Question".to_string(),
            field_type,
            required: false,
            order: 1,
            placeholder: None,
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn test_blank_input_is_absent() {
        let text = field(FieldType::Text, &[]);
        assert_eq!(AnswerValue::decode(&text, &json!(null)).unwrap(), None);
        assert_eq!(AnswerValue::decode(&text, &json!("   ")).unwrap(), None);

        let checks = field(FieldType::Checkbox, &["A"]);
        assert_eq!(AnswerValue::decode(&checks, &json!([])).unwrap(), None);
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        let number = field(FieldType::Number, &[]);

        let value = AnswerValue::decode(&number, &json!(" 42 ")).unwrap().unwrap();
        assert_eq!(value, AnswerValue::Number(42.0));
        assert_eq!(value.display(), "42");

        let value = AnswerValue::decode(&number, &json!(2.5)).unwrap().unwrap();
        assert_eq!(value.display(), "2.5");

        assert!(AnswerValue::decode(&number, &json!("forty")).is_err());
        assert!(AnswerValue::decode(&number, &json!(true)).is_err());
    }

    #[test]
    fn test_boolean_display() {
        let flag = field(FieldType::Boolean, &[]);
        let value = AnswerValue::decode(&flag, &json!(false)).unwrap().unwrap();
        assert_eq!(value.display(), "No");
        assert!(AnswerValue::decode(&flag, &json!("yes")).is_err());
    }

    #[test]
    fn test_date_accepts_timestamps() {
        let date = field(FieldType::Date, &[]);
        let plain = AnswerValue::decode(&date, &json!("2024-03-01")).unwrap().unwrap();
        let stamped = AnswerValue::decode(&date, &json!("2024-03-01T10:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(plain, stamped);
        assert_eq!(plain.display(), "2024-03-01");
        assert!(AnswerValue::decode(&date, &json!("03/01/2024")).is_err());
    }

    #[test]
    fn test_choice_must_be_an_option() {
        let radio = field(FieldType::Radio, &["Yes", "No"]);
        assert_eq!(
            AnswerValue::decode(&radio, &json!("No")).unwrap(),
            Some(AnswerValue::Radio("No".into()))
        );
        let err = AnswerValue::decode(&radio, &json!("Maybe")).unwrap_err();
        assert!(err.to_string().contains("Question"));
    }

    #[test]
    fn test_checkbox_canonical_order() {
        let checks = field(FieldType::Checkbox, &["A", "B", "C"]);
        let value = AnswerValue::decode(&checks, &json!(["C", "A"])).unwrap().unwrap();

        assert_eq!(value, AnswerValue::Checkbox(vec!["A".into(), "C".into()]));
        assert_eq!(value.display(), "A, C");
        assert_eq!(value.raw(), json!(["A", "C"]));
        assert!(AnswerValue::decode(&checks, &json!(["A", "A"])).is_err());
        assert!(AnswerValue::decode(&checks, &json!(["D"])).is_err());
    }

    #[test]
    fn test_stored_payload_is_tagged() {
        let stored = serde_json::to_value(AnswerValue::Checkbox(vec!["A".into()])).unwrap();
        assert_eq!(stored, json!({"type": "CHECKBOX", "value": ["A"]}));

        let restored: AnswerValue = serde_json::from_value(stored).unwrap();
        assert_eq!(restored.field_type(), FieldType::Checkbox);

        let date: AnswerValue =
            serde_json::from_value(json!({"type": "DATE", "value": "2024-01-31"})).unwrap();
        assert_eq!(date.display(), "2024-01-31");
    }
}
