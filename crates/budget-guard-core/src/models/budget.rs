//! Budget alert notification payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A budget alert as published by Cloud Billing budgets
///
/// Only `cost_amount` and `alert_threshold_exceeded` drive decisions; the rest
/// is carried for logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlertMessage {
    /// Budget name shown in the console
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub budget_display_name: Option<String>,

    /// Provider threshold indicator
    #[serde(default, deserialize_with = "deserialize_threshold_flag")]
    pub alert_threshold_exceeded: Option<f64>,

    /// Cumulative spend for the current interval
    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    pub cost_amount: Option<f64>,

    /// Start of the budget interval
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub cost_interval_start: Option<DateTime<Utc>>,

    /// Configured budget amount
    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    pub budget_amount: Option<f64>,

    /// How the budget amount is specified (e.g. `SPECIFIED_AMOUNT`)
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub budget_amount_type: Option<String>,

    /// Currency of all amounts
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub currency_code: Option<String>,
}

impl BudgetAlertMessage {
    /// Parse from an already decoded JSON value, which must be an object
    pub fn from_value(value: &Value) -> crate::error::Result<Self> {
        if !value.is_object() {
            return Err(crate::error::Error::validation(
                "budget alert must be a JSON object",
            ));
        }
        Ok(Self::deserialize(value)?)
    }

    /// Whether the provider flagged the alert threshold as exceeded
    ///
    /// Boolean `true` decodes to `1.0`; any value of `1.0` or more counts.
    pub fn threshold_exceeded(&self) -> bool {
        self.alert_threshold_exceeded
            .is_some_and(|value| value >= 1.0)
    }
}

/// Informational text fields; a value of the wrong type reads as absent.
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

/// Numbers and numeric strings are amounts; anything else reads as absent.
fn deserialize_lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn deserialize_threshold_flag<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|value| match value {
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        other => number_from_value(other),
    }))
}

fn deserialize_lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_parse_full_payload() {
        let message = BudgetAlertMessage::from_value(&json!({
            "budgetDisplayName": "stuff",
            "alertThresholdExceeded": 0.0,
            "costAmount": 6000,
            "costIntervalStart": "2019-01-01T00:00:00Z",
            "budgetAmount": 100.00,
            "budgetAmountType": "SPECIFIED_AMOUNT",
            "currencyCode": "USD"
        }))
        .unwrap();

        assert_eq!(message.budget_display_name.as_deref(), Some("stuff"));
        assert_eq!(message.cost_amount, Some(6000.0));
        assert_eq!(message.budget_amount, Some(100.0));
        assert_eq!(message.currency_code.as_deref(), Some("USD"));
        assert_eq!(
            message.cost_interval_start.map(|ts| ts.to_rfc3339()),
            Some("2019-01-01T00:00:00+00:00".to_string())
        );
        assert!(!message.threshold_exceeded());
    }

    #[test]
    fn test_empty_payload() {
        let message = BudgetAlertMessage::from_value(&json!({})).unwrap();
        assert_eq!(message, BudgetAlertMessage::default());
    }

    #[rstest]
    #[case(json!(null), None)]
    #[case(json!("12.5"), Some(12.5))]
    #[case(json!("lots"), None)]
    #[case(json!({"units": 10}), None)]
    #[case(json!(49.99), Some(49.99))]
    fn test_cost_amount_decoding(#[case] raw: Value, #[case] expected: Option<f64>) {
        let message = BudgetAlertMessage::from_value(&json!({ "costAmount": raw })).unwrap();
        assert_eq!(message.cost_amount, expected);
    }

    #[rstest]
    #[case(json!({}), false)]
    #[case(json!({"alertThresholdExceeded": 0}), false)]
    #[case(json!({"alertThresholdExceeded": 0.9}), false)]
    #[case(json!({"alertThresholdExceeded": 1}), true)]
    #[case(json!({"alertThresholdExceeded": 1.2}), true)]
    #[case(json!({"alertThresholdExceeded": 2}), true)]
    #[case(json!({"alertThresholdExceeded": "1"}), true)]
    #[case(json!({"alertThresholdExceeded": "0"}), false)]
    #[case(json!({"alertThresholdExceeded": true}), true)]
    #[case(json!({"alertThresholdExceeded": false}), false)]
    fn test_threshold_flag(#[case] payload: Value, #[case] expected: bool) {
        let message = BudgetAlertMessage::from_value(&payload).unwrap();
        assert_eq!(message.threshold_exceeded(), expected);
    }

    #[test]
    fn test_mistyped_informational_fields_are_ignored() {
        let message = BudgetAlertMessage::from_value(&json!({
            "costAmount": 6000,
            "budgetDisplayName": 42,
            "budgetAmountType": ["SPECIFIED_AMOUNT"],
            "currencyCode": null
        }))
        .unwrap();

        assert_eq!(message.cost_amount, Some(6000.0));
        assert!(message.budget_display_name.is_none());
        assert!(message.budget_amount_type.is_none());
        assert!(message.currency_code.is_none());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(BudgetAlertMessage::from_value(&json!([1, 2, 3])).is_err());
        assert!(BudgetAlertMessage::from_value(&json!("costAmount=6000")).is_err());
        assert!(BudgetAlertMessage::from_value(&Value::Null).is_err());
    }
}
