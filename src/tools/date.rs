//! Day-offset date tool.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use crate::error::{MnemoError, Result};
use crate::tool::{Tool, ToolOutput};

/// `now + days`, formatted `YYYY-MM-DD`. The base is always UTC so the
/// result does not depend on the host timezone.
pub fn offset_date(days: i64, now: DateTime<Utc>) -> Result<String> {
    let offset = Duration::try_days(days)
        .ok_or_else(|| MnemoError::InvalidInput(format!("day offset {days} out of range")))?;
    let date = now
        .date_naive()
        .checked_add_signed(offset)
        .ok_or_else(|| MnemoError::InvalidInput(format!("day offset {days} out of range")))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

pub fn date_after(days: i64) -> Result<String> {
    offset_date(days, Utc::now())
}

pub struct DateUtilityTool;

#[async_trait]
impl Tool for DateUtilityTool {
    fn name(&self) -> &str {
        "date_utility"
    }

    fn description(&self) -> &str {
        "Compute the date N days from today (UTC). Expects {\"days\": integer}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": "Number of days to add; negative values compute a past date"
                }
            },
            "required": ["days"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let output = match input.get("days").and_then(Value::as_i64) {
            Some(days) => match date_after(days) {
                Ok(date) => ToolOutput::DateString { date },
                Err(err) => ToolOutput::Error {
                    message: format!("Date Error: {err}"),
                },
            },
            None => ToolOutput::Error {
                message: "Date Error: `days` must be an integer".to_string(),
            },
        };
        Ok(output.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn offsets_forward_and_backward() {
        assert_eq!(offset_date(0, fixed_now()).unwrap(), "2024-03-01");
        assert_eq!(offset_date(45, fixed_now()).unwrap(), "2024-04-15");
        assert_eq!(offset_date(-1, fixed_now()).unwrap(), "2024-02-29");
    }

    #[test]
    fn positive_and_negative_offsets_are_symmetric() {
        for days in [1, 7, 30, 365] {
            let forward = offset_date(days, fixed_now()).unwrap();
            let back = offset_date(-days, fixed_now()).unwrap();
            let today = fixed_now().date_naive();
            let parsed_forward =
                chrono::NaiveDate::parse_from_str(&forward, "%Y-%m-%d").unwrap();
            let parsed_back = chrono::NaiveDate::parse_from_str(&back, "%Y-%m-%d").unwrap();
            assert_eq!(parsed_forward - today, today - parsed_back);
        }
    }

    #[test]
    fn absurd_offsets_are_invalid_input() {
        assert!(matches!(
            offset_date(i64::MAX, fixed_now()),
            Err(MnemoError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn tool_rejects_non_integer_days() {
        let tool = DateUtilityTool;

        let value = tool.call(json!({"days": 1.5})).await.unwrap();
        assert_eq!(value["kind"], "error");
        assert_eq!(value["display"], "Date Error: `days` must be an integer");

        let value = tool.call(json!({"days": "soon"})).await.unwrap();
        assert_eq!(value["kind"], "error");
    }

    #[tokio::test]
    async fn tool_returns_a_formatted_date() {
        let tool = DateUtilityTool;
        let value = tool.call(json!({"days": 0})).await.unwrap();
        let date = value["date"].as_str().unwrap();
        assert!(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
    }
}
