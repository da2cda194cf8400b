use chrono::NaiveDate;
use huntbook_core::{GuideDirectory, NewBooking};
use serde_json::{Map, Value};

use crate::error::AppError;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MIN_PARTICIPANTS: i64 = 1;
pub const MAX_PARTICIPANTS: i64 = 10;

/// Field errors in the order the fields were checked.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    fields: Vec<(&'static str, Vec<String>)>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field, vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| *name == field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, messages)| messages.as_slice())
            .unwrap_or_default()
    }

    /// First message, noting how many more follow.
    pub fn summary(&self) -> String {
        let mut all = self.fields.iter().flat_map(|(_, messages)| messages);
        let Some(first) = all.next() else {
            return "The given data was invalid.".to_string();
        };
        match all.count() {
            0 => first.clone(),
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(field, messages)| (field.to_string(), Value::from(messages.clone())))
            .collect();
        Value::Object(map)
    }
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Present, non-null and not an empty string after trimming.
fn filled<'a>(payload: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    match payload.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

fn required<'a>(
    payload: &'a Map<String, Value>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<&'a Value> {
    let value = filled(payload, field);
    if value.is_none() {
        errors.add(field, format!("The {} field is required.", label(field)));
    }
    value
}

fn name_field(
    payload: &Map<String, Value>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = required(payload, field, errors)?;
    let Some(text) = value.as_str() else {
        errors.add(field, format!("The {} field must be a string.", label(field)));
        return None;
    };
    let text = text.trim();
    if text.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            field,
            format!(
                "The {} field must not be greater than {} characters.",
                label(field),
                MAX_NAME_LENGTH
            ),
        );
        return None;
    }
    Some(text.to_string())
}

fn integer_field(
    payload: &Map<String, Value>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let value = required(payload, field, errors)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, format!("The {} field must be an integer.", label(field)));
    }
    parsed
}

fn date_field(
    payload: &Map<String, Value>,
    today: NaiveDate,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let value = required(payload, "date", errors)?;
    let Some(date) = value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    else {
        errors.add("date", "The date field must be a valid date.");
        return None;
    };
    if date < today {
        errors.add("date", "Booking date cannot be in the past.");
        return None;
    }
    Some(date)
}

fn participants_field(payload: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<i32> {
    let count = integer_field(payload, "participants_count", errors)?;
    if count < MIN_PARTICIPANTS {
        errors.add(
            "participants_count",
            format!("The participants count field must be at least {MIN_PARTICIPANTS}."),
        );
        return None;
    }
    if count > MAX_PARTICIPANTS {
        errors.add(
            "participants_count",
            format!("Maximum {MAX_PARTICIPANTS} participants are allowed per tour."),
        );
        return None;
    }
    i32::try_from(count).ok()
}

/// Check the shape of a booking request. Anything that is not a JSON object is
/// treated as an empty one.
pub fn check_shape(payload: &Value, today: NaiveDate) -> Result<NewBooking, ValidationErrors> {
    let empty = Map::new();
    let payload = payload.as_object().unwrap_or(&empty);
    let mut errors = ValidationErrors::default();

    let tour_name = name_field(payload, "tour_name", &mut errors);
    let hunter_name = name_field(payload, "hunter_name", &mut errors);
    let guide_id = integer_field(payload, "guide_id", &mut errors);
    let date = date_field(payload, today, &mut errors);
    let participants_count = participants_field(payload, &mut errors);

    match (tour_name, hunter_name, guide_id, date, participants_count) {
        (Some(tour_name), Some(hunter_name), Some(guide_id), Some(date), Some(participants_count))
            if errors.is_empty() =>
        {
            Ok(NewBooking {
                tour_name,
                hunter_name,
                guide_id,
                date,
                participants_count,
            })
        }
        _ => Err(errors),
    }
}

/// Full request validation: shape checks plus the guide existence lookup.
pub async fn validate_booking(
    payload: &Value,
    today: NaiveDate,
    guides: &dyn GuideDirectory,
) -> Result<NewBooking, AppError> {
    let shaped = check_shape(payload, today);

    let guide_id = match &shaped {
        Ok(input) => Some(input.guide_id),
        Err(errors) if !errors.has("guide_id") => payload
            .get("guide_id")
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))),
        Err(_) => None,
    };

    let mut unknown_guide = false;
    if let Some(guide_id) = guide_id {
        unknown_guide = guides.find(guide_id).await?.is_none();
    }

    match shaped {
        Ok(input) if !unknown_guide => Ok(input),
        Ok(_) => {
            let mut errors = ValidationErrors::default();
            errors.add("guide_id", "The selected guide id is invalid.");
            Err(AppError::Validation(errors))
        }
        Err(mut errors) => {
            if unknown_guide {
                errors.add("guide_id", "The selected guide id is invalid.");
            }
            Err(AppError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2031, 5, 10).unwrap()
    }

    fn valid_payload() -> Value {
        json!({
            "tour_name": "Deer Hunting Tour",
            "hunter_name": "John Doe",
            "guide_id": 1,
            "date": "2031-05-15",
            "participants_count": 5,
        })
    }

    fn errors_for(payload: Value) -> ValidationErrors {
        check_shape(&payload, today()).unwrap_err()
    }

    #[test]
    fn test_valid_payload_passes() {
        let input = check_shape(&valid_payload(), today()).unwrap();
        assert_eq!(input.tour_name, "Deer Hunting Tour");
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2031, 5, 15).unwrap());
        assert_eq!(input.participants_count, 5);
    }

    #[test]
    fn test_empty_payload_requires_every_field() {
        let errors = errors_for(json!({}));
        for field in ["tour_name", "hunter_name", "guide_id", "date", "participants_count"] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert_eq!(errors.messages("tour_name"), ["The tour name field is required."]);
        assert_eq!(
            errors.summary(),
            "The tour name field is required. (and 4 more errors)"
        );
    }

    #[test]
    fn test_non_object_body_is_treated_as_empty() {
        let errors = errors_for(json!([1, 2, 3]));
        assert!(errors.has("participants_count"));
    }

    #[test]
    fn test_participant_bounds() {
        let mut payload = valid_payload();
        payload["participants_count"] = json!(10);
        assert!(check_shape(&payload, today()).is_ok());

        payload["participants_count"] = json!(11);
        let errors = errors_for(payload.clone());
        assert_eq!(
            errors.messages("participants_count"),
            ["Maximum 10 participants are allowed per tour."]
        );

        payload["participants_count"] = json!(0);
        let errors = errors_for(payload);
        assert_eq!(
            errors.messages("participants_count"),
            ["The participants count field must be at least 1."]
        );
    }

    #[test]
    fn test_past_date_is_rejected_but_today_is_allowed() {
        let mut payload = valid_payload();
        payload["date"] = json!("2031-05-09");
        let errors = errors_for(payload.clone());
        assert_eq!(errors.messages("date"), ["Booking date cannot be in the past."]);
        assert_eq!(errors.summary(), "Booking date cannot be in the past.");

        payload["date"] = json!("2031-05-10");
        assert!(check_shape(&payload, today()).is_ok());
    }

    #[test]
    fn test_malformed_values() {
        let mut payload = valid_payload();
        payload["date"] = json!("15/05/2031");
        payload["guide_id"] = json!("abc");
        payload["tour_name"] = json!(42);
        let errors = errors_for(payload);

        assert_eq!(errors.messages("date"), ["The date field must be a valid date."]);
        assert_eq!(errors.messages("guide_id"), ["The guide id field must be an integer."]);
        assert_eq!(errors.messages("tour_name"), ["The tour name field must be a string."]);
    }

    #[test]
    fn test_name_length_limit() {
        let mut payload = valid_payload();
        payload["hunter_name"] = json!("x".repeat(255));
        assert!(check_shape(&payload, today()).is_ok());

        payload["hunter_name"] = json!("x".repeat(256));
        let errors = errors_for(payload);
        assert_eq!(
            errors.messages("hunter_name"),
            ["The hunter name field must not be greater than 255 characters."]
        );
    }

    #[test]
    fn test_numeric_strings_are_accepted_as_integers() {
        let mut payload = valid_payload();
        payload["guide_id"] = json!("1");
        payload["participants_count"] = json!(" 3 ");
        let input = check_shape(&payload, today()).unwrap();
        assert_eq!(input.guide_id, 1);
        assert_eq!(input.participants_count, 3);
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let mut payload = valid_payload();
        payload["tour_name"] = json!("   ");
        let errors = errors_for(payload);
        assert_eq!(errors.messages("tour_name"), ["The tour name field is required."]);
    }
}
