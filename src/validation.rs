//! Field rules for movie payloads.
//!
//! Both entry points walk the same rule table and collect every failure
//! before returning.

use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

use crate::models::{Genre, MoviePatch, NewMovie};

const MIN_YEAR: i64 = 1900;
const MIN_RATING: f64 = 0.0;
const MAX_RATING: f64 = 10.0;

/// Pushes any failures for `value` and reports whether it passed.
type Check = fn(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> bool;

const RULES: &[(&str, Check)] = &[
    ("title", check_non_empty_string),
    ("year", check_year),
    ("director", check_non_empty_string),
    ("duration", check_duration),
    ("poster", check_poster),
    ("genre", check_genre),
    ("rating", check_rating),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "invalid movie payload ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Full-create validation: every field must be present and valid.
pub fn validate_movie(payload: &Value) -> Result<NewMovie, ValidationErrors> {
    let object = expect_object(payload)?;
    let mut errors = Vec::new();
    let mut accepted = Map::new();
    for (field, check) in RULES {
        match object.get(*field) {
            Some(value) => {
                if check(*field, value, &mut errors) {
                    accepted.insert(field.to_string(), value.clone());
                }
            }
            None => errors.push(FieldError::new(*field, "is required")),
        }
    }
    finish(errors, accepted)
}

/// Partial validation: only present fields are checked, but at least one
/// recognised field is required.
pub fn validate_partial_movie(payload: &Value) -> Result<MoviePatch, ValidationErrors> {
    let object = expect_object(payload)?;
    let mut errors = Vec::new();
    let mut accepted = Map::new();
    let mut seen = 0;
    for (field, check) in RULES {
        if let Some(value) = object.get(*field) {
            seen += 1;
            if check(*field, value, &mut errors) {
                accepted.insert(field.to_string(), value.clone());
            }
        }
    }
    if seen == 0 {
        let names: Vec<&str> = RULES.iter().map(|(name, _)| *name).collect();
        return Err(ValidationErrors::single(
            "body",
            format!("must contain at least one of: {}", names.join(", ")),
        ));
    }
    finish(errors, accepted)
}

pub fn max_year() -> i64 {
    i64::from(Utc::now().year()) + 1
}

fn expect_object(payload: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    payload
        .as_object()
        .ok_or_else(|| ValidationErrors::single("body", "must be a JSON object"))
}

fn finish<T: DeserializeOwned>(
    errors: Vec<FieldError>,
    accepted: Map<String, Value>,
) -> Result<T, ValidationErrors> {
    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }
    serde_json::from_value(Value::Object(accepted))
        .map_err(|e| ValidationErrors::single("body", e.to_string()))
}

fn check_non_empty_string(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> bool {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => true,
        Some(_) => {
            errors.push(FieldError::new(field, "must not be empty"));
            false
        }
        None => {
            errors.push(FieldError::new(field, "must be a string"));
            false
        }
    }
}

fn integer(value: &Value) -> Result<i64, &'static str> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    if value.as_u64().is_some() {
        return Err("is out of range");
    }
    Err("must be an integer")
}

fn check_year(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> bool {
    let max = max_year();
    match integer(value) {
        Ok(year) if (MIN_YEAR..=max).contains(&year) => true,
        Ok(_) => {
            errors.push(FieldError::new(
                field,
                format!("must be between {} and {}", MIN_YEAR, max),
            ));
            false
        }
        Err(msg) => {
            errors.push(FieldError::new(field, msg));
            false
        }
    }
}

fn check_duration(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> bool {
    match integer(value) {
        Ok(minutes) if minutes > 0 && minutes <= i64::from(u32::MAX) => true,
        Ok(minutes) if minutes > 0 => {
            errors.push(FieldError::new(field, "is out of range"));
            false
        }
        Ok(_) => {
            errors.push(FieldError::new(field, "must be a positive integer"));
            false
        }
        Err(msg) => {
            errors.push(FieldError::new(field, msg));
            false
        }
    }
}

fn check_rating(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> bool {
    match value.as_f64() {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => true,
        Some(_) => {
            errors.push(FieldError::new(
                field,
                format!("must be between {} and {}", MIN_RATING, MAX_RATING),
            ));
            false
        }
        None => {
            errors.push(FieldError::new(field, "must be a number"));
            false
        }
    }
}

fn check_poster(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> bool {
    let Some(raw) = value.as_str() else {
        errors.push(FieldError::new(field, "must be a string"));
        return false;
    };
    let valid = Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false);
    if !valid {
        errors.push(FieldError::new(field, "must be a valid http(s) URL"));
    }
    valid
}

fn check_genre(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> bool {
    let Some(entries) = value.as_array() else {
        errors.push(FieldError::new(field, "must be an array of genres"));
        return false;
    };
    if entries.is_empty() {
        errors.push(FieldError::new(field, "must contain at least one genre"));
        return false;
    }
    let before = errors.len();
    for (idx, entry) in entries.iter().enumerate() {
        let known = entry
            .as_str()
            .map(|s| s.parse::<Genre>().is_ok())
            .unwrap_or(false);
        if !known {
            let allowed: Vec<&str> = Genre::ALL.iter().map(|g| g.as_str()).collect();
            errors.push(FieldError::new(
                format!("{}[{}]", field, idx),
                format!("must be one of: {}", allowed.join(", ")),
            ));
        }
    }
    errors.len() == before
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "title": "Inception",
            "year": 2010,
            "director": "Christopher Nolan",
            "duration": 148,
            "poster": "https://m.media-amazon.com/images/I/91Rc8cAmnAL._AC_UF1000,1000_QL80_.jpg",
            "genre": ["Action", "Adventure", "Sci-Fi"],
            "rating": 8.8
        })
    }

    #[test]
    fn accepts_complete_payload() {
        let movie = validate_movie(&valid_payload()).unwrap();
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.year, 2010);
        assert_eq!(movie.duration, 148);
        assert_eq!(movie.genre, vec![Genre::Action, Genre::Adventure, Genre::SciFi]);
        assert_eq!(movie.rating, 8.8);
    }

    #[test]
    fn reports_every_failing_field_at_once() {
        let mut payload = valid_payload();
        payload["title"] = json!("");
        payload["year"] = json!(1800);
        let err = validate_movie(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["title", "year"]);
    }

    #[test]
    fn missing_fields_are_each_required() {
        let err = validate_movie(&json!({ "title": "Only a title" })).unwrap_err();
        assert_eq!(
            err.fields(),
            vec!["year", "director", "duration", "poster", "genre", "rating"]
        );
        assert!(err.0.iter().all(|e| e.message == "is required"));
    }

    #[test]
    fn rejects_non_object_body() {
        let err = validate_movie(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.fields(), vec!["body"]);
        let err = validate_partial_movie(&json!("text")).unwrap_err();
        assert_eq!(err.fields(), vec!["body"]);
    }

    #[test]
    fn year_bounds_follow_current_year() {
        let mut payload = valid_payload();
        payload["year"] = json!(max_year());
        assert!(validate_movie(&payload).is_ok());
        payload["year"] = json!(max_year() + 1);
        assert_eq!(validate_movie(&payload).unwrap_err().fields(), vec!["year"]);
        payload["year"] = json!(1900);
        assert!(validate_movie(&payload).is_ok());
        payload["year"] = json!(2010.5);
        let err = validate_movie(&payload).unwrap_err();
        assert_eq!(err.0[0].message, "must be an integer");
    }

    #[test]
    fn duration_must_be_positive_integer() {
        for bad in [json!(0), json!(-5), json!(90.5), json!("120")] {
            let mut payload = valid_payload();
            payload["duration"] = bad;
            assert_eq!(
                validate_movie(&payload).unwrap_err().fields(),
                vec!["duration"]
            );
        }
    }

    #[test]
    fn rating_range_is_inclusive() {
        for ok in [json!(0), json!(10), json!(5.5)] {
            let mut payload = valid_payload();
            payload["rating"] = ok;
            assert!(validate_movie(&payload).is_ok());
        }
        for bad in [json!(-0.1), json!(10.1), json!(null), json!("9")] {
            let mut payload = valid_payload();
            payload["rating"] = bad;
            assert_eq!(validate_movie(&payload).unwrap_err().fields(), vec!["rating"]);
        }
    }

    #[test]
    fn poster_must_be_http_url() {
        for bad in ["not a url", "ftp://example.com/p.jpg", "", "mailto:a@b.c"] {
            let mut payload = valid_payload();
            payload["poster"] = json!(bad);
            assert_eq!(validate_movie(&payload).unwrap_err().fields(), vec!["poster"]);
        }
    }

    #[test]
    fn genre_entries_are_checked_individually() {
        let mut payload = valid_payload();
        payload["genre"] = json!(["Drama", "Western", 7]);
        let err = validate_movie(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["genre[1]", "genre[2]"]);

        payload["genre"] = json!([]);
        assert_eq!(validate_movie(&payload).unwrap_err().fields(), vec!["genre"]);

        payload["genre"] = json!("Drama");
        assert_eq!(validate_movie(&payload).unwrap_err().fields(), vec!["genre"]);

        payload["genre"] = json!(["drama"]);
        assert_eq!(
            validate_movie(&payload).unwrap_err().fields(),
            vec!["genre[0]"]
        );
    }

    #[test]
    fn unknown_keys_and_client_ids_are_dropped() {
        let mut payload = valid_payload();
        payload["id"] = json!("client-chosen");
        payload["studio"] = json!("Warner");
        assert!(validate_movie(&payload).is_ok());

        let patch = validate_partial_movie(&json!({ "id": "x", "rating": 9 })).unwrap();
        assert_eq!(
            patch,
            MoviePatch {
                rating: Some(9.0),
                ..MoviePatch::default()
            }
        );
    }

    #[test]
    fn partial_requires_a_recognised_field() {
        let err = validate_partial_movie(&json!({})).unwrap_err();
        assert_eq!(err.fields(), vec!["body"]);
        let err = validate_partial_movie(&json!({ "studio": "Warner" })).unwrap_err();
        assert_eq!(err.fields(), vec!["body"]);
    }

    #[test]
    fn partial_validates_only_present_fields() {
        let patch = validate_partial_movie(&json!({ "title": "Renamed" })).unwrap();
        assert_eq!(patch.title.as_deref(), Some("Renamed"));
        assert!(patch.year.is_none());

        let err = validate_partial_movie(&json!({ "title": " ", "rating": 11 })).unwrap_err();
        assert_eq!(err.fields(), vec!["title", "rating"]);

        let err = validate_partial_movie(&json!({ "director": null })).unwrap_err();
        assert_eq!(err.fields(), vec!["director"]);
    }

    #[test]
    fn display_lists_all_fields() {
        let err = ValidationErrors(vec![
            FieldError::new("title", "must not be empty"),
            FieldError::new("year", "must be between 1900 and 2027"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid movie payload (title: must not be empty; year: must be between 1900 and 2027)"
        );
    }
}
