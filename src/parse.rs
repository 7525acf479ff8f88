use chrono::NaiveDate;

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Parsed(T),
    Missing,
    Invalid(String),
}

impl<T> FieldValue<T> {
    pub fn or_default(self) -> T
    where
        T: Default,
    {
        match self {
            FieldValue::Parsed(v) => v,
            FieldValue::Missing | FieldValue::Invalid(_) => T::default(),
        }
    }

    pub fn required(self, field: &'static str) -> Result<T> {
        match self {
            FieldValue::Parsed(v) => Ok(v),
            FieldValue::Missing => Err(IngestError::extraction(field, "")),
            FieldValue::Invalid(raw) => Err(IngestError::extraction(field, raw)),
        }
    }
}

pub fn parse_int(raw: Option<&str>) -> FieldValue<i64> {
    let Some(raw) = raw else {
        return FieldValue::Missing;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Missing;
    }
    // Source tables group thousands ("1,234").
    let cleaned = trimmed.replace(',', "");
    match cleaned.parse::<i64>() {
        Ok(v) => FieldValue::Parsed(v),
        Err(_) => FieldValue::Invalid(raw.to_string()),
    }
}

pub fn parse_decimal(raw: Option<&str>) -> FieldValue<f64> {
    let Some(raw) = raw else {
        return FieldValue::Missing;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => FieldValue::Parsed(v),
        _ => FieldValue::Invalid(raw.to_string()),
    }
}

/// Goal cells may carry decorations such as "(3)" or "*"; only digits count.
pub fn parse_goals(raw: &str) -> FieldValue<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return if raw.trim().is_empty() {
            FieldValue::Missing
        } else {
            FieldValue::Invalid(raw.to_string())
        };
    }
    match digits.parse::<u32>() {
        Ok(v) => FieldValue::Parsed(v),
        Err(_) => FieldValue::Invalid(raw.to_string()),
    }
}

pub fn parse_match_date(raw: &str) -> FieldValue<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Missing;
    }
    let parsed = if trimmed.len() == 8 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        NaiveDate::parse_from_str(trimmed, "%Y%m%d")
    } else {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    };
    match parsed {
        Ok(date) => FieldValue::Parsed(date),
        Err(_) => FieldValue::Invalid(raw.to_string()),
    }
}

pub fn squad_id_from_link(link: &str) -> Option<String> {
    let (_, rest) = link.split_once("/squads/")?;
    let id = rest.split(['/', '?', '#']).next()?.trim();
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}
