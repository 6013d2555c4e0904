//! Student record types
//!
//! Field names on the wire (CSV header and JSON keys) follow the column
//! names of the store: `RollNo`, `Name`, `English`, `Maths`, `Science`.
//! Marks are kept as the text that was submitted and only parsed when an
//! average is needed.

use crate::error::RecordError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// CSV header, in column order
pub const CSV_HEADER: [&str; 5] = ["RollNo", "Name", "English", "Maths", "Science"];

/// Subjects a student is marked on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    English,
    Maths,
    Science,
}

impl Subject {
    /// Column name
    pub fn name(&self) -> &'static str {
        match self {
            Subject::English => "English",
            Subject::Maths => "Maths",
            Subject::Science => "Science",
        }
    }
}

/// One row of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Unique key
    #[serde(rename = "RollNo")]
    pub roll_no: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "English")]
    pub english: String,

    #[serde(rename = "Maths")]
    pub maths: String,

    #[serde(rename = "Science")]
    pub science: String,
}

/// Parsed marks of one student
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marks {
    pub english: f64,
    pub maths: f64,
    pub science: f64,
}

impl Marks {
    /// Arithmetic mean of the three marks
    pub fn mean(&self) -> f64 {
        (self.english + self.maths + self.science) / 3.0
    }
}

impl StudentRecord {
    /// Build a record from submitted form fields
    ///
    /// Returns `None` unless every column is present.
    pub fn from_form(form: &HashMap<String, String>) -> Option<Self> {
        let field = |key: &str| form.get(key).cloned();

        Some(Self {
            roll_no: field("RollNo")?,
            name: field("Name")?,
            english: field("English")?,
            maths: field("Maths")?,
            science: field("Science")?,
        })
    }

    /// Raw text of a mark
    pub fn mark(&self, subject: Subject) -> &str {
        match subject {
            Subject::English => &self.english,
            Subject::Maths => &self.maths,
            Subject::Science => &self.science,
        }
    }

    /// Parse all marks
    pub fn marks(&self) -> Result<Marks, RecordError> {
        Ok(Marks {
            english: self.parse_mark(Subject::English)?,
            maths: self.parse_mark(Subject::Maths)?,
            science: self.parse_mark(Subject::Science)?,
        })
    }

    fn parse_mark(&self, subject: Subject) -> Result<f64, RecordError> {
        let value = self.mark(subject);
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| RecordError::InvalidMark {
                roll_no: self.roll_no.clone(),
                subject: subject.name(),
                value: value.to_string(),
            })
    }

    /// Overwrite the fields present in `update`
    pub fn apply(&mut self, update: &StudentUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(english) = &update.english {
            self.english = english.clone();
        }
        if let Some(maths) = &update.maths {
            self.maths = maths.clone();
        }
        if let Some(science) = &update.science {
            self.science = science.clone();
        }
    }
}

/// Partial record used by update requests
///
/// `RollNo` selects the record; any other field that is present replaces
/// the stored value.
///
/// JSON clients may send marks (and RollNo) as numbers; they are stored as
/// their text form, e.g. `95` becomes `"95"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(rename = "RollNo", deserialize_with = "text")]
    pub roll_no: String,

    #[serde(
        rename = "Name",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    #[serde(
        rename = "English",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub english: Option<String>,

    #[serde(
        rename = "Maths",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub maths: Option<String>,

    #[serde(
        rename = "Science",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub science: Option<String>,
}

fn value_to_text<E: serde::de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

/// A string or number, kept as text
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    value_to_text(Value::deserialize(deserializer)?)
}

/// Like `text`, with `null` read as not supplied
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_to_text(value).map(Some),
    }
}

impl StudentUpdate {
    /// Build an update from submitted form fields
    ///
    /// Blank fields are treated as not supplied. Returns `None` if `RollNo`
    /// is missing or blank.
    pub fn from_form(form: &HashMap<String, String>) -> Option<Self> {
        let field = |key: &str| {
            form.get(key)
                .filter(|value| !value.trim().is_empty())
                .cloned()
        };

        Some(Self {
            roll_no: field("RollNo")?,
            name: field("Name"),
            english: field("English"),
            maths: field("Maths"),
            science: field("Science"),
        })
    }
}
