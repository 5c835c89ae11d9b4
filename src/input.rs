//! Request parsing for callers that hold loosely typed item data.
//!
//! Items arrive from an extraction step or a user edit form as JSON whose
//! quantities may be numbers or numeric strings. This layer coerces them into
//! [`LineItem`]s and rejects anything that does not coerce, so the renderer
//! only ever sees valid typed input.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{DEFAULT_UNIT_OF_ISSUE, FormHeader, LineItem};

#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    #[serde(default)]
    items: Vec<RawItem>,
    #[serde(default)]
    header: Option<RawHeader>,
}

#[derive(Debug, Default, Deserialize)]
struct RawItem {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    nsn: Option<String>,
    #[serde(default)]
    unit_of_issue: Option<String>,
    #[serde(default)]
    qty: Option<Value>,
    #[serde(default)]
    initial_qty: Option<Value>,
    #[serde(default)]
    spares_qty: Option<Value>,
    #[serde(default)]
    total_qty: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHeader {
    #[serde(default)]
    packed_by: Option<Value>,
    #[serde(default)]
    no_boxes: Option<Value>,
    #[serde(default)]
    requisition_no: Option<Value>,
    #[serde(default)]
    order_no: Option<Value>,
    #[serde(default)]
    end_item: Option<Value>,
    /// `None` when the key is absent; `Some(Value::Null)` for an explicit null.
    #[serde(default, deserialize_with = "keep_null")]
    date: Option<Value>,
    #[serde(default)]
    certifier_name: Option<Value>,
    #[serde(default)]
    certifier_title: Option<Value>,
}

/// Items and header of one form, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRequest {
    pub items: Vec<LineItem>,
    pub header: FormHeader,
}

impl FormRequest {
    /// Parses a request; a missing header date defaults to today, an explicit
    /// `null` leaves it blank.
    pub fn from_json(json: &str) -> Result<Self> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        Self::from_json_dated(json, &today)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&json)
    }

    pub(crate) fn from_json_dated(json: &str, default_date: &str) -> Result<Self> {
        let raw: RawRequest = serde_json::from_str(json)?;

        let items = raw
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| coerce_item(index, item))
            .collect::<Result<Vec<_>>>()?;

        let raw_header = raw.header.unwrap_or_default();
        let header = FormHeader {
            packed_by: text(raw_header.packed_by),
            no_boxes: text(raw_header.no_boxes),
            requisition_no: text(raw_header.requisition_no),
            order_no: text(raw_header.order_no),
            end_item: text(raw_header.end_item),
            date: match raw_header.date {
                None => Some(default_date.to_string()),
                given => text(given),
            },
            certifier_name: text(raw_header.certifier_name),
            certifier_title: text(raw_header.certifier_title),
        };

        Ok(FormRequest { items, header })
    }
}

/// Line numbers follow position; any numbering in the source is ignored.
fn coerce_item(index: usize, raw: RawItem) -> Result<LineItem> {
    let qty = quantity(index, "qty", raw.qty.as_ref())?.unwrap_or(1);
    let initial = quantity(index, "initial_qty", raw.initial_qty.as_ref())?.unwrap_or(qty);
    let spares = quantity(index, "spares_qty", raw.spares_qty.as_ref())?.unwrap_or(0);
    let total = quantity(index, "total_qty", raw.total_qty.as_ref())?
        .unwrap_or_else(|| initial.saturating_add(spares));

    let unit_of_issue = raw
        .unit_of_issue
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_UNIT_OF_ISSUE.to_string());

    Ok(LineItem {
        line_no: u32::try_from(index + 1).map_err(|_| Error::InvalidItem {
            index,
            field: "line_no",
            value: (index + 1).to_string(),
        })?,
        description: raw.description.unwrap_or_default(),
        nsn: raw.nsn,
        unit_of_issue,
        initial_qty: initial,
        spares_qty: spares,
        total_qty: total,
    })
}

/// Accepts non-negative integers, integral floats, and numeric strings.
fn quantity(index: usize, field: &'static str, value: Option<&Value>) -> Result<Option<u32>> {
    let invalid = |v: &Value| Error::InvalidItem {
        index,
        field,
        value: v.to_string(),
    };

    let Some(v) = value else {
        return Ok(None);
    };
    let n = match v {
        Value::Null => return Ok(None),
        Value::Number(num) => match num.as_u64() {
            Some(n) => n,
            None => match num.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 => f as u64,
                _ => return Err(invalid(v)),
            },
        },
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid(v))?,
        _ => return Err(invalid(v)),
    };
    u32::try_from(n).map(Some).map_err(|_| invalid(v))
}

fn keep_null<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
