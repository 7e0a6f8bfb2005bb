//! Bill records as returned by the statistics page endpoint.
//!
//! The portal returns a lot of fields per bill; only `id` and `actualMoney` drive the
//! refund decision. Everything else is kept in `extra` so it can be logged untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One page of the bill query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPage {
    /// Informational; `null` reads as 0.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_count: u64,

    /// `null` or a missing key both mean "no bills". Entries that are not objects become
    /// empty bills so they are skipped one by one instead of failing the page.
    #[serde(default, deserialize_with = "lenient_bills")]
    pub data: Vec<Bill>,
}

impl BillPage {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when the remote side reports more bills than this page carries.
    pub fn is_truncated(&self) -> bool {
        self.total_count > self.data.len() as u64
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_bills<'de, D>(deserializer: D) -> Result<Vec<Bill>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|v| match v {
            Value::Object(_) => serde_json::from_value::<Bill>(v).unwrap_or_default(),
            _ => Bill::default(),
        })
        .collect())
}

/// A single bill. `id` and `actualMoney` are kept as raw JSON so that malformed
/// records can be skipped instead of failing the whole page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(rename = "actualMoney", default)]
    pub actual_money: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bill that passed the eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundCandidate {
    pub bill_id: i64,
    pub amount: i64,
}

/// Why a bill record is not refunded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillError {
    #[error("bill has no id")]
    MissingId,
    #[error("bill id is not a positive integer: {0}")]
    InvalidId(String),
    #[error("bill {0} has no amount")]
    MissingAmount(i64),
    #[error("bill {0} has a zero amount")]
    ZeroAmount(i64),
    #[error("bill {bill_id} has a negative amount: {amount}")]
    NegativeAmount { bill_id: i64, amount: i64 },
    #[error("bill {bill_id} has a non-numeric amount: {raw}")]
    InvalidAmount { bill_id: i64, raw: String },
}

impl Bill {
    pub fn new(id: impl Into<Value>, actual_money: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            actual_money: Some(actual_money.into()),
            extra: Map::new(),
        }
    }

    /// Parse the bill id. Accepts JSON integers and numeric strings.
    pub fn bill_id(&self) -> Result<i64, BillError> {
        let raw = match &self.id {
            None | Some(Value::Null) => return Err(BillError::MissingId),
            Some(v) => v,
        };
        match as_integer(raw) {
            Some(id) if id > 0 => Ok(id),
            _ => Err(BillError::InvalidId(raw.to_string())),
        }
    }

    /// Decide whether this bill gets a refund call.
    ///
    /// Fractional amounts are truncated toward zero, matching how the portal stores money
    /// as whole units.
    pub fn candidate(&self) -> Result<RefundCandidate, BillError> {
        let bill_id = self.bill_id()?;
        let raw = match &self.actual_money {
            None | Some(Value::Null) => return Err(BillError::MissingAmount(bill_id)),
            Some(v) => v,
        };
        let amount = as_integer(raw).ok_or_else(|| BillError::InvalidAmount {
            bill_id,
            raw: raw.to_string(),
        })?;

        match amount {
            0 => Err(BillError::ZeroAmount(bill_id)),
            a if a < 0 => Err(BillError::NegativeAmount { bill_id, amount: a }),
            a => Ok(RefundCandidate { bill_id, amount: a }),
        }
    }
}

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}
