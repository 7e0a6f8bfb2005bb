//! JSON request bodies for the three portal endpoints.
//!
//! Field names follow the portal front-end exactly, including its `memberCategorys` spelling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bill::RefundCandidate;
use crate::credentials::Credentials;
use crate::window::DateWindow;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub account: &'a str,
    pub password: &'a str,
    pub seller_number: Option<&'a str>,
    pub sms_captcha_pass: bool,
}

impl<'a> LoginRequest<'a> {
    pub fn from_credentials(creds: &'a Credentials) -> Self {
        Self {
            account: &creds.account,
            password: &creds.password_hash,
            seller_number: creds.seller_number.as_deref(),
            sms_captcha_pass: true,
        }
    }
}

/// Fixed part of the bill query: which station, which bill status, how many rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryFilter {
    pub station_ids: Vec<i64>,
    pub member_categories: Vec<i64>,
    /// 14 = awaiting refund.
    pub bill_status: Vec<i64>,
    pub page_size: u32,
    pub bus_id_type: i64,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            station_ids: vec![1227],
            member_categories: vec![1, 0],
            bill_status: vec![14],
            page_size: 50,
            bus_id_type: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillQuery {
    pub station_ids: Vec<i64>,
    pub fleet_ids: Option<Vec<i64>>,
    pub member_categorys: Vec<i64>,
    pub bill_status: Vec<i64>,
    pub pile_ids: Option<Vec<i64>>,
    pub group_ids: Option<Vec<i64>>,
    pub time_s: String,
    pub time_e: String,
    pub current: u32,
    pub total: u64,
    pub page_size: u32,
    pub bus_id_type: i64,
}

impl BillQuery {
    /// First page of `filter` over `window`.
    pub fn new(filter: &QueryFilter, window: &DateWindow) -> Self {
        Self {
            station_ids: filter.station_ids.clone(),
            fleet_ids: None,
            member_categorys: filter.member_categories.clone(),
            bill_status: filter.bill_status.clone(),
            pile_ids: None,
            group_ids: None,
            time_s: window.time_s(),
            time_e: window.time_e(),
            current: 1,
            total: 0,
            page_size: filter.page_size,
            bus_id_type: filter.bus_id_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub bill_id: i64,
    pub member_id: Option<i64>,
    pub refund_money: i64,
    pub note: String,
    pub refund_power_discount: i64,
}

impl RefundRequest {
    pub fn new(candidate: RefundCandidate, note: String) -> Self {
        Self {
            bill_id: candidate.bill_id,
            member_id: None,
            refund_money: candidate.amount,
            note,
            refund_power_discount: 0,
        }
    }
}

/// Audit note attached to a refund: `<prefix>-<billId>-<YYYYMMDD>`.
pub fn refund_note(prefix: &str, bill_id: i64, date: NaiveDate) -> String {
    format!("{}-{}-{}", prefix, bill_id, date.format("%Y%m%d"))
}
