//! evrefund-api: HTTP client for the charging portal (login, bill page, bill refund)
//! and the sequential refund driver built on it.

pub mod client;
pub mod error;
pub mod headers;
pub mod processor;

pub use client::{ClientOptions, PortalClient, RefundReceipt, Session};
pub use error::ApiError;
pub use headers::HeaderProfile;
pub use processor::{BatchOptions, process_bills, run_refunds};

/// Endpoint paths relative to the portal origin.
pub mod endpoints {
    pub const LOGIN: &str = "/api/config-service/user/login";
    pub const BILL_PAGE: &str = "/api/statistics-service/billDetailStatisticsController/page";
    pub const BILL_REFUND: &str = "/api/bill-service/bill/billRefund";
}
