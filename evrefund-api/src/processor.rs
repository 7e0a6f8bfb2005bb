//! Sequential refund driver: login, fetch one page, refund eligible bills one by one.
//!
//! Duplicate protection is the portal's job: a refunded bill leaves status 14 and drops out
//! of the next query. Nothing is recorded locally between runs.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use evrefund_core::{BillPage, BillQuery, Credentials, RefundRequest, RunOutcome, refund_note};

use crate::client::{BODY_PREVIEW_CHARS, PortalClient, Session, clip};
use crate::error::ApiError;

/// Longest transport error message written to the log.
const ERROR_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub note_prefix: String,
    /// Date stamped into refund notes.
    pub date: NaiveDate,
    /// Log eligible bills instead of refunding them.
    pub dry_run: bool,
}

impl BatchOptions {
    pub fn new(note_prefix: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            note_prefix: note_prefix.into(),
            date,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Full run. Only a failed login is an error; a failed fetch yields an empty outcome.
pub async fn run_refunds(
    client: &PortalClient,
    creds: &Credentials,
    query: &BillQuery,
    opts: &BatchOptions,
) -> Result<RunOutcome, ApiError> {
    info!(portal = client.base_url(), account = %creds.account, "logging in");
    let session = match client.login(creds).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "login failed");
            return Err(e);
        }
    };
    info!(token = %session.token_preview(), "login ok");

    let page = match client.fetch_bills(&session, query).await {
        Ok(page) => page,
        Err(e) => {
            error!(error = %e, "fetching bills failed, nothing to process");
            return Ok(RunOutcome::default());
        }
    };
    info!(
        from = %query.time_s,
        to = %query.time_e,
        total = page.total_count,
        "bills fetched"
    );

    Ok(process_bills(client, &session, &page, opts).await)
}

/// Walk the page in received order. Each eligible bill gets exactly one refund call.
pub async fn process_bills(
    client: &PortalClient,
    session: &Session,
    page: &BillPage,
    opts: &BatchOptions,
) -> RunOutcome {
    let mut outcome = RunOutcome::default();

    if page.is_empty() {
        info!(total = page.total_count, "no bills to process");
        info!("refund summary: {outcome}");
        return outcome;
    }
    if page.is_truncated() {
        warn!(
            total = page.total_count,
            returned = page.data.len(),
            "more bills than fit in one page; the rest are left for the next run"
        );
    }

    for bill in &page.data {
        let candidate = match bill.candidate() {
            Ok(c) => c,
            Err(reason) => {
                info!(%reason, "skipped");
                outcome.record_skip();
                continue;
            }
        };
        let bill_id = candidate.bill_id;

        if opts.dry_run {
            info!(bill_id, amount = candidate.amount, "dry run, would refund");
            outcome.record_skip();
            continue;
        }

        info!(bill_id, amount = candidate.amount, "refunding");
        let note = refund_note(&opts.note_prefix, bill_id, opts.date);
        let request = RefundRequest::new(candidate, note);

        match client.refund_bill(session, &request).await {
            Ok(receipt) => {
                info!(
                    bill_id,
                    status = receipt.status.as_u16(),
                    body = %clip(&receipt.body, BODY_PREVIEW_CHARS),
                    "refunded"
                );
                outcome.record_success();
            }
            Err(ApiError::Status { status, body }) => {
                error!(bill_id, status = status.as_u16(), %body, "refund rejected");
                outcome.record_failure();
            }
            Err(e) => {
                let msg = e.to_string();
                error!(bill_id, error = %clip(&msg, ERROR_PREVIEW_CHARS), "refund request failed");
                outcome.record_failure();
            }
        }
    }

    info!("refund summary: {outcome}");
    outcome
}
