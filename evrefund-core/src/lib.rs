//! evrefund-core: bill records, refund eligibility, query windows and request payloads
//! for the EV-charging portal auto-refund workflow. No I/O lives here.

pub mod bill;
pub mod credentials;
pub mod outcome;
pub mod payload;
pub mod window;

pub use bill::{Bill, BillError, BillPage, RefundCandidate};
pub use credentials::Credentials;
pub use outcome::RunOutcome;
pub use payload::{BillQuery, LoginRequest, QueryFilter, RefundRequest, refund_note};
pub use window::{DateWindow, WindowStrategy, TIME_FORMAT};
