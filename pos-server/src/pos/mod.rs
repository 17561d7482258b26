//! Point-of-sale workflow
//!
//! - [`PosSession`] - start order, attach items, checkout, cancel
//! - [`PaymentProcessor`] - seam to the payment collaborator

pub mod payment;
pub mod session;

pub use payment::{PaymentError, PaymentOutcome, PaymentProcessor, TenderPaymentProcessor};
pub use session::{CheckoutReceipt, PosSession};
