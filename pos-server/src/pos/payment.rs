//! Payment processor seam
//!
//! The session records every attempt before asking the processor, so a
//! gateway outage never loses track of money already requested.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::order::{PaymentMethod, PaymentRecord};
use thiserror::Error;

/// Processor answer for one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Accepted {
        /// Cash change owed to the customer
        change: Option<Decimal>,
        /// Gateway reference, overrides the one sent by the terminal
        reference: Option<String>,
    },
    Rejected { reason: String },
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// External payment collaborator
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn authorize(&self, payment: &PaymentRecord) -> Result<PaymentOutcome, PaymentError>;

    /// Reverse an accepted payment
    async fn void(&self, payment: &PaymentRecord) -> Result<(), PaymentError>;
}

/// Default processor for tenders taken at the counter
///
/// Cash is accepted when the tendered amount covers the payment. Card and
/// other tenders are settled on an external terminal, so they are accepted
/// only with the terminal's approval reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenderPaymentProcessor;

#[async_trait]
impl PaymentProcessor for TenderPaymentProcessor {
    async fn authorize(&self, payment: &PaymentRecord) -> Result<PaymentOutcome, PaymentError> {
        match payment.method {
            PaymentMethod::Cash => {
                let tendered = payment.tendered.unwrap_or(payment.amount);
                if tendered < payment.amount {
                    return Ok(PaymentOutcome::Rejected {
                        reason: format!(
                            "tendered {} does not cover {}",
                            tendered, payment.amount
                        ),
                    });
                }
                Ok(PaymentOutcome::Accepted {
                    change: Some(tendered - payment.amount),
                    reference: None,
                })
            }
            PaymentMethod::Card | PaymentMethod::Other => {
                match payment.reference.as_deref().map(str::trim) {
                    Some(reference) if !reference.is_empty() => Ok(PaymentOutcome::Accepted {
                        change: None,
                        reference: Some(reference.to_string()),
                    }),
                    _ => Ok(PaymentOutcome::Rejected {
                        reason: "no terminal approval reference".to_string(),
                    }),
                }
            }
        }
    }

    async fn void(&self, payment: &PaymentRecord) -> Result<(), PaymentError> {
        // Counter tenders are handed back by staff
        tracing::warn!(
            payment_id = %payment.payment_id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            "Payment voided, return the tender to the customer"
        );
        Ok(())
    }
}
