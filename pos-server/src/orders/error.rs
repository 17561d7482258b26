use super::storage::StorageError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Kind of record a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Order,
    OrderItem,
    Table,
    Payment,
    Product,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Entity::Order => "Order",
            Entity::OrderItem => "Order item",
            Entity::Table => "Table",
            Entity::Payment => "Payment",
            Entity::Product => "Product",
        })
    }
}

/// Order domain errors
///
/// Returned as typed results; nothing is corrected or retried silently.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0} not found: {1}")]
    NotFound(Entity, String),

    #[error("Transition not allowed: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Concurrent update on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Order is no longer pending: {0}")]
    Immutable(String),

    #[error("Table is unavailable: {0}")]
    TableUnavailable(String),

    #[error("No accepted payment for order: {0}")]
    PaymentRequired(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl OrderError {
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        OrderError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn conflict(id: impl Into<String>, expected: impl ToString, actual: impl ToString) -> Self {
        OrderError::Conflict {
            id: id.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

// redb and serde failures all surface as storage errors
macro_rules! storage_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for OrderError {
                fn from(e: $source) -> Self {
                    OrderError::Storage(e.into())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
);

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(entity, id) => {
                let code = match entity {
                    Entity::Order => ErrorCode::OrderNotFound,
                    Entity::OrderItem => ErrorCode::OrderItemNotFound,
                    Entity::Table => ErrorCode::TableNotFound,
                    Entity::Payment => ErrorCode::NotFound,
                    Entity::Product => ErrorCode::ProductNotFound,
                };
                AppError::new(code).with_detail("id", id)
            }
            OrderError::InvalidTransition { from, to } => {
                AppError::new(ErrorCode::InvalidTransition)
                    .with_detail("from", from)
                    .with_detail("to", to)
            }
            OrderError::Conflict {
                id,
                expected,
                actual,
            } => AppError::conflict()
                .with_detail("id", id)
                .with_detail("expected", expected)
                .with_detail("actual", actual),
            OrderError::Forbidden(msg) => AppError::permission_denied(msg),
            OrderError::Immutable(id) => {
                AppError::new(ErrorCode::OrderImmutable).with_detail("order_id", id)
            }
            OrderError::TableUnavailable(id) => {
                AppError::new(ErrorCode::TableUnavailable).with_detail("table_id", id)
            }
            OrderError::PaymentRequired(id) => {
                AppError::new(ErrorCode::PaymentRequired).with_detail("order_id", id)
            }
            OrderError::PaymentFailed(reason) => {
                AppError::new(ErrorCode::PaymentFailed).with_detail("reason", reason)
            }
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::Storage(e) => {
                tracing::error!(error = %e, "Storage error occurred");
                AppError::database("Order storage is unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_wire_mapping() {
        let cases = [
            (
                OrderError::NotFound(Entity::Order, "o-1".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                OrderError::invalid_transition("ready", "ready"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                OrderError::conflict("o-1", "preparing", "ready"),
                StatusCode::CONFLICT,
            ),
            (OrderError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (OrderError::Immutable("o-1".into()), StatusCode::CONFLICT),
            (
                OrderError::TableUnavailable("t-1".into()),
                StatusCode::CONFLICT,
            ),
            (
                OrderError::PaymentRequired("o-1".into()),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                OrderError::PaymentFailed("declined".into()),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (OrderError::Validation("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.http_status(), status, "{:?}", app.code);
        }
    }

    #[test]
    fn test_conflict_message_is_actionable() {
        let app: AppError = OrderError::conflict("o-1", "preparing", "ready").into();
        assert_eq!(app.code, ErrorCode::OrderConflict);
        assert_eq!(
            app.message,
            "This order was updated by someone else. Refresh and try again."
        );
        let details = app.details.unwrap();
        assert_eq!(details["actual"], "ready");
    }

    #[test]
    fn test_item_not_found_code() {
        let app: AppError = OrderError::NotFound(Entity::OrderItem, "i-9".into()).into();
        assert_eq!(app.code, ErrorCode::OrderItemNotFound);
    }
}
