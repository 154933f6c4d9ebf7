//! Billing error taxonomy

/// Errors raised by entitlement collaborators.
///
/// Only [`BillingError::MalformedRecord`] ever escapes the entitlement
/// service; identity and store failures are folded into the zero state.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The request carries no valid session for any tenant
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    /// The subscription store could not answer (network, pool, timeout)
    #[error("Subscription store unavailable: {0}")]
    StoreUnavailable(String),
    /// The store returned a record that violates the resolver's preconditions
    #[error("Malformed subscription record for {tenant}: {reason}")]
    MalformedRecord { tenant: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BillingResult<T> = Result<T, BillingError>;

impl BillingError {
    pub fn malformed(tenant: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::MalformedRecord {
            tenant: tenant.into(),
            reason: reason.into(),
        }
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { index, source } => BillingError::MalformedRecord {
                tenant: String::new(),
                reason: format!("column {index}: {source}"),
            },
            sqlx::Error::Decode(source) => BillingError::MalformedRecord {
                tenant: String::new(),
                reason: source.to_string(),
            },
            other => BillingError::StoreUnavailable(other.to_string()),
        }
    }
}
