use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("unsupported frequency: {0} (expected monthly, fortnightly or weekly)")]
    UnsupportedFrequency(String),

    #[error("unsupported payment type: {0} (expected repayment or interest-only)")]
    UnsupportedPaymentType(String),

    #[error("unsupported student loan plan: {0}")]
    UnsupportedStudentLoanPlan(String),

    #[error("unsupported buyer type: {0} (expected standard or first-time)")]
    UnsupportedBuyerType(String),

    #[error("invalid input: {field} {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CalcError {
    pub fn invalid(field: &str, reason: &str) -> Self {
        CalcError::InvalidInput {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::Serialization(e.to_string())
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
