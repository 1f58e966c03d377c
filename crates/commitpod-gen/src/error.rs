use crate::backend::BackendError;
use commitpod_diff::BudgetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Backend returned an empty commit message")]
    EmptyResult,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Budget(#[from] BudgetError),
}
