pub type BrixelResult<T> = Result<T, BrixelError>;

#[derive(thiserror::Error, Debug)]
pub enum BrixelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("unsupported operator: {0}")]
    Operator(String),

    #[error("allocation error: {0}")]
    Allocation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrixelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn operator(msg: impl Into<String>) -> Self {
        Self::Operator(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }
}
