pub type FlipbookResult<T> = Result<T, FlipbookError>;

#[derive(thiserror::Error, Debug)]
pub enum FlipbookError {
    /// An input file had the wrong media kind. Recoverable: the caller
    /// re-prompts for the input, nothing else is torn down.
    #[error("input rejected: {0}")]
    InputRejected(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("compose error: {0}")]
    Compose(String),

    /// A session transition was attempted out of order, or a run was started
    /// while another run held the in-progress guard.
    #[error("state error: {0}")]
    State(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipbookError {
    pub fn input_rejected(msg: impl Into<String>) -> Self {
        Self::InputRejected(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn compose(msg: impl Into<String>) -> Self {
        Self::Compose(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}
