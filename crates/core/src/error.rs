use thiserror::Error;

use crate::model::{QuestionTypeError, SessionModelError};

/// Any error raised by the domain model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    QuestionType(#[from] QuestionTypeError),
    #[error(transparent)]
    Session(#[from] SessionModelError),
}
