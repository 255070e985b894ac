mod evaluation;
mod ids;
mod question;
mod session;
mod statistics;

pub use evaluation::Evaluation;
pub use ids::{QuestionId, SessionId};
pub use question::{Criterion, CriterionKind, Question, QuestionType, QuestionTypeError};
pub use session::{Session, SessionModelError, SessionState};
pub use statistics::{QuestionTypeStats, Statistics};
