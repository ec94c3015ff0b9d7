// Technical interview quiz: question selection by technology and difficulty,
// answer scoring by string similarity.

pub mod handlers;
pub mod question_bank;
pub mod similarity;

pub use question_bank::{Difficulty, Question, QuestionBank};
