// Résumé verification: skills extracted from the PDF are cross-checked against
// the languages of the candidate's GitHub repositories.

pub mod handlers;
pub mod matching;
pub mod pipeline;
