pub mod config;
pub mod errors;
pub mod github;
pub mod interview;
pub mod linkedin;
pub mod ner;
pub mod routes;
pub mod skills;
pub mod state;
pub mod verification;

#[cfg(test)]
mod test_support;
