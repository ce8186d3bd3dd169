pub mod history;
pub mod openai;
pub mod repo;
