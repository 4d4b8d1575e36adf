pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod schema;
pub mod search;
