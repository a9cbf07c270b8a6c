pub mod envelope;
pub mod fields;
pub mod forms;
pub mod metadata;
pub mod parser;
pub mod pipeline;
pub mod sanitize;
pub mod ticket;
