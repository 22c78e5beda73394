//! The prompt-to-structured-document pipeline: prompt templating, model
//! invocation, schema-guarded extraction, and the HTTP handlers that tie the
//! pipeline to the render and store layers.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod schema;
