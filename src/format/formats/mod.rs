//! Annotation format implementations.

mod json;
mod text;

#[cfg(test)]
mod tests;

pub use json::JsonFormat;
pub use text::TextFormat;
