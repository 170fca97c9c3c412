//! Flags forum posts that contain source code pasted without code markup.
//!
//! Post markup goes through [`analyzer::normalize`] (formatted code and
//! attachment widgets removed, split into plain-text paragraphs) and then
//! [`analyzer::detect`], which asks a [`classifier::CodeClassifier`] about each
//! paragraph and reports the first one scoring above the threshold.

pub mod analyzer;
pub mod classifier;
pub mod db;
pub mod error;
pub mod post;
pub mod problems;
pub mod settings;

pub use analyzer::PostAnalyzer;
pub use classifier::{CodeClassifier, HttpClassifier, Prediction};
pub use error::{ClassifierError, Error, Result};
pub use post::Post;
pub use problems::PostProblem;
