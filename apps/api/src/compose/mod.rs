//! Document Composer: turns a CV and a selection into a document model, then
//! into a PDF artifact.

pub mod document;
pub mod font_metrics;
pub mod pdf;
pub mod render;

pub use document::{compose, ComposeError, DocumentModel, Header, Section};
pub use render::{render, Artifact, RenderTarget};
