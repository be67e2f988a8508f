//! # mindsift-pipeline
//!
//! The note-processing pipeline: takes a raw note, decides whether it
//! contains an actionable idea via an LLM call, extracts structured
//! fields, and commits the outcome while tracking status through a small
//! state machine.
//!
//! This crate provides:
//! - Prompt template rendering with placeholder validation
//! - Model-output parsing and enum normalization
//! - The [`NoteProcessor`] state machine
//! - The [`BatchRunner`] for queue-less catch-up passes

pub mod batch;
pub mod parser;
pub mod processor;
pub mod prompt;

// Re-export core types
pub use mindsift_core::*;

pub use batch::{BatchReport, BatchRunner};
pub use parser::{parse_extraction, ExtractedIdea, Extraction};
pub use processor::{NoteProcessor, ProcessOutcome};
pub use prompt::{
    note_payload, render_prompt, DEFAULT_PROCESSING_PROMPT, NOTE_CONTENT_PLACEHOLDER,
};
