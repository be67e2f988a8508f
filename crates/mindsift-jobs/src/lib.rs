//! # mindsift-jobs
//!
//! Background job dispatch and processing for mindsift.
//!
//! This crate provides:
//! - [`JobDispatcher`]: enqueues processing work (single or batch) onto
//!   the durable queue, decoupling ingestion from extraction
//! - [`JobWorker`]: polls the queue, runs the note processor over claimed
//!   jobs concurrently, and maps outcomes back to the queue (complete, or
//!   hand back for backoff redelivery on provider failures)
//! - The `mindsift-worker` binary wiring both to Postgres
//!
//! ## Example
//!
//! ```ignore
//! use mindsift_jobs::{JobDispatcher, JobWorker, WorkerConfig};
//!
//! let dispatcher = JobDispatcher::new(db.jobs.clone());
//! dispatcher.enqueue(ProcessingJob { note_id, user_id, content, title: None }).await?;
//!
//! let worker = JobWorker::new(db.jobs.clone(), processor, WorkerConfig::from_env());
//! let handle = worker.start();
//! // ...
//! handle.shutdown().await?;
//! ```

pub mod dispatcher;
pub mod worker;

// Re-export core types
pub use mindsift_core::*;

pub use dispatcher::JobDispatcher;
pub use worker::{JobWorker, WorkerConfig, WorkerEvent, WorkerHandle};
