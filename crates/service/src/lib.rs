//! Service layer for storyflow
//!
//! Pitch workflow, prompt resolution, queue processing and the periodic
//! reconciliation sweep, on top of storage and the generation strategies.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::arithmetic_side_effects, reason = "Report counters cannot overflow a batch")]

mod error;
mod pitch_service;
mod prompt_resolver;
mod prompt_service;
mod queue_processor;
mod queue_service;
mod reconciliation;
mod scheduler;
mod shutdown;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod pitch_service_tests;
#[cfg(test)]
mod prompt_resolver_tests;

pub use error::ServiceError;
pub use pitch_service::{PitchService, TransitionOutcome};
pub use prompt_resolver::PromptResolver;
pub use prompt_service::PromptService;
pub use queue_processor::{ProcessorReport, QueueProcessor};
pub use queue_service::{QueueService, run_startup_recovery};
pub use reconciliation::{ReconciliationSweep, SweepReport};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use shutdown::{cancelled, shutdown_channel};
