//! Command-understanding pipeline - staged intent detection and extraction
//!
//! This crate is the "brain" of porcher: it takes a free-text utterance from
//! a farmer and decides which structured action they mean, under explicit
//! confidence thresholds:
//!
//! 1. **Retrieval** (`retrieval`) - nearest neighbor over a labeled corpus
//!    via an embedding capability
//! 2. **Classification** (`classifier`) - external classifier adapter,
//!    issued concurrently with retrieval
//! 3. **Extraction** (`extractor`) - structured parameters, normalized at
//!    the boundary
//! 4. **Fallback** (`fallback`) - deterministic keyword matching, the last
//!    line of defense and the oracle in offline tests
//!
//! The orchestrator (`pipeline`) sequences the stages and owns the
//! per-session pending-confirmation slot (`session`); every completed
//! decision is recorded by the monitor (`monitor`).
//!
//! # Safety Principle
//!
//! No stage ever performs a side effect. The pipeline's only output is a
//! `Decision`; anything that records farm data goes through explicit
//! confirmation discipline first.

pub mod capabilities;
pub mod classifier;
pub mod corpus;
pub mod extractor;
pub mod fallback;
pub mod monitor;
pub mod pipeline;
pub mod retrieval;
pub mod session;

pub use capabilities::{Classification, Classifier, EmbeddingProvider, Extraction, Extractor};
pub use monitor::{Metrics, PerformanceMonitor, PrecisionMetrics};
pub use pipeline::Orchestrator;
