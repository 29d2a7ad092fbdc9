//! Domain vocabulary and pure logic for the Porcher command pipeline.
//!
//! Everything the pipeline agrees on without talking to the outside world:
//! - `actions` - the closed set of farm actions and their parameter schemas
//! - `params` - typed parameter values attached to a decision
//! - `decision` - the tagged `Decision` union and stage candidates
//! - `normalize` - natural-language number/unit/code canonicalization
//! - `config` - file + environment configuration with validation
//! - `errors` - the capability error taxonomy shared by all adapters

pub mod actions;
pub mod config;
pub mod decision;
pub mod errors;
pub mod normalize;
pub mod params;

pub use actions::{ActionKind, ActionSchema, ParamSpec, ParamType};
pub use decision::{Candidate, Decision, StageSource, UnrecognizedReason, Utterance};
pub use errors::CapabilityError;
pub use normalize::{
    fold_text, normalize_amount, normalize_code, normalize_count, normalize_weight,
    NormalizationError,
};
pub use params::{ParamValue, ParameterSet};
