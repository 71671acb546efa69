//! OpenAI chat completions to Anthropic Messages on Vertex AI.
//!
//! Every stage is a pure function over request-scoped values; the only
//! side channel is the [`DecisionHook`](crate::logging::DecisionHook) each
//! entry point receives. [`transform::transform_request`] drives the request
//! side and [`response::normalize_response`] the response side.

pub mod anthropic_types;
pub mod capabilities;
pub mod classify;
pub mod openai_types;
pub mod reasoning;
pub mod request;
pub mod response;
pub mod sanitize;
pub mod tools;
pub mod transform;

pub use transform::{transform_request, CallMetadata, TransformOptions};
