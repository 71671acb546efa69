pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod server;
pub mod translate;
pub mod vertex;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};
pub use logging::{Decision, DecisionHook, SharedLogger, TracingHook};
pub use server::{build_router, AppState};
pub use translate::{transform_request, CallMetadata, TransformOptions};
