pub mod clients;
pub mod config;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod storage;
pub mod sync;
pub mod tuner;

// Convenient re-exports for tests and external callers
pub use config::*;
pub use handlers::*;
pub use jobs::*;
pub use models::*;
pub use routes::*;
pub use storage::*;
pub use sync::*;
pub use tuner::*;
