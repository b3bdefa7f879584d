pub mod retry;
pub mod algolia;
pub mod meili;
pub mod remote_config;

pub use retry::*;
pub use algolia::*;
pub use meili::*;
pub use remote_config::*;
