pub mod config;
pub mod github;
pub mod labels;

pub use config::{ConfigError, ReleaseType, RepoConfig};
pub use github::RepoRef;
