// Infrastructure layer modules
pub mod config;
pub mod dispatch_client;
pub mod logging;

// Re-exports
pub use config::{DispatchConfig, DispatchConfigError, DEFAULT_DISPATCH_URL, DISPATCH_USER, GITHUB_TOKEN_ENV};
pub use dispatch_client::{
    DispatchError, EnvConfiguredDispatcher, GitHubDispatchClient, RepositoryDispatcher, DISPATCH_EVENT_TYPE,
};
pub use logging::init_logging;
