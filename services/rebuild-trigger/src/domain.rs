// Domain layer modules
pub mod bearer_auth;
pub mod trigger_event;

// Re-exports
pub use bearer_auth::{parse_bearer, BearerAuthenticator, E5E_TOKEN_ENV};
pub use trigger_event::{ResponseType, TriggerEvent, TriggerResponse};
