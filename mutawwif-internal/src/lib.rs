pub mod auth; // Pro token issuing and verification
pub mod completion; // chat-completion client for the upstream provider
pub mod config; // environment-driven gateway configuration
pub mod endpoints; // API endpoints
pub mod error; // error handling
pub mod gateway_util; // utilities for gateway
pub mod guides; // static ritual guide content
pub mod languages; // supported language table
pub mod observability; // log setup
pub mod prompt; // prompt composition
pub mod rate_limit; // per-client daily usage limiting
pub mod subscriber; // subscriber records and stores
