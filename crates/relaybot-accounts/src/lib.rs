//! Account layer for Relaybot — one supervisor per messaging account, a
//! fleet runner on top.
//!
//! - [`transport::Transport`] — abstract interface over a messaging account
//! - [`console`] — stdin/stdout transport for local runs
//! - [`supervisor`] — per-account event loop
//! - [`fleet`] — runs all accounts concurrently, failures isolated

pub mod console;
pub mod fleet;
pub mod supervisor;
pub mod transport;

pub use console::ConsoleTransport;
pub use fleet::run_fleet;
pub use supervisor::{AccountOutcome, AccountSupervisor};
pub use transport::{Transport, TransportEvent};
