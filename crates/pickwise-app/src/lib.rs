// Library root: re-exports the relay modules so the binary and integration
// tests share one implementation.

pub mod app;
pub mod protocol;
pub mod ws_server;
