pub mod auth;
pub mod auth_task;
pub mod chat_task;
pub mod protocol;
pub mod rest;
pub mod reveal_task;
pub mod state;
pub mod view;
pub mod ws_handler;

// Re-export the handlers the binary mounts on the router.
pub use auth::{login_handler, logout_handler, register_handler, session_handler};
pub use ws_handler::ws_handler;
