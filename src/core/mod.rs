//! # Core Application Logic
//!
//! This module contains Courier's session logic.
//! It knows nothing about HTTP or the terminal.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (session data) │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │ Effect
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌──────────────┐                       ┌──────────────┐
//!     │     REPL     │                       │ SessionClient│
//!     │ (event loop) │                       │  (one call)  │
//!     └──────────────┘                       └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, everything one session holds
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`config`]: Layered settings (defaults, file, env, CLI)

pub mod action;
pub mod config;
pub mod state;
