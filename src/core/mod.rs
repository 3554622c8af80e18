//! # Core
//!
//! The clock's state and rules, with no terminal or audio code.
//!
//! ```text
//!     ┌────────────┐   push_key    ┌─────────────────────────┐
//!     │ raw input  │──────────────▶│         SESSION         │
//!     │  reader    │               │                         │
//!     └────────────┘               │  • quit flag            │
//!                                  │  • pending keystroke    │
//!     ┌────────────┐   interrupt   │  • notifier             │
//!     │   signal   │──────────────▶│                         │
//!     │   bridge   │               └────────────┬────────────┘
//!     └────────────┘                            │ wait / take_key
//!                                               ▼
//!                                  ┌─────────────────────────┐
//!                                  │       dispatcher        │
//!                                  │  Action::for_key(key)   │
//!                                  └─────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`]: `Session`, the one piece of state every thread shares
//! - [`action`]: `Action`, the key table
//! - [`clock`]: the spoken time phrase
//! - [`config`]: settings file, defaults and the setup editor

pub mod action;
pub mod clock;
pub mod config;
pub mod session;
