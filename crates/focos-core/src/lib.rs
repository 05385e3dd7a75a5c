//! # Focos Core Library
//!
//! This library provides the core logic for Focos, a focus tool that blocks
//! distracting sites through the system hosts file. It implements a CLI-first
//! philosophy: every operation is a library call, and the `focos` binary is a
//! thin layer over it.
//!
//! ## Architecture
//!
//! - **Hosts**: Rewrites a single marker-delimited block inside the hosts file
//!   and commits it through a platform elevation strategy
//! - **Elevation**: One privileged-copy strategy per platform, behind a
//!   command-runner seam so it can be tested without privileges
//! - **Sessions**: Tick-driven state machines (Normal, Pomodoro, Strict) that
//!   decide when the block is applied and cleared
//! - **Storage**: TOML-based configuration and the runtime strict lock
//!
//! ## Key Components
//!
//! - [`HostsBlockManager`]: Apply and clear the managed block
//! - [`SessionController`]: Block list plus the live session
//! - [`Config`]: Application configuration management

pub mod blocklist;
pub mod dns;
pub mod domain;
pub mod elevation;
pub mod error;
pub mod events;
pub mod hosts;
pub mod notify;
pub mod session;
pub mod storage;

pub use blocklist::BlockList;
pub use elevation::{ElevationMode, Platform};
pub use error::{
    BlockError, ConfigError, CoreError, FlushError, NotifyError, SessionError, ValidationError,
};
pub use events::{BlockOperation, SessionEvent};
pub use hosts::{BlockResponse, Blocker, HostsBlockManager};
pub use notify::{Notification, Notifier, Silent, TracingNotifier};
pub use session::{
    Mode, NormalConfig, Phase, PomodoroConfig, Session, SessionConfig, SessionController,
    SessionSnapshot, StrictConfig,
};
pub use storage::{Config, HostsConfig, StrictLock};
