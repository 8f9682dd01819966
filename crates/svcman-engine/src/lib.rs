//! # svcman-engine
//!
//! Process lifecycle engine for one-shot CLI invocations.
//!
//! Launches services detached into their own session, remembers them through
//! PID files, re-validates those against the process table on every call and
//! stops them with SIGTERM → SIGKILL escalation. Service output goes to
//! per-day log files with count-based retention.
//!
//! ```rust,no_run
//! use svcman_core::{ConfigStore, ServiceDefinitionBuilder};
//! use svcman_engine::LifecycleEngine;
//!
//! let mut config = ConfigStore::load("/tmp/svcman/config.json").unwrap();
//! config
//! 	.add(ServiceDefinitionBuilder::new("echo-loop").command("sleep").arg("30").build().unwrap())
//! 	.unwrap();
//!
//! let engine = LifecycleEngine::new(config);
//! println!("{:?}", engine.start("echo-loop").unwrap());
//! println!("{:?}", engine.status("echo-loop").unwrap());
//! println!("{:?}", engine.stop("echo-loop").unwrap());
//! ```

pub mod batch;
pub mod engine;
pub mod error;
pub mod launcher;
pub mod logs;
pub mod pid;
pub mod probe;
pub mod reconcile;
pub mod terminator;
pub mod timings;

pub use batch::{BatchEntry, BatchReport};
pub use engine::LifecycleEngine;
pub use error::EngineError;
pub use logs::LogSink;
pub use pid::{PidStore, Recorded};
pub use timings::Timings;
