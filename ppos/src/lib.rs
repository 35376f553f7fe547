// SPDX-License-Identifier: MPL-2.0

//! A cooperative, priority-driven task scheduler with tick-driven preemption.
//!
//! A [`Kernel`] multiplexes one logical CPU among tasks. The thread that
//! creates it becomes the main task; a dispatcher task picks the next user
//! task with an aging priority policy whenever the running one yields,
//! suspends, exits or runs out of its quantum of clock ticks.
//!
//! ```no_run
//! use ppos::{SchedConfig, task::TaskOptions};
//!
//! let kernel = ppos::init(SchedConfig::default()).unwrap();
//! for prio in [5, -5, 0] {
//!     let k = kernel.clone();
//!     let options = TaskOptions::new(move || {
//!         println!("task {} runs", k.id());
//!         k.exit(0)
//!     })
//!     .priority(prio);
//!     kernel.create(options).unwrap();
//! }
//! // Runs the user tasks until all of them have exited.
//! kernel.yield_now().unwrap();
//! kernel.exit(0);
//! ```

#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
mod error;
mod kernel;
mod logger;
pub mod prelude;
pub mod sync;
pub mod task;
pub mod timer;

pub use self::{
    config::SchedConfig,
    error::Error,
    kernel::Kernel,
    prelude::Result,
    timer::{Jiffies, Ticker},
};

/// Initializes a kernel.
///
/// The calling thread becomes the main task of the returned kernel. The log
/// level is taken from the `PPOS_LOG_LEVEL` environment variable.
pub fn init(config: SchedConfig) -> Result<alloc::sync::Arc<Kernel>> {
    Kernel::new(config)
}
