// SPDX-License-Identifier: MPL-2.0

//! Useful synchronization primitives built on task suspension.

mod wait;

pub use self::wait::WaitQueue;
