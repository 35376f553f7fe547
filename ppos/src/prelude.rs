// SPDX-License-Identifier: MPL-2.0

//! The prelude.

/// A specialized [`Result`] type for this crate.
///
/// [`Result`]: core::result::Result
pub type Result<T> = core::result::Result<T, crate::error::Error>;

pub(crate) use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};

pub use crate::{
    error::Error,
    kernel::Kernel,
    task::{QueueId, TaskClass, TaskId, TaskStatus},
};
