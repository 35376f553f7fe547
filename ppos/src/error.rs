// SPDX-License-Identifier: MPL-2.0

use core::fmt;

/// The error type which is returned from the APIs of this crate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// Invalid arguments provided: a missing task or queue, a task without an
    /// entry function, or a task in a state the operation cannot act on.
    InvalidArgs,
    /// Insufficient memory available for a task's execution context.
    NoMemory,
    /// The task is not linked into the queue it is being removed from.
    NotQueued,
    /// The task is already linked into a queue.
    AlreadyQueued,
}

impl Error {
    /// Returns the negative sentinel reported to callers that speak in
    /// integer results.
    pub const fn as_errno(self) -> i32 {
        -1
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidArgs => "invalid arguments",
            Error::NoMemory => "cannot allocate the task's execution context",
            Error::NotQueued => "task is not linked into this queue",
            Error::AlreadyQueued => "task is already linked into a queue",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_error_maps_to_the_negative_sentinel() {
        for err in [
            Error::InvalidArgs,
            Error::NoMemory,
            Error::NotQueued,
            Error::AlreadyQueued,
        ] {
            assert_eq!(err.as_errno(), -1);
        }
    }
}
