// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for host transfers.
pub type HostIOResult<T = ()> = core::result::Result<T, HostIOError>;

/// Error type for host transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostIOError {
    Other(&'static str),
    /// Transfer would run past the bytes the host made available.
    OutOfBounds,
    Unsupported,
    #[cfg(feature = "std")]
    Io(std::io::ErrorKind),
}

impl HostIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            HostIOError::Other(msg) => msg,
            HostIOError::OutOfBounds => "Transfer out of bounds",
            HostIOError::Unsupported => "Unsupported operation",
            #[cfg(feature = "std")]
            HostIOError::Io(_) => "Host file I/O error",
        }
    }
}

impl From<&'static str> for HostIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        HostIOError::Other(msg)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for HostIOError {
    #[cold]
    fn from(e: std::io::Error) -> Self {
        HostIOError::Io(e.kind())
    }
}

impl fmt::Display for HostIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        #[cfg(feature = "std")]
        if let HostIOError::Io(kind) = self {
            write!(f, " ({kind})")?;
        }
        Ok(())
    }
}

impl core::error::Error for HostIOError {}
