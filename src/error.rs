// SPDX-License-Identifier: MPL-2.0
//! The single error domain shared by every module in this crate: one
//! enum, no per-module error types, and a `From` impl at each backend
//! boundary so `?` composes across cache, data-path, and RPC-client
//! code.

use thiserror::Error;

/// `CURVEFS_ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    Notexist,
    Exist,
    NoSpace,
    NoPermission,
    InvalidParam,
    Internal,
    Failed,
    NotSupport,
}

#[derive(Debug, Error, Clone)]
#[error("{errno:?}{}", msg.map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub const fn new(errno: Errno) -> Self {
        Error { errno, msg: None }
    }

    pub const fn with_message(errno: Errno, msg: &'static str) -> Self {
        Error {
            errno,
            msg: Some(msg),
        }
    }

    pub const fn errno(&self) -> Errno {
        self.errno
    }

    pub const fn is_notexist(&self) -> bool {
        matches!(self.errno, Errno::Notexist)
    }
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::new(errno)
    }
}

/// Maps an error kind to the POSIX errno the kernel bridge should surface.
/// `EIO` is the catch-all for internal/unclassified backend failures.
impl From<Error> for i32 {
    fn from(err: Error) -> Self {
        match err.errno {
            Errno::Notexist => libc_like::ENOENT,
            Errno::Exist => libc_like::EEXIST,
            Errno::NoSpace => libc_like::ENOSPC,
            Errno::NoPermission => libc_like::EACCES,
            Errno::InvalidParam => libc_like::EINVAL,
            Errno::Internal | Errno::Failed => libc_like::EIO,
            Errno::NotSupport => libc_like::ENOTSUP,
        }
    }
}

/// A tiny stand-in for the handful of `errno.h` constants the
/// kernel-bridge boundary needs.
mod libc_like {
    pub const ENOENT: i32 = 2;
    pub const EIO: i32 = 5;
    pub const EACCES: i32 = 13;
    pub const EEXIST: i32 = 17;
    pub const EINVAL: i32 = 22;
    pub const ENOSPC: i32 = 28;
    pub const ENOTSUP: i32 = 95;
}

pub type Result<T> = core::result::Result<T, Error>;
