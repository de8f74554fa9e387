// SPDX-License-Identifier: MPL-2.0
//! Cache + write-through proxies sitting in front of the metaserver.

mod dentry;
mod inode;

pub use dentry::DentryCache;
pub use inode::InodeCache;
