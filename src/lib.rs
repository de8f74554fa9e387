// SPDX-License-Identifier: MPL-2.0
//! Core data-plane and metadata-plane logic for a CurveFS-style
//! distributed filesystem client.
//!
//! This crate owns everything above the wire: the extent allocator, the
//! inode/dentry caches, the volume/object data paths, namespace
//! operations, and mount bring-up/tear-down. Transport, argument
//! marshalling against a kernel bridge, and the RPC wire clients
//! themselves are collaborators this crate is linked against, not
//! implemented here.

pub mod cache;
pub mod config;
pub mod datapath;
pub mod error;
pub mod extent;
pub mod fs_client;
pub mod model;
pub mod mount;
pub mod namespace;
pub mod rpc;

pub use error::{Errno, Error, Result};
pub use fs_client::{BlockFsClient, FileSystemClient, ObjectFsClient};
pub use mount::{BlockMountBackend, FsIdSink, MountBackend, MountLifecycle, ObjectMountBackend};
