// SPDX-License-Identifier: MPL-2.0
//! Trait definitions for the backend RPC contracts this crate is linked
//! against. Only call signatures live here. Transport, retries, and
//! wire framing belong to the wire clients, not this crate.

use crate::config::BdevOpt;
use crate::error::Result;
use crate::model::{AllocateType, Dentry, Extent, ExtentAllocInfo, FsId, FsInfo, Inode, InodeId, InodeParam, S3Info, Volume};

#[cfg(test)]
pub mod fake;

/// `mds.{getFsInfo,createFs,createFsS3,mountFs,umountFs}`.
pub trait MdsClient: Send + Sync {
    fn get_fs_info(&self, name: &str) -> Result<FsInfo>;
    fn create_fs(&self, name: &str, block_size: u64, volume: Volume) -> Result<()>;
    fn create_fs_s3(&self, name: &str, block_size: u64, s3_info: S3Info) -> Result<()>;
    fn mount_fs(&self, name: &str, mount_point: &str) -> Result<FsInfo>;
    fn umount_fs(&self, name: &str, mount_point: &str) -> Result<()>;
}

/// Metaserver: inode and dentry RPCs.
pub trait MetaServerClient: Send + Sync {
    fn get_inode(&self, fsid: FsId, ino: InodeId) -> Result<Inode>;
    fn update_inode(&self, inode: &Inode) -> Result<()>;
    fn create_inode(&self, param: &InodeParam) -> Result<Inode>;
    fn delete_inode(&self, fsid: FsId, ino: InodeId) -> Result<()>;

    fn get_dentry(&self, fsid: FsId, parent: InodeId, name: &[u8]) -> Result<Dentry>;
    fn create_dentry(&self, dentry: &Dentry) -> Result<()>;
    fn delete_dentry(&self, fsid: FsId, parent: InodeId, name: &[u8]) -> Result<()>;
    /// One page of a directory listing, starting strictly after `last`
    /// (empty for the first page), capped at `limit` entries.
    fn list_dentry(&self, fsid: FsId, parent: InodeId, last: &[u8], limit: usize) -> Result<Vec<Dentry>>;
}

/// Space service: volume-extent allocator.
pub trait SpaceClient: Send + Sync {
    fn alloc_extents(
        &self,
        fsid: FsId,
        to_alloc: &[ExtentAllocInfo],
        alloc_type: AllocateType,
    ) -> Result<Vec<Extent>>;
    fn dealloc_extents(&self, fsid: FsId, extents: &[Extent]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDeviceStat {
    pub length: u64,
}

/// Raw logical-volume I/O.
pub trait BlockClient: Send + Sync {
    fn init(&self, opt: &BdevOpt) -> Result<()>;
    fn stat(&self, volume: &str, user: &str) -> Result<BlockDeviceStat>;
    fn open(&self, volume: &str, user: &str) -> Result<()>;
    fn close(&self) -> Result<()>;
    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()>;
    fn write(&self, buf: &[u8], offset: u64) -> Result<()>;
}

/// Glue to an object store. Signed byte count: negative means failure.
pub trait ObjectAdaptor: Send + Sync {
    fn write(&self, ino: InodeId, buf: &[u8], offset: u64) -> i64;
    fn read(&self, ino: InodeId, buf: &mut [u8], offset: u64) -> i64;
}
