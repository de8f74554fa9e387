// SPDX-License-Identifier: MPL-2.0
//! `ObjectDataPath`: thin orchestrator for object-backed files, delegating
//! bytes to the object adaptor and length updates to `InodeCache`.

use std::sync::Arc;

use crate::cache::InodeCache;
use crate::error::{Errno, Result};
use crate::model::InodeId;
use crate::rpc::ObjectAdaptor;

pub struct ObjectDataPath {
    inode_cache: Arc<InodeCache>,
    adaptor: Arc<dyn ObjectAdaptor>,
}

impl ObjectDataPath {
    pub fn new(inode_cache: Arc<InodeCache>, adaptor: Arc<dyn ObjectAdaptor>) -> Self {
        Self { inode_cache, adaptor }
    }

    pub fn write(&self, ino: InodeId, buf: &[u8], off: u64) -> Result<usize> {
        let mut inode = self.inode_cache.get_inode(ino)?;
        let n = self.adaptor.write(ino, buf, off);
        if n < 0 {
            return Err(Errno::Internal.into());
        }
        let n = n as u64;
        if inode.length < off + n {
            inode.length = off + n;
        }
        self.inode_cache.update_inode(&inode)?;
        Ok(n as usize)
    }

    pub fn read(&self, ino: InodeId, size: u64, off: u64) -> Result<Vec<u8>> {
        let inode = self.inode_cache.get_inode(ino)?;
        if off >= inode.length {
            return Ok(Vec::new());
        }
        let clamped = if off + size > inode.length {
            inode.length - off
        } else {
            size
        };
        let mut buf = vec![0u8; clamped as usize];
        let n = self.adaptor.read(ino, &mut buf, off);
        if n < 0 {
            return Err(Errno::Internal.into());
        }
        buf.truncate(n as usize);
        Ok(buf)
    }
}
