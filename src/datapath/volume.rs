// SPDX-License-Identifier: MPL-2.0
//! `VolumeDataPath`: write/read orchestration for block-backed files.
//! The pipeline is allocate → merge → divide → write/read → mark-written
//! → persist, in that order.

use std::sync::{Arc, Mutex};

use crate::cache::InodeCache;
use crate::error::Result;
use crate::extent;
use crate::model::{AllocateType, FsId, InodeId, K_BIG_FILE_SIZE};
use crate::rpc::{BlockClient, SpaceClient};

pub struct VolumeDataPath {
    fsid: Mutex<FsId>,
    inode_cache: Arc<InodeCache>,
    space_client: Arc<dyn SpaceClient>,
    block_client: Arc<dyn BlockClient>,
}

impl VolumeDataPath {
    pub fn new(
        inode_cache: Arc<InodeCache>,
        space_client: Arc<dyn SpaceClient>,
        block_client: Arc<dyn BlockClient>,
    ) -> Self {
        Self {
            fsid: Mutex::new(0),
            inode_cache,
            space_client,
            block_client,
        }
    }

    pub fn init(&self, fsid: FsId) {
        *self.fsid.lock().unwrap() = fsid;
    }

    fn fsid(&self) -> FsId {
        *self.fsid.lock().unwrap()
    }

    fn allocate_type(current_length: u64, write_size: u64) -> AllocateType {
        if current_length >= K_BIG_FILE_SIZE || write_size >= K_BIG_FILE_SIZE {
            AllocateType::Big
        } else {
            AllocateType::Small
        }
    }

    pub fn write(&self, ino: InodeId, buf: &[u8], off: u64) -> Result<usize> {
        let size = buf.len() as u64;
        let mut inode = self.inode_cache.get_inode(ino)?;
        let mut extents = inode.extents().cloned().unwrap_or_default();

        let to_alloc = extent::get_to_alloc_extents(&extents, off, size)?;

        if !to_alloc.is_empty() {
            let alloc_type = Self::allocate_type(inode.length, size);
            let allocated = self.space_client.alloc_extents(self.fsid(), &to_alloc, alloc_type)?;
            if let Err(merge_err) = extent::merge_alloced_extents(&to_alloc, &allocated, &mut extents) {
                if let Err(dealloc_err) = self.space_client.dealloc_extents(self.fsid(), &allocated) {
                    log::error!("deAllocExtents after failed merge also failed: {dealloc_err}");
                }
                return Err(merge_err);
            }
        }

        let pextents = extent::divide_extents(&extents, off, size, false)?;
        let mut written = 0usize;
        for pext in &pextents {
            let len = pext.length as usize;
            self.block_client.write(&buf[written..written + len], pext.p_offset)?;
            written += len;
        }

        extent::mark_extents_written(off, size, &mut extents)?;
        inode.data = crate::model::InodeData::Volume(extents);
        if inode.length < off + size {
            inode.length = off + size;
        }

        self.inode_cache.update_inode(&inode)?;
        Ok(size as usize)
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
        let extents = inode.extents().cloned().unwrap_or_default();
        let pextents = extent::divide_extents(&extents, off, clamped, true)?;

        let mut read_base = 0usize;
        for pext in &pextents {
            let len = pext.length as usize;
            if !pext.un_written {
                self.block_client
                    .read(&mut buf[read_base..read_base + len], pext.p_offset)?;
            }
            read_base += len;
        }
        Ok(buf)
    }
}
