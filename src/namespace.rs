// SPDX-License-Identifier: MPL-2.0
//! `NamespaceOps`: lookup, create/mknod, unlink, opendir/readdir,
//! getattr/setattr, plus rename, symlink/readlink, link, and forget,
//! all composing `InodeCache` and `DentryCache`.

use std::sync::{Arc, Mutex};

use crate::cache::{DentryCache, InodeCache};
use crate::error::{Errno, Result};
use crate::model::{
    Dentry, FileType, FsId, Inode, InodeId, InodeParam, SetAttrMask, SetAttrRequest,
};

/// Per-open-directory cursor. The full listing is pulled once per
/// `opendir` and served from memory afterward.
pub struct DirHandle {
    pub parent: InodeId,
    entries: Vec<Dentry>,
}

pub struct NamespaceOps {
    fsid: Mutex<FsId>,
    inode_cache: Arc<InodeCache>,
    dentry_cache: Arc<DentryCache>,
}

impl NamespaceOps {
    pub fn new(inode_cache: Arc<InodeCache>, dentry_cache: Arc<DentryCache>) -> Self {
        Self {
            fsid: Mutex::new(0),
            inode_cache,
            dentry_cache,
        }
    }

    pub fn init(&self, fsid: FsId) {
        *self.fsid.lock().unwrap() = fsid;
    }

    fn fsid(&self) -> FsId {
        *self.fsid.lock().unwrap()
    }

    pub fn lookup(&self, parent: InodeId, name: &[u8]) -> Result<Inode> {
        let dentry = self.dentry_cache.get_dentry(parent, name)?;
        self.inode_cache.get_inode(dentry.inodeid)
    }

    /// `create`/`mknod`. Leaves the new inode unreferenced if dentry
    /// creation fails; there is no compensating delete.
    /// `param.fsid` is overwritten with the mount's own fsid; callers
    /// need not know it.
    pub fn make_node(&self, parent: InodeId, name: &[u8], param: InodeParam) -> Result<Inode> {
        let param = InodeParam {
            fsid: self.fsid(),
            ..param
        };
        let inode = self.inode_cache.create_inode(&param)?;
        let dentry = Dentry {
            fsid: self.fsid(),
            parent_inode_id: parent,
            name: name.to_vec(),
            inodeid: inode.inodeid,
            dentry_type: inode.file_type,
        };
        self.dentry_cache.create_dentry(&dentry)?;
        Ok(inode)
    }

    /// Removes the edge and the inode; link counts live at the
    /// metaserver.
    pub fn unlink(&self, parent: InodeId, name: &[u8]) -> Result<()> {
        let dentry = self.dentry_cache.get_dentry(parent, name)?;
        self.dentry_cache.delete_dentry(parent, name)?;
        self.inode_cache.delete_inode(dentry.inodeid)
    }

    pub fn opendir(&self, ino: InodeId) -> Result<DirHandle> {
        let inode = self.inode_cache.get_inode(ino)?;
        if inode.file_type != FileType::Directory {
            return Err(Errno::InvalidParam.into());
        }
        Ok(DirHandle {
            parent: ino,
            entries: Vec::new(),
        })
    }

    /// Populates (on first call) and pages through a directory's entries.
    /// `offset` is an entry-index cursor, matching the usual FUSE
    /// `readdir` convention of an opaque, monotonically-increasing
    /// position rather than a byte offset.
    pub fn readdir(&self, handle: &mut DirHandle, offset: u64, count: usize) -> Result<Vec<Dentry>> {
        if handle.entries.is_empty() && offset == 0 {
            handle.entries = self.dentry_cache.list_dentry(handle.parent)?;
        }
        let start = offset as usize;
        Ok(handle.entries.iter().skip(start).take(count).cloned().collect())
    }

    pub fn releasedir(&self, _handle: DirHandle) {}

    pub fn getattr(&self, ino: InodeId) -> Result<Inode> {
        self.inode_cache.get_inode(ino)
    }

    /// Only fields whose mask bit is set are applied.
    pub fn setattr(&self, ino: InodeId, req: &SetAttrRequest) -> Result<Inode> {
        let mut inode = self.inode_cache.get_inode(ino)?;
        let mask = req.mask();
        if mask.contains(SetAttrMask::MODE) {
            inode.attr.mode = req.mode;
        }
        if mask.contains(SetAttrMask::UID) {
            inode.attr.uid = req.uid;
        }
        if mask.contains(SetAttrMask::GID) {
            inode.attr.gid = req.gid;
        }
        if mask.contains(SetAttrMask::SIZE) {
            inode.length = req.size;
        }
        if mask.contains(SetAttrMask::ATIME) {
            inode.attr.atime = req.atime;
        }
        if mask.contains(SetAttrMask::MTIME) {
            inode.attr.mtime = req.mtime;
        }
        if mask.contains(SetAttrMask::CTIME) {
            inode.attr.ctime = req.ctime;
        }
        self.inode_cache.update_inode(&inode)?;
        Ok(inode)
    }

    /// Rebinds `name` under `new_parent`/`new_name` to the same inode.
    /// No data movement: extents and object references are keyed by
    /// inode, not path.
    pub fn rename(
        &self,
        parent: InodeId,
        name: &[u8],
        new_parent: InodeId,
        new_name: &[u8],
    ) -> Result<()> {
        let dentry = self.dentry_cache.get_dentry(parent, name)?;
        let renamed = Dentry {
            fsid: dentry.fsid,
            parent_inode_id: new_parent,
            name: new_name.to_vec(),
            inodeid: dentry.inodeid,
            dentry_type: dentry.dentry_type,
        };
        self.dentry_cache.create_dentry(&renamed)?;
        self.dentry_cache.delete_dentry(parent, name)
    }

    pub fn symlink(&self, parent: InodeId, name: &[u8], target: &[u8]) -> Result<Inode> {
        let param = InodeParam {
            fsid: self.fsid(),
            file_type: FileType::Symlink,
            mode: 0o777,
            uid: 0,
            gid: 0,
            rdev: 0,
            symlink_target: Some(target.to_vec()),
        };
        self.make_node(parent, name, param)
    }

    pub fn readlink(&self, ino: InodeId) -> Result<Vec<u8>> {
        let inode = self.inode_cache.get_inode(ino)?;
        match inode.data {
            crate::model::InodeData::Symlink(target) => Ok(target),
            _ => Err(Errno::InvalidParam.into()),
        }
    }

    /// Hard link: bind a second dentry to an existing inode. The core
    /// always issues the call; `NOTSUPPORT` is a valid backend response
    /// if the metaserver does not support multiply-linked inodes.
    pub fn link(&self, ino: InodeId, new_parent: InodeId, new_name: &[u8]) -> Result<Inode> {
        let inode = self.inode_cache.get_inode(ino)?;
        let dentry = Dentry {
            fsid: self.fsid(),
            parent_inode_id: new_parent,
            name: new_name.to_vec(),
            inodeid: ino,
            dentry_type: inode.file_type,
        };
        self.dentry_cache.create_dentry(&dentry)?;
        Ok(inode)
    }

    /// Drops a kernel-held refcount on a cached inode. Pure cache
    /// eviction hint; never errors.
    pub fn forget(&self, ino: InodeId) {
        self.inode_cache.forget(ino);
    }
}
