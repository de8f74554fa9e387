// SPDX-License-Identifier: MPL-2.0
//! In-memory fakes for the backend RPC traits, used only by this
//! crate's own test suite. Hand-written fake servers rather than a
//! mocking framework, so every test runs against real trait impls.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{BlockClient, BlockDeviceStat, MdsClient, MetaServerClient, ObjectAdaptor, SpaceClient};
use crate::config::BdevOpt;
use crate::error::{Errno, Result};
use crate::model::{
    AllocateType, Dentry, Extent, ExtentAllocInfo, FsId, FsInfo, Inode, InodeId, InodeParam, S3Info, Volume,
};

#[derive(Default)]
pub struct FakeMdsClient {
    pub fs: Mutex<HashMap<String, FsInfo>>,
    pub next_fsid: Mutex<u32>,
}

impl MdsClient for FakeMdsClient {
    fn get_fs_info(&self, name: &str) -> Result<FsInfo> {
        self.fs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Errno::Notexist.into())
    }

    fn create_fs(&self, name: &str, _block_size: u64, volume: Volume) -> Result<()> {
        let mut guard = self.next_fsid.lock().unwrap();
        *guard += 1;
        let fsid = *guard;
        self.fs.lock().unwrap().insert(
            name.to_string(),
            FsInfo {
                fsid,
                fsname: name.to_string(),
                detail: crate::model::FsDetail::Block(volume),
            },
        );
        Ok(())
    }

    fn create_fs_s3(&self, name: &str, _block_size: u64, s3_info: S3Info) -> Result<()> {
        let mut guard = self.next_fsid.lock().unwrap();
        *guard += 1;
        let fsid = *guard;
        self.fs.lock().unwrap().insert(
            name.to_string(),
            FsInfo {
                fsid,
                fsname: name.to_string(),
                detail: crate::model::FsDetail::Object(s3_info),
            },
        );
        Ok(())
    }

    fn mount_fs(&self, name: &str, _mount_point: &str) -> Result<FsInfo> {
        self.get_fs_info(name)
    }

    fn umount_fs(&self, _name: &str, _mount_point: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMetaServerClient {
    pub inodes: Mutex<HashMap<InodeId, Inode>>,
    pub dentries: Mutex<HashMap<(InodeId, Vec<u8>), Dentry>>,
    pub next_inode: Mutex<u64>,
}

impl MetaServerClient for FakeMetaServerClient {
    fn get_inode(&self, _fsid: FsId, ino: InodeId) -> Result<Inode> {
        self.inodes
            .lock()
            .unwrap()
            .get(&ino)
            .cloned()
            .ok_or_else(|| Errno::Notexist.into())
    }

    fn update_inode(&self, inode: &Inode) -> Result<()> {
        self.inodes.lock().unwrap().insert(inode.inodeid, inode.clone());
        Ok(())
    }

    fn create_inode(&self, param: &InodeParam) -> Result<Inode> {
        let mut guard = self.next_inode.lock().unwrap();
        *guard += 1;
        let inodeid = *guard;
        let data = match (&param.file_type, &param.symlink_target) {
            (crate::model::FileType::Symlink, Some(target)) => crate::model::InodeData::Symlink(target.clone()),
            (crate::model::FileType::File, _) => crate::model::InodeData::Volume(Vec::new()),
            _ => crate::model::InodeData::None,
        };
        let inode = Inode {
            inodeid,
            fsid: param.fsid,
            length: 0,
            file_type: param.file_type,
            attr: crate::model::StatAttr {
                mode: param.mode,
                uid: param.uid,
                gid: param.gid,
                atime: crate::model::StatAttr::now(),
                mtime: crate::model::StatAttr::now(),
                ctime: crate::model::StatAttr::now(),
            },
            data,
        };
        self.inodes.lock().unwrap().insert(inodeid, inode.clone());
        Ok(inode)
    }

    fn delete_inode(&self, _fsid: FsId, ino: InodeId) -> Result<()> {
        self.inodes.lock().unwrap().remove(&ino);
        Ok(())
    }

    fn get_dentry(&self, _fsid: FsId, parent: InodeId, name: &[u8]) -> Result<Dentry> {
        self.dentries
            .lock()
            .unwrap()
            .get(&(parent, name.to_vec()))
            .cloned()
            .ok_or_else(|| Errno::Notexist.into())
    }

    fn create_dentry(&self, dentry: &Dentry) -> Result<()> {
        self.dentries
            .lock()
            .unwrap()
            .insert((dentry.parent_inode_id, dentry.name.clone()), dentry.clone());
        Ok(())
    }

    fn delete_dentry(&self, _fsid: FsId, parent: InodeId, name: &[u8]) -> Result<()> {
        self.dentries.lock().unwrap().remove(&(parent, name.to_vec()));
        Ok(())
    }

    fn list_dentry(&self, _fsid: FsId, parent: InodeId, last: &[u8], limit: usize) -> Result<Vec<Dentry>> {
        let guard = self.dentries.lock().unwrap();
        let mut all: Vec<&Dentry> = guard.values().filter(|d| d.parent_inode_id == parent).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        let start = if last.is_empty() {
            0
        } else {
            all.iter().position(|d| d.name.as_slice() > last).unwrap_or(all.len())
        };
        Ok(all
            .into_iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeSpaceClient {
    pub next_offset: Mutex<u64>,
    pub fail_alloc: std::sync::atomic::AtomicBool,
    /// When set, returns an allocation one byte shorter than requested,
    /// forcing `mergeAllocedExtents` to fail its length check.
    pub return_mismatched_length: std::sync::atomic::AtomicBool,
    pub dealloc_calls: Mutex<Vec<Extent>>,
}

impl SpaceClient for FakeSpaceClient {
    fn alloc_extents(
        &self,
        _fsid: FsId,
        to_alloc: &[ExtentAllocInfo],
        _alloc_type: AllocateType,
    ) -> Result<Vec<Extent>> {
        if self.fail_alloc.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Errno::NoSpace.into());
        }
        let mut guard = self.next_offset.lock().unwrap();
        let mismatch = self
            .return_mismatched_length
            .load(std::sync::atomic::Ordering::SeqCst);
        let mut out = Vec::with_capacity(to_alloc.len());
        for req in to_alloc {
            let length = if mismatch { req.length - 1 } else { req.length };
            out.push(Extent {
                p_offset: *guard,
                length,
            });
            *guard += req.length;
        }
        Ok(out)
    }

    fn dealloc_extents(&self, _fsid: FsId, extents: &[Extent]) -> Result<()> {
        self.dealloc_calls.lock().unwrap().extend_from_slice(extents);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBlockClient {
    pub data: Mutex<Vec<u8>>,
}

impl BlockClient for FakeBlockClient {
    fn init(&self, _opt: &BdevOpt) -> Result<()> {
        Ok(())
    }

    fn stat(&self, _volume: &str, _user: &str) -> Result<BlockDeviceStat> {
        Ok(BlockDeviceStat { length: 1 << 30 })
    }

    fn open(&self, _volume: &str, _user: &str) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        let guard = self.data.lock().unwrap();
        let start = offset as usize;
        let end = start + buf.len();
        if end > guard.len() {
            return Err(Errno::Internal.into());
        }
        buf.copy_from_slice(&guard[start..end]);
        Ok(())
    }

    fn write(&self, buf: &[u8], offset: u64) -> Result<()> {
        let mut guard = self.data.lock().unwrap();
        let start = offset as usize;
        let end = start + buf.len();
        if end > guard.len() {
            guard.resize(end, 0);
        }
        guard[start..end].copy_from_slice(buf);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeObjectAdaptor {
    pub data: Mutex<HashMap<InodeId, Vec<u8>>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl ObjectAdaptor for FakeObjectAdaptor {
    fn write(&self, ino: InodeId, buf: &[u8], offset: u64) -> i64 {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return -1;
        }
        let mut guard = self.data.lock().unwrap();
        let entry = guard.entry(ino).or_default();
        let start = offset as usize;
        let end = start + buf.len();
        if end > entry.len() {
            entry.resize(end, 0);
        }
        entry[start..end].copy_from_slice(buf);
        buf.len() as i64
    }

    fn read(&self, ino: InodeId, buf: &mut [u8], offset: u64) -> i64 {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return -1;
        }
        let guard = self.data.lock().unwrap();
        let Some(entry) = guard.get(&ino) else {
            return -1;
        };
        let start = offset as usize;
        if start >= entry.len() {
            return 0;
        }
        let end = (start + buf.len()).min(entry.len());
        let n = end - start;
        buf[..n].copy_from_slice(&entry[start..end]);
        n as i64
    }
}
