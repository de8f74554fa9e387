// SPDX-License-Identifier: MPL-2.0
//! `FileSystemClient`: the kernel-bridge callback surface, and its two
//! backend implementations.
//!
//! Block- and object-backed mounts are expressed as a trait plus two
//! implementations that share `NamespaceOps` through composition rather
//! than through a shared base class; only the data path and the mount
//! backend differ between them.

use std::sync::Arc;

use crate::cache::{DentryCache, InodeCache};
use crate::config::MountOptions;
use crate::datapath::{ObjectDataPath, VolumeDataPath};
use crate::error::{Errno, Result};
use crate::mount::{FsIdSink, MountLifecycle};
use crate::namespace::{DirHandle, NamespaceOps};
use crate::model::{Dentry, FileType, FsStat, Inode, InodeId, InodeParam, SetAttrRequest};
use crate::rpc::MetaServerClient;

impl FsIdSink for InodeCache {
    fn set_fsid(&self, fsid: crate::model::FsId) {
        self.init(fsid);
    }
}

impl FsIdSink for DentryCache {
    fn set_fsid(&self, fsid: crate::model::FsId) {
        self.init(fsid);
    }
}

impl FsIdSink for NamespaceOps {
    fn set_fsid(&self, fsid: crate::model::FsId) {
        self.init(fsid);
    }
}

impl FsIdSink for VolumeDataPath {
    fn set_fsid(&self, fsid: crate::model::FsId) {
        self.init(fsid);
    }
}

/// The kernel bridge's callback surface, named in filesystem-operation
/// terms rather than in any specific FFI shape. Argument marshalling
/// against `fuse_req_t`/`fuse_file_info` etc. is a collaborator's job;
/// these methods take and return plain Rust values.
pub trait FileSystemClient: Send + Sync {
    fn init(&self, opts: &MountOptions) -> Result<()>;
    fn destroy(&self, opts: &MountOptions) -> Result<()>;

    fn lookup(&self, parent: InodeId, name: &[u8]) -> Result<Inode>;
    fn getattr(&self, ino: InodeId) -> Result<Inode>;
    fn setattr(&self, ino: InodeId, req: &SetAttrRequest) -> Result<Inode>;
    fn mknod(&self, parent: InodeId, name: &[u8], mode: u32, rdev: u32) -> Result<Inode>;
    fn mkdir(&self, parent: InodeId, name: &[u8], mode: u32) -> Result<Inode>;
    fn unlink(&self, parent: InodeId, name: &[u8]) -> Result<()>;
    fn rmdir(&self, parent: InodeId, name: &[u8]) -> Result<()>;

    fn open(&self, ino: InodeId) -> Result<()>;
    fn read(&self, ino: InodeId, size: u64, off: u64) -> Result<Vec<u8>>;
    fn write(&self, ino: InodeId, buf: &[u8], off: u64) -> Result<usize>;
    fn release(&self, ino: InodeId) -> Result<()>;

    fn opendir(&self, ino: InodeId) -> Result<DirHandle>;
    fn readdir(&self, handle: &mut DirHandle, offset: u64, count: usize) -> Result<Vec<Dentry>>;
    fn releasedir(&self, handle: DirHandle);

    fn create(&self, parent: InodeId, name: &[u8], mode: u32) -> Result<Inode>;
    fn fsync(&self, ino: InodeId) -> Result<()>;
    fn flush(&self, ino: InodeId) -> Result<()>;
    fn rename(&self, parent: InodeId, name: &[u8], new_parent: InodeId, new_name: &[u8]) -> Result<()>;
    fn symlink(&self, parent: InodeId, name: &[u8], target: &[u8]) -> Result<Inode>;
    fn readlink(&self, ino: InodeId) -> Result<Vec<u8>>;
    fn link(&self, ino: InodeId, new_parent: InodeId, new_name: &[u8]) -> Result<Inode>;
    fn statfs(&self, ino: InodeId) -> Result<FsStat>;
    fn forget(&self, ino: InodeId, nlookup: u64);
}

fn verify_open_target(ns: &NamespaceOps, ino: InodeId, want_dir: bool) -> Result<Inode> {
    let inode = ns.getattr(ino)?;
    let is_dir = inode.file_type == FileType::Directory;
    if is_dir != want_dir {
        return Err(Errno::InvalidParam.into());
    }
    Ok(inode)
}

/// Shared namespace-operation plumbing every `FileSystemClient` impl
/// delegates to.
macro_rules! impl_namespace_passthrough {
    () => {
        fn lookup(&self, parent: InodeId, name: &[u8]) -> Result<Inode> {
            self.ns.lookup(parent, name)
        }

        fn getattr(&self, ino: InodeId) -> Result<Inode> {
            self.ns.getattr(ino)
        }

        fn setattr(&self, ino: InodeId, req: &SetAttrRequest) -> Result<Inode> {
            self.ns.setattr(ino, req)
        }

        fn mknod(&self, parent: InodeId, name: &[u8], mode: u32, rdev: u32) -> Result<Inode> {
            self.ns.make_node(
                parent,
                name,
                InodeParam {
                    fsid: 0,
                    file_type: FileType::File,
                    mode,
                    uid: 0,
                    gid: 0,
                    rdev,
                    symlink_target: None,
                },
            )
        }

        fn mkdir(&self, parent: InodeId, name: &[u8], mode: u32) -> Result<Inode> {
            self.ns.make_node(
                parent,
                name,
                InodeParam {
                    fsid: 0,
                    file_type: FileType::Directory,
                    mode,
                    uid: 0,
                    gid: 0,
                    rdev: 0,
                    symlink_target: None,
                },
            )
        }

        fn unlink(&self, parent: InodeId, name: &[u8]) -> Result<()> {
            self.ns.unlink(parent, name)
        }

        fn rmdir(&self, parent: InodeId, name: &[u8]) -> Result<()> {
            let inode = self.ns.lookup(parent, name)?;
            if inode.file_type != FileType::Directory {
                return Err(Errno::InvalidParam.into());
            }
            self.ns.unlink(parent, name)
        }

        fn opendir(&self, ino: InodeId) -> Result<DirHandle> {
            self.ns.opendir(ino)
        }

        fn readdir(&self, handle: &mut DirHandle, offset: u64, count: usize) -> Result<Vec<Dentry>> {
            self.ns.readdir(handle, offset, count)
        }

        fn releasedir(&self, handle: DirHandle) {
            self.ns.releasedir(handle)
        }

        fn create(&self, parent: InodeId, name: &[u8], mode: u32) -> Result<Inode> {
            self.mknod(parent, name, mode, 0)
        }

        fn rename(&self, parent: InodeId, name: &[u8], new_parent: InodeId, new_name: &[u8]) -> Result<()> {
            self.ns.rename(parent, name, new_parent, new_name)
        }

        fn symlink(&self, parent: InodeId, name: &[u8], target: &[u8]) -> Result<Inode> {
            self.ns.symlink(parent, name, target)
        }

        fn readlink(&self, ino: InodeId) -> Result<Vec<u8>> {
            self.ns.readlink(ino)
        }

        fn link(&self, ino: InodeId, new_parent: InodeId, new_name: &[u8]) -> Result<Inode> {
            self.ns.link(ino, new_parent, new_name)
        }

        fn forget(&self, ino: InodeId, _nlookup: u64) {
            self.ns.forget(ino)
        }
    };
}

/// Block-backed filesystem client: `NamespaceOps` plus `VolumeDataPath`.
pub struct BlockFsClient {
    ns: Arc<NamespaceOps>,
    data_path: Arc<VolumeDataPath>,
    meta_client: Arc<dyn MetaServerClient>,
    mount: MountLifecycle,
}

impl BlockFsClient {
    pub fn new(
        ns: Arc<NamespaceOps>,
        data_path: Arc<VolumeDataPath>,
        meta_client: Arc<dyn MetaServerClient>,
        mount: MountLifecycle,
    ) -> Self {
        Self {
            ns,
            data_path,
            meta_client,
            mount,
        }
    }
}

impl FileSystemClient for BlockFsClient {
    fn init(&self, opts: &MountOptions) -> Result<()> {
        self.mount.init(opts)
    }

    fn destroy(&self, opts: &MountOptions) -> Result<()> {
        self.mount.destroy(opts)
    }

    impl_namespace_passthrough!();

    fn open(&self, ino: InodeId) -> Result<()> {
        verify_open_target(&self.ns, ino, false).map(|_| ())
    }

    fn read(&self, ino: InodeId, size: u64, off: u64) -> Result<Vec<u8>> {
        self.data_path.read(ino, size, off)
    }

    fn write(&self, ino: InodeId, buf: &[u8], off: u64) -> Result<usize> {
        self.data_path.write(ino, buf, off)
    }

    fn release(&self, _ino: InodeId) -> Result<()> {
        Ok(())
    }

    fn fsync(&self, _ino: InodeId) -> Result<()> {
        Ok(())
    }

    fn flush(&self, _ino: InodeId) -> Result<()> {
        Ok(())
    }

    fn statfs(&self, _ino: InodeId) -> Result<FsStat> {
        let info = self.mount.fs_info().ok_or(Errno::Internal)?;
        let crate::model::FsDetail::Block(volume) = &info.detail else {
            return Err(Errno::Internal.into());
        };
        let total_blocks = volume.volume_size / volume.block_size;
        Ok(FsStat {
            block_size: volume.block_size,
            total_blocks,
            free_blocks: total_blocks,
        })
    }
}

/// Object-backed filesystem client: `NamespaceOps` plus `ObjectDataPath`.
pub struct ObjectFsClient {
    ns: Arc<NamespaceOps>,
    data_path: Arc<ObjectDataPath>,
    mount: MountLifecycle,
}

impl ObjectFsClient {
    pub fn new(ns: Arc<NamespaceOps>, data_path: Arc<ObjectDataPath>, mount: MountLifecycle) -> Self {
        Self { ns, data_path, mount }
    }
}

impl FileSystemClient for ObjectFsClient {
    fn init(&self, opts: &MountOptions) -> Result<()> {
        self.mount.init(opts)
    }

    fn destroy(&self, opts: &MountOptions) -> Result<()> {
        self.mount.destroy(opts)
    }

    impl_namespace_passthrough!();

    fn open(&self, ino: InodeId) -> Result<()> {
        verify_open_target(&self.ns, ino, false).map(|_| ())
    }

    fn read(&self, ino: InodeId, size: u64, off: u64) -> Result<Vec<u8>> {
        self.data_path.read(ino, size, off)
    }

    fn write(&self, ino: InodeId, buf: &[u8], off: u64) -> Result<usize> {
        self.data_path.write(ino, buf, off)
    }

    fn release(&self, _ino: InodeId) -> Result<()> {
        Ok(())
    }

    fn fsync(&self, _ino: InodeId) -> Result<()> {
        Ok(())
    }

    fn flush(&self, _ino: InodeId) -> Result<()> {
        Ok(())
    }

    fn statfs(&self, _ino: InodeId) -> Result<FsStat> {
        let info = self.mount.fs_info().ok_or(Errno::Internal)?;
        let crate::model::FsDetail::Object(s3) = &info.detail else {
            return Err(Errno::Internal.into());
        };
        Ok(FsStat {
            block_size: s3.block_size,
            // Object stores present as effectively unbounded capacity.
            total_blocks: u64::MAX / s3.block_size,
            free_blocks: u64::MAX / s3.block_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FsType, StatAttr};
    use crate::mount::BlockMountBackend;
    use crate::rpc::fake::{FakeBlockClient, FakeMdsClient, FakeMetaServerClient, FakeSpaceClient};

    fn mount_opts() -> MountOptions {
        MountOptions {
            mount_point: "/mnt/cfs".into(),
            volume: "vol1".into(),
            fs_name: None,
            user: "alice".into(),
            fs_type: FsType::Block,
            bdev_opt: Default::default(),
            s3_opt: Default::default(),
        }
    }

    fn make_block_client() -> BlockFsClient {
        let meta = Arc::new(FakeMetaServerClient::default());
        let inode_cache = Arc::new(InodeCache::new(meta.clone()));
        let dentry_cache = Arc::new(DentryCache::new(meta.clone()));
        let ns = Arc::new(NamespaceOps::new(inode_cache.clone(), dentry_cache.clone()));

        let space = Arc::new(FakeSpaceClient::default());
        let block = Arc::new(FakeBlockClient::default());
        block.data.lock().unwrap().resize(1 << 20, 0);
        let data_path = Arc::new(VolumeDataPath::new(inode_cache.clone(), space, block.clone()));

        let mds = Arc::new(FakeMdsClient::default());
        let backend = Arc::new(BlockMountBackend::new(block));
        let sinks: Vec<Arc<dyn FsIdSink>> = vec![inode_cache, dentry_cache, ns.clone(), data_path.clone()];
        let mount = MountLifecycle::new(mds, backend, sinks);

        BlockFsClient::new(ns, data_path, meta, mount)
    }

    #[test]
    fn mount_then_mkdir_create_write_read_cycle() {
        let client = make_block_client();
        client.init(&mount_opts()).unwrap();

        // Root directory 1 is assumed pre-existing at the metaserver in
        // a real deployment; seed it here the way the fake's own tests do.
        let root = Inode {
            inodeid: 1,
            fsid: client.mount.fs_info().unwrap().fsid,
            length: 0,
            file_type: FileType::Directory,
            attr: StatAttr::default(),
            data: crate::model::InodeData::None,
        };
        client.meta_client.update_inode(&root).unwrap();

        let file = client.create(1, b"a.txt", 0o644).unwrap();
        client.open(file.inodeid).unwrap();
        let n = client.write(file.inodeid, b"payload", 0).unwrap();
        assert_eq!(n, 7);
        let data = client.read(file.inodeid, 7, 0).unwrap();
        assert_eq!(data, b"payload");

        let stat = client.statfs(1).unwrap();
        assert!(stat.total_blocks > 0);

        client.destroy(&mount_opts()).unwrap();
    }

    #[test]
    fn open_rejects_directory() {
        let client = make_block_client();
        client.init(&mount_opts()).unwrap();
        let root = Inode {
            inodeid: 1,
            fsid: client.mount.fs_info().unwrap().fsid,
            length: 0,
            file_type: FileType::Directory,
            attr: StatAttr::default(),
            data: crate::model::InodeData::None,
        };
        client.meta_client.update_inode(&root).unwrap();
        assert!(client.open(1).is_err());
    }
}
