// SPDX-License-Identifier: MPL-2.0
//! `MountLifecycle`: bring-up and tear-down against the MDS and the
//! chosen data backend.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::MountOptions;
use crate::error::Result;
use crate::model::{FsId, FsInfo, S3Info, Volume};
use crate::rpc::{BlockClient, MdsClient};

/// Receives the canonical `fsid` once a mount completes. Implemented by
/// every component that needs it (`InodeCache`, `DentryCache`,
/// `NamespaceOps`, the data paths) so `MountLifecycle` does not need to
/// know their concrete types.
pub trait FsIdSink: Send + Sync {
    fn set_fsid(&self, fsid: FsId);
}

/// Backend-specific half of bring-up/tear-down: registering the
/// filesystem at the MDS when it does not exist yet, and opening/closing
/// whatever backend-specific handle the mount needs.
pub trait MountBackend: Send + Sync {
    fn ensure_registered(&self, mds: &dyn MdsClient, fs_name: &str, volume: &str, user: &str) -> Result<()>;
    fn open(&self, volume: &str, user: &str) -> Result<()>;
    fn close(&self) -> Result<()>;
}

/// `Block`-typed filesystems: stat the volume to learn its length, then
/// register it with the MDS; open/close delegate to the block client.
pub struct BlockMountBackend {
    block_client: Arc<dyn BlockClient>,
}

impl BlockMountBackend {
    pub fn new(block_client: Arc<dyn BlockClient>) -> Self {
        Self { block_client }
    }
}

impl MountBackend for BlockMountBackend {
    fn ensure_registered(&self, mds: &dyn MdsClient, fs_name: &str, volume: &str, user: &str) -> Result<()> {
        let stat = self.block_client.stat(volume, user)?;
        let vol = Volume {
            volume_size: stat.length,
            block_size: 4096,
            name: volume.to_string(),
            user: user.to_string(),
        };
        mds.create_fs(fs_name, 4096, vol)
    }

    fn open(&self, volume: &str, user: &str) -> Result<()> {
        self.block_client.open(volume, user)
    }

    fn close(&self) -> Result<()> {
        self.block_client.close()
    }
}

/// `Object`-typed filesystems: no volume to stat, no handle to open.
pub struct ObjectMountBackend {
    block_size: u64,
    s3_info: S3Info,
}

impl ObjectMountBackend {
    pub fn new(block_size: u64, s3_info: S3Info) -> Self {
        Self { block_size, s3_info }
    }
}

impl MountBackend for ObjectMountBackend {
    fn ensure_registered(&self, mds: &dyn MdsClient, fs_name: &str, _volume: &str, _user: &str) -> Result<()> {
        mds.create_fs_s3(fs_name, self.block_size, self.s3_info.clone())
    }

    fn open(&self, _volume: &str, _user: &str) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// `FsInfo` is reference-counted and swapped atomically only during
/// `init`/`destroy`, never mutated in place.
pub struct MountLifecycle {
    mds_client: Arc<dyn MdsClient>,
    backend: Arc<dyn MountBackend>,
    fs_info: ArcSwapOption<FsInfo>,
    sinks: Vec<Arc<dyn FsIdSink>>,
}

impl MountLifecycle {
    pub fn new(mds_client: Arc<dyn MdsClient>, backend: Arc<dyn MountBackend>, sinks: Vec<Arc<dyn FsIdSink>>) -> Self {
        Self {
            mds_client,
            backend,
            fs_info: ArcSwapOption::empty(),
            sinks,
        }
    }

    pub fn fs_info(&self) -> Option<Arc<FsInfo>> {
        self.fs_info.load_full()
    }

    pub fn init(&self, opts: &MountOptions) -> Result<()> {
        let fs_name = opts.fs_name();
        if let Err(e) = self.mds_client.get_fs_info(fs_name) {
            if e.is_notexist() {
                log::info!("fsName {fs_name} not found, creating it");
                self.backend
                    .ensure_registered(self.mds_client.as_ref(), fs_name, &opts.volume, &opts.user)?;
            } else {
                log::error!("GetFsInfo failed for {fs_name}: {e}");
                return Err(e);
            }
        }

        self.backend.open(&opts.volume, &opts.user)?;

        let fs_info = self.mds_client.mount_fs(fs_name, &opts.mount_point)?;
        let fsid = fs_info.fsid;
        self.fs_info.store(Some(Arc::new(fs_info)));
        for sink in &self.sinks {
            sink.set_fsid(fsid);
        }
        log::info!("mount {fs_name} on {} success, fsid={fsid}", opts.mount_point);
        Ok(())
    }

    /// Each step is attempted regardless of a prior step's outcome; the
    /// first error is retained.
    pub fn destroy(&self, opts: &MountOptions) -> Result<()> {
        let fs_name = self
            .fs_info
            .load_full()
            .map(|info| info.fsname.clone())
            .unwrap_or_else(|| opts.fs_name().to_string());

        let mut first_err = None;
        if let Err(e) = self.mds_client.umount_fs(&fs_name, &opts.mount_point) {
            log::error!("UmountFs failed for {fs_name}: {e}");
            first_err.get_or_insert(e);
        }
        if let Err(e) = self.backend.close() {
            log::error!("backend close failed: {e}");
            first_err.get_or_insert(e);
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                log::info!("umount {fs_name} on {} success", opts.mount_point);
                Ok(())
            }
        }
    }
}
