// SPDX-License-Identifier: MPL-2.0
//! `InodeCache`: cache + write-through proxy for inodes.
//!
//! One coarse mutex guards a bounded `LruCache<InodeId, Inode>`; the
//! metaserver RPC runs under that same lock, which keeps the design
//! simple at the cost of serializing cache misses against each other.
//! These are optimistic positive caches, not exact mirrors of the
//! metaserver's state, so evicting an entry is always safe: a
//! subsequent `get_inode` just re-fetches it.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::error::Result;
use crate::model::{FsId, Inode, InodeId, InodeParam};
use crate::rpc::MetaServerClient;

/// Cache capacity; unbounded growth would defeat the point of bounding
/// directory/file churn in a long-lived mount.
const DEFAULT_CAPACITY: usize = 1 << 16;

pub struct InodeCache {
    fsid: Mutex<FsId>,
    meta_client: Arc<dyn MetaServerClient>,
    cache: Mutex<LruCache<InodeId, Inode>>,
}

impl InodeCache {
    pub fn new(meta_client: Arc<dyn MetaServerClient>) -> Self {
        Self {
            fsid: Mutex::new(0),
            meta_client,
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap())),
        }
    }

    /// Binds the cache to a mount's fsid. Infallible: there is nothing
    /// here that can fail.
    pub fn init(&self, fsid: FsId) {
        *self.fsid.lock().unwrap() = fsid;
    }

    fn fsid(&self) -> FsId {
        *self.fsid.lock().unwrap()
    }

    pub fn get_inode(&self, inodeid: InodeId) -> Result<Inode> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(inode) = cache.get(&inodeid) {
            return Ok(inode.clone());
        }
        let inode = self.meta_client.get_inode(self.fsid(), inodeid)?;
        cache.put(inodeid, inode.clone());
        Ok(inode)
    }

    pub fn create_inode(&self, param: &InodeParam) -> Result<Inode> {
        let inode = self.meta_client.create_inode(param)?;
        self.cache.lock().unwrap().put(inode.inodeid, inode.clone());
        Ok(inode)
    }

    /// The sole way to persist mutations.
    pub fn update_inode(&self, inode: &Inode) -> Result<()> {
        self.meta_client.update_inode(inode)?;
        self.cache.lock().unwrap().put(inode.inodeid, inode.clone());
        Ok(())
    }

    pub fn delete_inode(&self, inodeid: InodeId) -> Result<()> {
        self.meta_client.delete_inode(self.fsid(), inodeid)?;
        self.cache.lock().unwrap().pop(&inodeid);
        Ok(())
    }

    /// `forget`: drop this inode from the cache without contacting the
    /// metaserver. Purely an eviction hint.
    pub fn forget(&self, inodeid: InodeId) {
        self.cache.lock().unwrap().pop(&inodeid);
    }
}
