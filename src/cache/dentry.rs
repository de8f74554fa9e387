// SPDX-License-Identifier: MPL-2.0
//! `DentryCache`: cache + write-through proxy for dentries, plus
//! paginated `list_dentry`.
//!
//! A nested `HashMap<parent, HashMap<name, Dentry>>` behind one mutex,
//! kept rather than flattened to `(parent, name) -> Dentry`, since
//! `list_dentry` needs to enumerate one parent's children without
//! scanning the whole cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{Dentry, FsId, InodeId, K_MAX_LIST_DENTRY_COUNT};
use crate::rpc::MetaServerClient;

pub struct DentryCache {
    fsid: Mutex<FsId>,
    meta_client: Arc<dyn MetaServerClient>,
    cache: Mutex<HashMap<InodeId, HashMap<Vec<u8>, Dentry>>>,
}

impl DentryCache {
    pub fn new(meta_client: Arc<dyn MetaServerClient>) -> Self {
        Self {
            fsid: Mutex::new(0),
            meta_client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn init(&self, fsid: FsId) {
        *self.fsid.lock().unwrap() = fsid;
    }

    fn fsid(&self) -> FsId {
        *self.fsid.lock().unwrap()
    }

    pub fn get_dentry(&self, parent: InodeId, name: &[u8]) -> Result<Dentry> {
        {
            let cache = self.cache.lock().unwrap();
            if let Some(d) = cache.get(&parent).and_then(|m| m.get(name)) {
                return Ok(d.clone());
            }
        }
        let dentry = self.meta_client.get_dentry(self.fsid(), parent, name)?;
        self.cache
            .lock()
            .unwrap()
            .entry(parent)
            .or_default()
            .insert(name.to_vec(), dentry.clone());
        Ok(dentry)
    }

    pub fn create_dentry(&self, dentry: &Dentry) -> Result<()> {
        self.meta_client.create_dentry(dentry)?;
        self.cache
            .lock()
            .unwrap()
            .entry(dentry.parent_inode_id)
            .or_default()
            .insert(dentry.name.clone(), dentry.clone());
        Ok(())
    }

    pub fn delete_dentry(&self, parent: InodeId, name: &[u8]) -> Result<()> {
        self.meta_client.delete_dentry(self.fsid(), parent, name)?;
        if let Some(children) = self.cache.lock().unwrap().get_mut(&parent) {
            children.remove(name);
        }
        Ok(())
    }

    /// Paginated pull from the metaserver. Does **not** warm the cache:
    /// listings can be large, and warming would invite cache thrash.
    pub fn list_dentry(&self, parent: InodeId) -> Result<Vec<Dentry>> {
        let mut out = Vec::new();
        let mut last: Vec<u8> = Vec::new();
        loop {
            let page = match self
                .meta_client
                .list_dentry(self.fsid(), parent, &last, K_MAX_LIST_DENTRY_COUNT)
            {
                Ok(page) => page,
                Err(e) if e.is_notexist() && out.is_empty() && last.is_empty() => return Ok(Vec::new()),
                Err(e) => return Err(e),
            };
            let page_len = page.len();
            if let Some(tail) = page.last() {
                last = tail.name.clone();
            }
            out.extend(page);
            if page_len < K_MAX_LIST_DENTRY_COUNT {
                break;
            }
        }
        Ok(out)
    }
}
