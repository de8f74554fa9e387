// SPDX-License-Identifier: MPL-2.0
//! Core data model: `FsInfo`, `Inode`, `VolumeExtent`, `Dentry`, and the
//! small value types the extent pipeline and space client trade.
//!
//! Field names follow the wire protocol's message fields so a reader
//! mapping this crate back onto the wire format does not have to guess
//! at renames.

use std::time::{SystemTime, UNIX_EPOCH};

pub type FsId = u32;
pub type InodeId = u64;

/// `FsType`: which data backend a mount is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsType {
    Block,
    Object,
}

/// Parses the `"curve"`/`"s3"` strings used in the mount option
/// environment, not the Rust variant names.
impl<'de> serde::Deserialize<'de> for FsType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "curve" => Ok(FsType::Block),
            "s3" => Ok(FsType::Object),
            other => Err(serde::de::Error::custom(format!(
                "unrecognized fsType {other:?}, expected \"curve\" or \"s3\""
            ))),
        }
    }
}

/// The volume descriptor registered with a `Block`-typed filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub volume_size: u64,
    pub block_size: u64,
    pub name: String,
    pub user: String,
}

/// The S3-compatible bucket binding registered with an `Object`-typed
/// filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Info {
    pub bucket: String,
    pub endpoint: String,
    pub block_size: u64,
}

/// Backend-specific detail carried alongside `FsInfo`. Paired with
/// `FsType` by construction rather than left as two independently
/// optional fields, so a `Block` filesystem can never be missing its
/// `Volume` nor carry a stray `S3Info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsDetail {
    Block(Volume),
    Object(S3Info),
}

/// Per-mount identity, owned by `MountLifecycle` for the mount's lifetime
/// and shared (read-only after `init`) with every data-path call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsInfo {
    pub fsid: FsId,
    pub fsname: String,
    pub detail: FsDetail,
}

impl FsInfo {
    pub fn fs_type(&self) -> FsType {
        match &self.detail {
            FsDetail::Block(_) => FsType::Block,
            FsDetail::Object(_) => FsType::Object,
        }
    }
}

/// `FsFileType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// POSIX-ish stat fields carried on every `Inode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatAttr {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
}

impl StatAttr {
    pub fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Backend-specific payload an `Inode` carries. Mutually exclusive: a
/// directory never carries a volume extent list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeData {
    /// Directories and object-backed files carry no volume extents.
    None,
    Volume(VolumeExtentList),
    /// The link target of a `Symlink` inode.
    Symlink(Vec<u8>),
}

/// The authoritative-at-the-metaserver, working-copy-in-cache inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub inodeid: InodeId,
    pub fsid: FsId,
    pub length: u64,
    pub file_type: FileType,
    pub attr: StatAttr,
    pub data: InodeData,
}

impl Inode {
    pub fn extents(&self) -> Option<&VolumeExtentList> {
        match &self.data {
            InodeData::Volume(list) => Some(list),
            _ => None,
        }
    }

    pub fn extents_mut(&mut self) -> Option<&mut VolumeExtentList> {
        match &mut self.data {
            InodeData::Volume(list) => Some(list),
            _ => None,
        }
    }
}

/// One contiguous logical-to-physical mapping on a block-backed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeExtent {
    pub fs_offset: u64,
    pub volume_offset: u64,
    pub length: u64,
    pub is_written: bool,
}

impl VolumeExtent {
    pub fn fs_end(&self) -> u64 {
        self.fs_offset + self.length
    }
}

/// Ordered, non-overlapping list of `VolumeExtent`s backing one inode.
/// Invariants are maintained by `ExtentManager`, never mutated directly
/// by callers.
pub type VolumeExtentList = Vec<VolumeExtent>;

/// A directory entry: `(fsid, parent_inode_id, name)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dentry {
    pub fsid: FsId,
    pub parent_inode_id: InodeId,
    pub name: Vec<u8>,
    pub inodeid: InodeId,
    pub dentry_type: FileType,
}

/// A requested-but-not-yet-allocated volume range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentAllocInfo {
    pub l_offset: u64,
    pub p_offset_left: u64,
    pub length: u64,
}

/// One allocation the space service handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub p_offset: u64,
    pub length: u64,
}

/// A physical range to read or write on the block device, annotated with
/// whether it has ever been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PExtent {
    pub p_offset: u64,
    pub length: u64,
    pub un_written: bool,
}

/// Placement-policy hint passed to the space service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocateType {
    None,
    Small,
    Big,
}

/// Threshold above which a write is tagged `Big`.
pub const K_BIG_FILE_SIZE: u64 = 1024 * 1024;

/// Allocator granularity.
pub const K_MIN_ALLOC_SIZE: u64 = 4096;

/// Dentry-listing page size.
pub const K_MAX_LIST_DENTRY_COUNT: usize = 1024;

/// Parameters for creating a new inode at the metaserver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeParam {
    pub fsid: FsId,
    pub file_type: FileType,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u32,
    pub symlink_target: Option<Vec<u8>>,
}

/// Mask bits for `setattr`, matching the POSIX `to_set` bitmask
/// convention the kernel bridge forwards.
bitflags::bitflags! {
    pub struct SetAttrMask: u32 {
        const MODE  = 1 << 0;
        const UID   = 1 << 1;
        const GID   = 1 << 2;
        const SIZE  = 1 << 3;
        const ATIME = 1 << 4;
        const MTIME = 1 << 5;
        const CTIME = 1 << 6;
    }
}

/// Aggregate volume/space stats for `statfs`. The core does not track
/// live usage (no quota accounting), so `free_blocks` reports the
/// backend's capacity rather than an accounted remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStat {
    pub block_size: u64,
    pub total_blocks: u64,
    pub free_blocks: u64,
}

/// A `setattr` request: only fields whose bit is set in `mask` are
/// applied, each masked individually.
#[derive(Debug, Clone, Default)]
pub struct SetAttrRequest {
    pub mask: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
}

impl SetAttrRequest {
    pub fn mask(&self) -> SetAttrMask {
        SetAttrMask::from_bits_truncate(self.mask)
    }
}
