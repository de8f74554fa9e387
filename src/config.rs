// SPDX-License-Identifier: MPL-2.0
//! Mount-option environment. Parsing the host's config file format is a
//! collaborator's job; this module only defines the shape a collaborator
//! deserializes into.

use serde::Deserialize;

use crate::model::FsType;

/// Backend-specific block-device options, opaque to the core beyond
/// being handed to `BlockClient::init`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BdevOpt {
    #[serde(default)]
    pub config_path: Option<String>,
}

/// Backend-specific S3 client options, opaque to the core beyond being
/// handed to the object adaptor during construction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Opt {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

/// The mount option environment recognized by `MountLifecycle::init`.
#[derive(Debug, Clone, Deserialize)]
pub struct MountOptions {
    pub mount_point: String,
    pub volume: String,
    #[serde(default)]
    pub fs_name: Option<String>,
    #[serde(default)]
    pub user: String,
    pub fs_type: FsType,
    #[serde(default)]
    pub bdev_opt: BdevOpt,
    #[serde(default)]
    pub s3_opt: S3Opt,
}

impl MountOptions {
    /// `fsName` defaults to `volume` when not set.
    pub fn fs_name(&self) -> &str {
        self.fs_name.as_deref().unwrap_or(&self.volume)
    }
}
