// SPDX-License-Identifier: MPL-2.0
//! Per-backend data-plane orchestration.

mod object;
mod volume;

pub use object::ObjectDataPath;
pub use volume::VolumeDataPath;
