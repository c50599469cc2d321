//! Archive staging - packaging, extraction and scratch directories

mod stager;
mod staging;

pub use stager::{find_content_root, pack_directory, unpack_archive, unpack_with, UnpackOptions};
pub use staging::StagingArea;
