pub mod master;
pub mod rewriter;

pub use master::{BandwidthTable, MasterPlaylistBuilder};
pub use rewriter::rewrite_manifest;
