use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Disk image, created when missing
    pub image: PathBuf,

    /// Number of blocks the image is resized to
    pub nblocks: usize,
}
