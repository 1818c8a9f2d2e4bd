// Reader configuration from command line arguments

use swmm_io::out::{AccessMode, ReaderConfig};

use crate::Cli;

impl From<&Cli> for ReaderConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            access: if cli.mmap {
                AccessMode::Mapped
            } else {
                AccessMode::Buffered
            },
            buffer_capacity: cli.buffer_size,
        }
    }
}
