//! Output format selection, mirroring the teacher's `OutputFormat`
//! (`cli/src/output.rs`) scaled down to the two formats this CLI needs.

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
