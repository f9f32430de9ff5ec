use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tocalign",
    version,
    about = "Chapter and subsection extraction from PDFs via printed-TOC alignment"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump per-chapter text files using the PDF outline
    Extract(ExtractArgs),
    /// Cut the printed TOC dump into per-chapter slices
    Slice(SliceArgs),
    /// Align TOC slices against chapter text and write section JSON
    Sections(SectionsArgs),
    /// Upsert section JSON artifacts into the SQLite index
    Ingest(IngestArgs),
    /// Run extract, slice, sections, and ingest in order
    Run(RunArgs),
    /// Report work-dir artifacts and database totals
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long, default_value = ".cache/tocalign")]
    pub work_dir: PathBuf,

    #[arg(long)]
    pub chapters_dir: Option<PathBuf>,

    /// Collect every outline level instead of top-level chapters only
    #[arg(long, default_value_t = false)]
    pub all_outline_levels: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SliceArgs {
    #[arg(long, default_value = ".cache/tocalign")]
    pub work_dir: PathBuf,

    #[arg(long)]
    pub chapters_dir: Option<PathBuf>,

    #[arg(long)]
    pub toc_dir: Option<PathBuf>,

    /// Smallest TOC gap between adjacent chapter positions worth slicing
    #[arg(long, default_value_t = 5)]
    pub min_slice_lines: usize,
}

#[derive(Args, Debug, Clone)]
pub struct SectionsArgs {
    #[arg(long, default_value = ".cache/tocalign")]
    pub work_dir: PathBuf,

    #[arg(long)]
    pub chapters_dir: Option<PathBuf>,

    #[arg(long)]
    pub toc_dir: Option<PathBuf>,

    #[arg(long)]
    pub sections_dir: Option<PathBuf>,

    /// Minimum body-line gap between accepted section starts
    #[arg(long, default_value_t = 5)]
    pub min_gap: usize,

    /// Uppercase-letter ratio above which a TOC line is treated as a header
    #[arg(long, default_value_t = 0.6)]
    pub uppercase_ratio: f64,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long, default_value = ".cache/tocalign")]
    pub work_dir: PathBuf,

    #[arg(long)]
    pub sections_dir: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long, default_value = ".cache/tocalign")]
    pub work_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub all_outline_levels: bool,

    #[arg(long, default_value_t = 5)]
    pub min_slice_lines: usize,

    #[arg(long, default_value_t = 5)]
    pub min_gap: usize,

    #[arg(long, default_value_t = 0.6)]
    pub uppercase_ratio: f64,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/tocalign")]
    pub work_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

/// Derived locations inside the work directory. Every command can override
/// its own piece, but the defaults keep one run's artifacts together.
#[derive(Debug, Clone)]
pub struct WorkPaths {
    pub chapters_dir: PathBuf,
    pub toc_dir: PathBuf,
    pub sections_dir: PathBuf,
    pub db_path: PathBuf,
    pub manifest_dir: PathBuf,
}

impl WorkPaths {
    pub fn for_work_dir(work_dir: &std::path::Path) -> Self {
        Self {
            chapters_dir: work_dir.join("chapters"),
            toc_dir: work_dir.join("toc_sections"),
            sections_dir: work_dir.join("sections"),
            db_path: work_dir.join("tocalign_index.sqlite"),
            manifest_dir: work_dir.join("manifests"),
        }
    }
}
