use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{RunArgs, WorkPaths};
use crate::commands::{extract, ingest, sections, slice};
use crate::model::{RunCounts, RunManifest};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

/// Runs the whole pipeline and records a manifest of what happened.
///
/// Extract and ingest failures are fatal. A slice or sections failure ends
/// the run early with status `partial`: the chapter dumps are still on disk
/// and usable, there is just nothing to align or persist.
pub fn run(args: RunArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let paths = WorkPaths::for_work_dir(&args.work_dir);
    let db_path = args.db_path.clone().unwrap_or(paths.db_path.clone());
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        paths
            .manifest_dir
            .join(format!("run_{}.json", utc_compact_string(started_ts)))
    });

    info!(pdf = %args.pdf.display(), run_id = %run_id, "starting pipeline run");

    let pdf_sha256 = sha256_file(&args.pdf)?;

    let mut counts = RunCounts::default();
    let mut warnings = Vec::new();
    let mut current_step = String::new();

    let outcome = run_phases(&args, &paths, &db_path, &mut current_step, &mut counts, &mut warnings);

    let (status, failed_step, failure_reason) = match &outcome {
        Ok(RunStatus::Completed) => ("completed".to_string(), None, None),
        Ok(RunStatus::Partial) => ("partial".to_string(), Some(current_step.clone()), None),
        Err(error) => (
            "failed".to_string(),
            Some(current_step.clone()),
            Some(format!("{error:#}")),
        ),
    };

    let manifest = RunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: status.clone(),
        started_at,
        finished_at: now_utc_string(),
        pdf_path: args.pdf.display().to_string(),
        pdf_sha256,
        work_dir: args.work_dir.display().to_string(),
        failed_step,
        failure_reason,
        counts,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), status = %status, "wrote run manifest");

    match outcome {
        Ok(_) => Ok(()),
        Err(error) => Err(error),
    }
}

enum RunStatus {
    Completed,
    Partial,
}

fn run_phases(
    args: &RunArgs,
    paths: &WorkPaths,
    db_path: &std::path::Path,
    current_step: &mut String,
    counts: &mut RunCounts,
    warnings: &mut Vec<String>,
) -> Result<RunStatus> {
    *current_step = "extract".to_string();
    let extract_outcome = extract::extract(&args.pdf, &paths.chapters_dir, args.all_outline_levels)?;
    counts.total_pages = extract_outcome.total_pages;
    counts.chapters_extracted = extract_outcome.written;
    warnings.extend(extract_outcome.warnings);

    *current_step = "slice".to_string();
    match slice::slice(&paths.chapters_dir, &paths.toc_dir, args.min_slice_lines) {
        Ok(slice_outcome) => {
            counts.toc_slices_written = slice_outcome.slices_written;
            warnings.extend(slice_outcome.warnings);
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "TOC slicing unavailable, stopping after extraction");
            warnings.push(format!("slice skipped: {error:#}"));
            return Ok(RunStatus::Partial);
        }
    }

    *current_step = "sections".to_string();
    match sections::build(
        &paths.chapters_dir,
        &paths.toc_dir,
        &paths.sections_dir,
        args.min_gap,
        args.uppercase_ratio,
    ) {
        Ok(sections_outcome) => {
            counts.section_files_written = sections_outcome.files_written;
            counts.sections_total = sections_outcome.sections_total;
            warnings.extend(sections_outcome.warnings);
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "section building failed, nothing to ingest");
            warnings.push(format!("sections skipped: {error:#}"));
            return Ok(RunStatus::Partial);
        }
    }

    *current_step = "ingest".to_string();
    let ingest_outcome = ingest::ingest(&paths.sections_dir, &args.pdf, db_path)?;
    counts.section_files_ingested = ingest_outcome.files;
    counts.records_changed = ingest_outcome.records_changed;
    warnings.extend(ingest_outcome.warnings);

    Ok(RunStatus::Completed)
}
