//! Top-level orchestration: run generation followed by a final merge,
//! scoped to an ephemeral scratch directory.

use std::path::Path;

use buff::AsBytes;
use tempfile::TempDir;
use tracing::info;

use crate::{
    error::{Error, TapeResult},
    latency::LatencyPolicy,
};

use super::{merger::merge_tapes, run_generator::generate_runs};

fn new_scratch_dir() -> TapeResult<TempDir> {
    TempDir::new().map_err(|err| Error::Filesystem(err.to_string()))
}

/// Sorts the fixed-width records in `input_path` into `output_path`.
///
/// Scratch tapes live in a process-private temporary directory created with
/// [`tempfile::TempDir`] and removed on return, success or failure alike. An
/// empty input leaves `output_path` untouched — callers that need an empty
/// output file should create one themselves.
pub fn sort_file<T, const N: usize>(
    input_path: &Path,
    output_path: &Path,
    latency: LatencyPolicy,
    page_size: usize,
) -> TapeResult<()>
where
    T: AsBytes<Repr = [u8; N]> + Copy + Ord,
{
    let scratch = new_scratch_dir()?;

    let outcome = generate_runs::<T, N>(input_path, scratch.path(), latency, page_size)?;
    info!(
        total_elements = outcome.total_elements,
        runs = outcome.active.len(),
        "run generation complete"
    );

    if outcome.active.is_empty() {
        return Ok(());
    }

    merge_tapes::<T, N, _>(&outcome.active, output_path, latency, page_size)?;
    info!(output = %output_path.display(), "sort complete");

    Ok(())
}

#[cfg(test)]
fn sort_file_with_chunk_size<T, const N: usize>(
    input_path: &Path,
    output_path: &Path,
    latency: LatencyPolicy,
    page_size: usize,
    chunk_elems: usize,
) -> TapeResult<()>
where
    T: AsBytes<Repr = [u8; N]> + Copy + Ord,
{
    let scratch = new_scratch_dir()?;

    let outcome = super::run_generator::generate_runs_with_chunk_size::<T, N>(
        input_path,
        scratch.path(),
        latency,
        page_size,
        chunk_elems,
    )?;

    if outcome.active.is_empty() {
        return Ok(());
    }

    merge_tapes::<T, N, _>(&outcome.active, output_path, latency, page_size)?;
    Ok(())
}
