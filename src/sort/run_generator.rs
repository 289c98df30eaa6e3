//! Run generation: reads the input tape in bounded chunks, sorts each chunk
//! in memory, and distributes the sorted runs across a small ring of
//! temporary tapes, cascading a k-way merge whenever the ring fills.

use std::path::{Path, PathBuf};

use buff::AsBytes;
use tracing::{debug, trace};

use crate::{
    config::{CHUNK_BYTES, MAX_TMP},
    error::TapeResult,
    latency::LatencyPolicy,
    tape::{Mode, Tape},
};

use super::merger::merge_tapes;

/// The temporary tapes left holding unmerged runs, and the total number of
/// elements read from the input tape.
pub struct RunGenerationOutcome {
    pub active: Vec<PathBuf>,
    pub total_elements: u64,
}

/// Reads `input_path` in chunks of up to `CHUNK_BYTES / size_of::<T>()`
/// elements, sorts each chunk in memory, and appends it as a run to the
/// next slot in a cyclic ring of at most [`MAX_TMP`] temporary tapes under
/// `tmp_dir`. When the ring is full, all active runs are cascaded into a
/// single carry tape (alternating between two merge destinations so that a
/// merge never overwrites the file it is still reading) before the next run
/// is emitted.
pub fn generate_runs<T, const N: usize>(
    input_path: &Path,
    tmp_dir: &Path,
    latency: LatencyPolicy,
    page_size: usize,
) -> TapeResult<RunGenerationOutcome>
where
    T: AsBytes<Repr = [u8; N]> + Copy + Ord,
{
    let chunk_elems = (CHUNK_BYTES / N).max(1);
    generate_runs_with_chunk_size::<T, N>(input_path, tmp_dir, latency, page_size, chunk_elems)
}

/// As [`generate_runs`], but with an explicit chunk size in elements rather
/// than the fixed [`CHUNK_BYTES`] budget. Exists so tests can force the
/// cascade-merge path without materialising multi-megabyte fixtures.
pub(crate) fn generate_runs_with_chunk_size<T, const N: usize>(
    input_path: &Path,
    tmp_dir: &Path,
    latency: LatencyPolicy,
    page_size: usize,
    chunk_elems: usize,
) -> TapeResult<RunGenerationOutcome>
where
    T: AsBytes<Repr = [u8; N]> + Copy + Ord,
{
    let ring: Vec<PathBuf> = (0..MAX_TMP)
        .map(|i| tmp_dir.join(format!("tape_{i}.bin")))
        .collect();

    let mut active: Vec<PathBuf> = Vec::new();
    let mut ring_idx: usize = 0;
    let mut merge_cycle: usize = 0;
    let mut total_elements: u64 = 0;

    let mut input = Tape::<T, N>::open_with(input_path, Mode::Read, latency, page_size)?;

    loop {
        if active.len() >= MAX_TMP {
            let merged = tmp_dir.join(format!("merged_{}.bin", merge_cycle % 2));
            debug!(merge_cycle, tapes = active.len(), "cascading merge");
            merge_tapes::<T, N, _>(&active, &merged, latency, page_size)?;
            active.clear();
            active.push(merged);
            merge_cycle += 1;
            continue;
        }

        let mut buf: Vec<T> = Vec::with_capacity(chunk_elems);
        for _ in 0..chunk_elems {
            // Any tape failure here — a real I/O error or simply reaching
            // the end of the input — is treated as exhaustion of this
            // chunk; only the merger and sort driver distinguish the two.
            match input.read() {
                Ok(value) => buf.push(value),
                Err(_) => break,
            }
            if input.step_forward().is_err() {
                break;
            }
        }

        if buf.is_empty() {
            break;
        }
        total_elements += buf.len() as u64;

        buf.sort_unstable();

        let dest = ring[ring_idx % ring.len()].clone();
        ring_idx += 1;
        active.push(dest.clone());
        trace!(elements = buf.len(), dest = %dest.display(), "writing run");

        let mut out = Tape::<T, N>::open_with(&dest, Mode::WriteTruncate, latency, page_size)?;
        for (i, value) in buf.iter().enumerate() {
            if i > 0 {
                out.step_forward()?;
            }
            out.write(*value);
        }
        out.close()?;
    }

    Ok(RunGenerationOutcome {
        active,
        total_elements,
    })
}
