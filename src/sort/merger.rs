//! K-way merge of sorted input tapes into a single output tape, using a
//! min-heap keyed by each input's head element.

use std::{cmp::Reverse, collections::BinaryHeap, fs, path::Path};

use buff::AsBytes;

use crate::{
    error::{Error, TapeResult},
    latency::LatencyPolicy,
    tape::{Mode, Tape},
};

/// Merges `sources` (each assumed individually non-decreasing) into
/// `output`, which is opened in write-truncate mode.
///
/// - An empty source list is a no-op.
/// - A singleton source list is a byte-exact file copy — an optimisation
///   that bypasses the tape machinery entirely, preserving bytes exactly.
/// - Otherwise, every source is opened for reading; sources that fail to
///   open or yield an initial element (e.g. an empty tape) are silently
///   dropped, mirroring how a source's later exhaustion is handled mid-merge.
pub fn merge_tapes<T, const N: usize, P>(
    sources: &[P],
    output: &Path,
    latency: LatencyPolicy,
    page_size: usize,
) -> TapeResult<()>
where
    T: AsBytes<Repr = [u8; N]> + Copy + Ord,
    P: AsRef<Path>,
{
    if sources.is_empty() {
        return Ok(());
    }

    if sources.len() == 1 {
        fs::copy(sources[0].as_ref(), output).map_err(|err| Error::Filesystem(err.to_string()))?;
        return Ok(());
    }

    let mut heap: BinaryHeap<Reverse<(T, usize)>> = BinaryHeap::new();
    let mut inputs: Vec<Option<Tape<T, N>>> = Vec::with_capacity(sources.len());

    for path in sources {
        let opened = Tape::<T, N>::open_with(path.as_ref(), Mode::Read, latency, page_size)
            .ok()
            .and_then(|mut tape| match tape.read() {
                Ok(value) => Some((tape, value)),
                Err(_) => None,
            });

        match opened {
            Some((tape, value)) => {
                heap.push(Reverse((value, inputs.len())));
                inputs.push(Some(tape));
            }
            None => inputs.push(None),
        }
    }

    let mut out = Tape::<T, N>::open_with(output, Mode::WriteTruncate, latency, page_size)?;
    let mut first = true;

    while let Some(Reverse((value, source))) = heap.pop() {
        if !first {
            out.step_forward()?;
        }
        first = false;
        out.write(value);

        let exhausted = match inputs[source].as_mut() {
            Some(tape) => match tape.step_forward() {
                Ok(()) => match tape.read() {
                    Ok(next_value) => {
                        heap.push(Reverse((next_value, source)));
                        false
                    }
                    Err(_) => true,
                },
                Err(_) => true,
            },
            None => true,
        };
        if exhausted {
            inputs[source] = None;
        }
    }

    out.close()
}
