//! The [`Tape`] abstraction: a buffered, typed, random-access view over a
//! file on disk, emulating a single-head magnetic tape. Exactly one
//! fixed-size page is resident in memory at a time; the page is loaded
//! lazily and flushed back to disk at page boundaries (and on close).

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use buff::{AsBytes, Buff};
use tracing::debug;

use crate::{
    config::DEFAULT_PAGE_SIZE,
    error::{Error, TapeResult},
    latency::LatencyPolicy,
};

/// How a [`Tape`] opens its backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read-only. The file must already exist.
    Read,
    /// Read-write, truncating any existing contents to an empty tape.
    WriteTruncate,
    /// Read-write, preserving existing contents.
    ReadWrite,
}

/// A random-access, page-buffered view over a flat file of fixed-width
/// elements of type `T` (`N` bytes each, in the host's native byte order).
///
/// The head sits at an absolute element position `p = s*P + i`, where `s` is
/// the resident page's slice index and `i` is the intra-page index. `p` is
/// always in `[0, L]`, where `L` is the tape's logical length.
pub struct Tape<T, const N: usize>
where
    T: AsBytes<Repr = [u8; N]> + Copy,
{
    file: File,
    page_size: usize,
    len: u64,
    slice: u64,
    idx: usize,
    buffer: Vec<T>,
    dirty: bool,
    latency: LatencyPolicy,
}

impl<T, const N: usize> Tape<T, N>
where
    T: AsBytes<Repr = [u8; N]> + Copy,
{
    /// Opens `path` with the default page size (128 elements) and no
    /// latency injection.
    pub fn open(path: &Path, mode: Mode) -> TapeResult<Self> {
        Self::open_with(path, mode, LatencyPolicy::none(), DEFAULT_PAGE_SIZE)
    }

    /// Opens `path` with an explicit latency policy and page size.
    pub fn open_with(
        path: &Path,
        mode: Mode,
        latency: LatencyPolicy,
        page_size: usize,
    ) -> TapeResult<Self> {
        assert!(page_size > 0, "page size must be positive");

        let mut options = OpenOptions::new();
        match mode {
            Mode::Read => {
                options.read(true);
            }
            Mode::WriteTruncate => {
                options.read(true).write(true).create(true).truncate(true);
            }
            Mode::ReadWrite => {
                options.read(true).write(true).create(true);
            }
        }
        let mut file = options.open(path)?;

        let size_bytes = file.seek(SeekFrom::End(0))?;
        let len = size_bytes / N as u64;
        file.seek(SeekFrom::Start(0))?;

        let zero = T::deserialize([0u8; N]);
        let mut tape = Tape {
            file,
            page_size,
            len,
            slice: 0,
            idx: 0,
            buffer: vec![zero; page_size],
            dirty: false,
            latency,
        };
        tape.load_slice()?;
        Ok(tape)
    }

    /// The current absolute head position.
    pub fn position(&self) -> u64 {
        self.slice * self.page_size as u64 + self.idx as u64
    }

    /// The tape's logical length, in elements.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the element under the head. Fails if the head is at or past
    /// the logical length.
    pub fn read(&mut self) -> TapeResult<T> {
        self.latency.sleep_read_write();
        if self.position() >= self.len {
            return Err(Error::RangeViolation("read at or past the end of the tape"));
        }
        Ok(self.buffer[self.idx])
    }

    /// Writes `value` under the head, marking the page dirty. If the head
    /// sits at or past the current length, the tape is extended. This never
    /// fails; I/O errors are only observable at the next flush.
    pub fn write(&mut self, value: T) {
        self.latency.sleep_read_write();
        self.buffer[self.idx] = value;
        self.dirty = true;
        let pos = self.position();
        if pos >= self.len {
            self.len = pos + 1;
        }
    }

    /// Advances the head by one element, flushing and loading the next page
    /// on a page-boundary crossing. Reaching `p = L` is not itself an
    /// error — the next `read` will fail, but a `write` following this step
    /// is valid and extends the tape.
    pub fn step_forward(&mut self) -> TapeResult<()> {
        self.latency.sleep_step();
        self.idx += 1;
        if self.idx == self.page_size {
            self.flush_buffer()?;
            self.slice += 1;
            self.idx = 0;
            self.load_slice()?;
        }
        Ok(())
    }

    /// Moves the head back by one element. Fails at position 0.
    pub fn step_backward(&mut self) -> TapeResult<()> {
        self.latency.sleep_step();
        if self.position() == 0 {
            return Err(Error::RangeViolation(
                "cannot step backward from position 0",
            ));
        }
        if self.idx == 0 {
            self.flush_buffer()?;
            self.slice -= 1;
            self.idx = self.page_size - 1;
            self.load_slice()?;
        } else {
            self.idx -= 1;
        }
        Ok(())
    }

    /// Moves the head by a signed number of steps from the current
    /// position. Always flushes the current page first, even for `steps ==
    /// 0` — jumps are a safe barrier. Fails if the destination would fall
    /// outside `[0, L)`.
    pub fn jump(&mut self, steps: i64) -> TapeResult<()> {
        self.latency.sleep_jump();
        self.flush_buffer()?;

        let pos = self.position();
        if steps < 0 && steps.unsigned_abs() > pos {
            return Err(Error::RangeViolation(
                "cannot jump before the start of the tape",
            ));
        }

        let new_pos = (pos as i64)
            .checked_add(steps)
            .ok_or(Error::RangeViolation("jump target overflows tape position"))?;
        if new_pos < 0 || new_pos as u64 >= self.len {
            return Err(Error::RangeViolation(
                "cannot jump past the end of the tape",
            ));
        }
        let new_pos = new_pos as u64;

        let new_slice = new_pos / self.page_size as u64;
        let new_idx = (new_pos % self.page_size as u64) as usize;
        if new_slice != self.slice {
            self.slice = new_slice;
            self.idx = new_idx;
            self.load_slice()?;
        } else {
            self.idx = new_idx;
        }
        Ok(())
    }

    /// Explicitly flushes and closes the tape, surfacing any final I/O
    /// error. Equivalent to dropping the tape, except that the error is not
    /// swallowed.
    pub fn close(mut self) -> TapeResult<()> {
        self.flush_buffer()
    }

    fn load_slice(&mut self) -> TapeResult<()> {
        let byte_offset = self.slice * self.page_size as u64 * N as u64;
        self.file.seek(SeekFrom::Start(byte_offset))?;

        let elems_remaining = self.len.saturating_sub(self.slice * self.page_size as u64);
        let can_read_elems = (self.page_size as u64).min(elems_remaining) as usize;

        let mut raw = vec![0u8; self.page_size * N];
        let mut filled = 0;
        while filled < can_read_elems * N {
            let n = self.file.read(&mut raw[filled..can_read_elems * N])?;
            if n == 0 {
                // File shorter than `L` suggests; the rest stays zero-filled.
                break;
            }
            filled += n;
        }

        let mut reader = Buff::new(&mut raw);
        for slot in self.buffer.iter_mut() {
            *slot = reader.read::<N, T>();
        }
        self.dirty = false;
        debug!(slice = self.slice, can_read_elems, "loaded tape page");
        Ok(())
    }

    fn flush_buffer(&mut self) -> TapeResult<()> {
        if !self.dirty {
            return Ok(());
        }

        let byte_offset = self.slice * self.page_size as u64 * N as u64;
        let elems_remaining = self.len.saturating_sub(self.slice * self.page_size as u64);
        let can_write_elems = (self.page_size as u64).min(elems_remaining) as usize;

        let mut raw = vec![0u8; can_write_elems * N];
        {
            let mut writer = Buff::new(&mut raw);
            for slot in &self.buffer[..can_write_elems] {
                writer.write(*slot);
            }
        }

        self.file.seek(SeekFrom::Start(byte_offset))?;
        self.file.write_all(&raw)?;
        self.dirty = false;
        debug!(slice = self.slice, can_write_elems, "flushed tape page");
        Ok(())
    }
}

impl<T, const N: usize> Drop for Tape<T, N>
where
    T: AsBytes<Repr = [u8; N]> + Copy,
{
    fn drop(&mut self) {
        if let Err(error) = self.flush_buffer() {
            tracing::warn!(%error, "failed to flush tape page on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn write_then_overwrite_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");

        {
            let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
            tape.write(2);
            tape.write(1);
            tape.step_forward().unwrap();
            tape.write(2);
            tape.step_forward().unwrap();
            tape.write(3);
        }

        let mut tape = Tape::<i32, 4>::open(&path, Mode::Read).unwrap();
        assert_eq!(tape.read().unwrap(), 1);
        tape.step_forward().unwrap();
        assert_eq!(tape.read().unwrap(), 2);
        tape.step_forward().unwrap();
        assert_eq!(tape.read().unwrap(), 3);
    }

    #[test]
    fn read_past_end_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");

        {
            let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
            tape.write(1);
            tape.step_forward().unwrap();
            tape.write(2);
            tape.step_forward().unwrap();
            tape.write(3);
        }

        let mut tape = Tape::<i32, 4>::open(&path, Mode::Read).unwrap();
        assert_eq!(tape.read().unwrap(), 1);
        assert_eq!(tape.read().unwrap(), 1);
        tape.step_forward().unwrap();
        assert_eq!(tape.read().unwrap(), 2);
        tape.step_forward().unwrap();
        assert_eq!(tape.read().unwrap(), 3);
        tape.step_forward().unwrap();
        assert!(tape.read().is_err());
    }

    #[test]
    fn jumps_and_steps_agree_with_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");

        {
            let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
            for v in 0..512i32 {
                if v > 0 {
                    tape.step_forward().unwrap();
                }
                tape.write(v);
            }
        }

        let mut tape = Tape::<i32, 4>::open(&path, Mode::ReadWrite).unwrap();
        assert_eq!(tape.read().unwrap(), 0);
        tape.jump(19).unwrap();
        assert_eq!(tape.read().unwrap(), 19);
        tape.step_forward().unwrap();
        assert_eq!(tape.read().unwrap(), 20);
        tape.step_backward().unwrap();
        assert_eq!(tape.read().unwrap(), 19);
        tape.jump(190).unwrap();
        assert_eq!(tape.read().unwrap(), 209);
        tape.jump(-45).unwrap();
        assert_eq!(tape.read().unwrap(), 164);
        tape.write(1337);
        tape.jump(200).unwrap();
        assert_eq!(tape.read().unwrap(), 364);
        tape.jump(-200).unwrap();
        assert_eq!(tape.read().unwrap(), 1337);
        assert!(tape.jump(2000).is_err());
    }

    #[test]
    fn step_backward_at_zero_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");
        let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
        tape.write(1);
        assert!(tape.step_backward().is_err());
    }

    #[test]
    fn jump_to_exactly_zero_succeeds_but_one_past_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");

        let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
        for v in 0..4i32 {
            if v > 0 {
                tape.step_forward().unwrap();
            }
            tape.write(v);
        }
        tape.jump(-3).unwrap();
        assert_eq!(tape.position(), 0);

        assert!(tape.jump(-1).is_err());
    }

    #[test]
    fn jump_to_last_element_succeeds_jump_to_length_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");

        let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
        for v in 0..4i32 {
            if v > 0 {
                tape.step_forward().unwrap();
            }
            tape.write(v);
        }
        tape.jump(-3).unwrap();
        assert!(tape.jump(3).is_ok());
        assert_eq!(tape.read().unwrap(), 3);

        tape.jump(-3).unwrap();
        assert!(tape.jump(4).is_err());
    }

    #[test]
    fn write_across_page_boundary_survives_jump_away_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");

        // Page size 4 forces a slice boundary well within this test.
        let mut tape =
            Tape::<i32, 4>::open_with(&path, Mode::WriteTruncate, LatencyPolicy::none(), 4)
                .unwrap();
        for v in 0..16i32 {
            if v > 0 {
                tape.step_forward().unwrap();
            }
            tape.write(v);
        }

        tape.jump(-10).unwrap(); // now on an earlier slice
        tape.write(999);
        tape.jump(10).unwrap(); // jump forward to a different slice
        assert_eq!(tape.read().unwrap(), 15);
        tape.jump(-10).unwrap(); // jump back
        assert_eq!(tape.read().unwrap(), 999);
    }

    #[test]
    fn step_forward_then_backward_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");
        let mut tape =
            Tape::<i32, 4>::open_with(&path, Mode::WriteTruncate, LatencyPolicy::none(), 4)
                .unwrap();
        for v in 0..9i32 {
            if v > 0 {
                tape.step_forward().unwrap();
            }
            tape.write(v);
        }
        tape.jump(-4).unwrap();
        let before = tape.position();
        tape.step_forward().unwrap();
        tape.step_backward().unwrap();
        assert_eq!(tape.position(), before);
    }

    #[test]
    fn write_past_end_extends_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");
        let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
        assert_eq!(tape.len(), 0);
        tape.write(42);
        assert_eq!(tape.len(), 1);
    }

    #[test]
    fn randomized_stress_matches_reference_model() {
        use rand::{rngs::SmallRng, Rng, SeedableRng};

        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "tape.bin");
        let mut rng = SmallRng::seed_from_u64(42);

        let mut reference: Vec<i32> = vec![0; 4096];
        let mut pos: i64 = 0;

        let mut tape = Tape::<i32, 4>::open(&path, Mode::WriteTruncate).unwrap();
        for v in reference.iter() {
            tape.write(*v);
            if (pos as usize) + 1 < reference.len() {
                tape.step_forward().unwrap();
                pos += 1;
            }
        }
        tape.jump(-pos).unwrap();
        pos = 0;

        for _ in 0..20_000 {
            match rng.gen_range(0..5) {
                0 => {
                    let v = rng.gen::<i32>();
                    tape.write(v);
                    reference[pos as usize] = v;
                }
                1 => {
                    let v = tape.read().unwrap();
                    assert_eq!(v, reference[pos as usize]);
                }
                2 if (pos as usize) + 1 < reference.len() => {
                    tape.step_forward().unwrap();
                    pos += 1;
                }
                3 if pos > 0 => {
                    tape.step_backward().unwrap();
                    pos -= 1;
                }
                _ => {
                    let delta = rng.gen_range(-100..=100i64);
                    let target = pos + delta;
                    if target < 0 || target as usize >= reference.len() {
                        continue;
                    }
                    tape.jump(delta).unwrap();
                    pos = target;
                    assert_eq!(tape.read().unwrap(), reference[pos as usize]);
                }
            }
        }
    }
}
