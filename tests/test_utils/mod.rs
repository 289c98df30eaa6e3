use std::path::Path;

use tapesort::{Mode, Tape};

/// Writes `values` to a fresh tape at `path`, one `write`/`step_forward` per
/// element (no trailing step).
#[allow(dead_code)]
pub fn write_tape(path: &Path, values: &[i32]) {
    let mut tape = Tape::<i32, 4>::open(path, Mode::WriteTruncate).unwrap();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            tape.step_forward().unwrap();
        }
        tape.write(*v);
    }
}

/// Reads every element of the tape at `path` back into a `Vec`, in order.
#[allow(dead_code)]
pub fn read_tape(path: &Path) -> Vec<i32> {
    let mut tape = Tape::<i32, 4>::open(path, Mode::Read).unwrap();
    let mut out = Vec::new();
    if tape.len() == 0 {
        return out;
    }
    loop {
        out.push(tape.read().unwrap());
        if tape.position() + 1 >= tape.len() {
            break;
        }
        tape.step_forward().unwrap();
    }
    out
}
