/// Default page size, in elements, for a freshly opened [`Tape`](crate::tape::Tape).
///
/// Corresponds to the `1 << 7` default in the original `Tape` constructor.
pub const DEFAULT_PAGE_SIZE: usize = 128;

/// Maximum number of temporary tapes kept active by the run generator before
/// a cascade merge collapses them.
pub const MAX_TMP: usize = 8;

/// Target size, in bytes, of a single in-memory sort chunk.
// TODO: Make this configurable; 2 MiB is a reasonable default for the kind
// of element widths this crate targets (4 and 8 byte integers).
pub const CHUNK_BYTES: usize = 2 * 1024 * 1024;
