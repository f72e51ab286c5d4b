#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// The session ran and was printed, but the report could not be saved.
    PersistenceFailed = 20,

    /// Invalid CLI/config/options (bad flags, invalid durations, malformed catalog, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (session could not launch, IO errors, unexpected invariants).
    RuntimeError = 40,

    /// A report id given to `compare` or `show` does not exist.
    NotFound = 50,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
