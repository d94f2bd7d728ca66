use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    /// The viewport reported a degenerate size, e.g. before the first layout
    /// pass. Callers treat this as "no surface yet" rather than a failure.
    #[error("canvas surface dimensions must be non-zero (got {width}x{height})")]
    EmptySurface { width: u32, height: u32 },
}
