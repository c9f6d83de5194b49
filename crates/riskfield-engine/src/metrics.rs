//! Per-tick performance metrics for the solver.
//!
//! [`StepMetrics`] captures timing and ingestion counts for a single
//! tick. Comparing `total_us` to the desired tick period is how a caller
//! detects that it is falling behind real time.

/// Timing and bookkeeping collected during a single tick.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire tick, in microseconds.
    pub total_us: u64,
    /// Time spent synthesizing the source field, in microseconds.
    pub source_us: u64,
    /// Time spent in the field integrator, in microseconds.
    pub integrate_us: u64,
    /// Time spent smoothing and publishing the snapshot, in microseconds.
    /// Zero when nothing is subscribed to the shared snapshot.
    pub postprocess_us: u64,
    /// Integration sub-steps taken this tick.
    pub substeps: u32,
    /// Observations that contributed a source kernel.
    pub accepted_observations: u32,
    /// Observations dropped as invalid or duplicated.
    pub dropped_observations: u32,
    /// Activity memory entries alive after the tick.
    pub active_memories: u32,
    /// Activity memory entries evicted this tick.
    pub evicted_memories: u32,
}
