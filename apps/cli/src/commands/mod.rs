pub mod check;
pub mod run;

use aeris_pipeline::PipelineError;

/// Exit codes for operator triage: data/schema problems are distinguished
/// from I/O failures and from access failures.
pub const EXIT_OK: i32 = 0;
pub const EXIT_OTHER: i32 = 1;
pub const EXIT_DATA: i32 = 2;
pub const EXIT_IO: i32 = 3;
pub const EXIT_ACCESS: i32 = 4;
pub const EXIT_CANCELLED: i32 = 5;

/// Maps an originating error kind (see `TrainingError::kind`) to an exit code.
pub fn exit_code_for_kind(kind: &str) -> i32 {
    match kind {
        "schema" | "insufficient_data" | "invalid_params" => EXIT_DATA,
        "not_found" | "transient_io" | "timeout" => EXIT_IO,
        "access" => EXIT_ACCESS,
        "cancelled" => EXIT_CANCELLED,
        _ => EXIT_OTHER,
    }
}

/// Maps a pipeline-level error (configuration, store bootstrap) to an exit code.
pub fn exit_code_for_error(err: &PipelineError) -> i32 {
    match err {
        PipelineError::Training(e) => exit_code_for_kind(e.kind()),
        PipelineError::Store(aeris_store::StoreError::Access(_)) => EXIT_ACCESS,
        PipelineError::Store(_) => EXIT_IO,
        _ => EXIT_OTHER,
    }
}
