//! Exit-code mapping for the relay binary.
//!
//! The reference behavior was "log and exit 0 regardless"; these codes make
//! each failure class scriptable instead.

use relay_engine::RunReport;

/// Everything attempted succeeded (or there was nothing to do).
pub const SUCCESS: u8 = 0;
/// At least one item failed, or the gate withheld the manifest.
pub const PARTIAL_FAILURE: u8 = 1;
/// Missing or malformed configuration; nothing was attempted.
pub const CONFIG_FAILURE: u8 = 2;
/// The runtime or filesystem was unusable; the run aborted.
pub const RUN_ABORTED: u8 = 3;
/// The scrape failed outright and nothing was staged to publish.
pub const SCRAPE_FAILURE: u8 = 4;

pub fn code_for(report: &RunReport) -> u8 {
    if report.fetch_error.is_some() && report.outcome.seen == 0 {
        return SCRAPE_FAILURE;
    }
    if report.is_clean() && (report.manifest_written || report.outcome.seen == 0) {
        return SUCCESS;
    }
    PARTIAL_FAILURE
}
