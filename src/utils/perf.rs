//! Peak memory of the running process, for the command-line report.
//!
//! On Linux the kernel tracks the resident-set high-water mark as `VmHWM` in
//! `/proc/self/status`. Other platforms report 0.

/// Status field holding the peak resident set size.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const PEAK_RSS_FIELD: &str = "VmHWM:";

/// Extracts the value in kB of `field` (e.g. `"VmHWM:"`) from the text of a
/// `/proc/<pid>/status` file.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_status_kb(status: &str, field: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix(field))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

/// Peak resident set size of the current process in kB, or 0 when unavailable.
#[cfg(target_os = "linux")]
pub fn get_peak_rss_kb() -> u64 {
    match std::fs::read_to_string("/proc/self/status") {
        Ok(status) => parse_status_kb(&status, PEAK_RSS_FIELD).unwrap_or(0),
        Err(e) => {
            log::debug!("Cannot read /proc/self/status: {e}");
            0
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn get_peak_rss_kb() -> u64 {
    log::debug!("No /proc/self/status on this platform; peak RSS reported as 0.");
    0
}
