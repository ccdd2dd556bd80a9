// Metric names and recording helpers.

pub const CACHE_HITS: &str = "cache_hits";
pub const CACHE_MISSES: &str = "cache_misses";
pub const CACHE_LENGTH: &str = "cache_length";

pub const FORM_ACCEPTED: &str = "form_accepted_total";
pub const FORM_REJECTED: &str = "form_rejected_total";
pub const FORM_RATE_LIMITED: &str = "form_rate_limited_total";

pub const PUSH_DELIVERED: &str = "push_delivered_total";
pub const PUSH_GONE: &str = "push_gone_total";
pub const PUSH_FAILED: &str = "push_failed_total";

pub const ORPHANS_FOUND: &str = "storage_orphans_found_total";
pub const ORPHANS_REMOVED: &str = "storage_orphans_removed_total";

pub const BACKEND_ERRORS: &str = "backend_errors_total";
pub const RESP_STATUS_TOTAL: &str = "resp_status_total";
pub const PANICS_TOTAL: &str = "panics_total";

/// Adds cache hits for the named cache.
pub fn add_cache_hits(cache: &'static str, value: u64) {
    metrics::counter!(CACHE_HITS, "cache" => cache).increment(value);
}

/// Adds cache misses for the named cache.
pub fn add_cache_misses(cache: &'static str, value: u64) {
    metrics::counter!(CACHE_MISSES, "cache" => cache).increment(value);
}

pub fn set_cache_length(cache: &'static str, len: usize) {
    metrics::gauge!(CACHE_LENGTH, "cache" => cache).set(len as f64);
}

pub fn inc_form_accepted(form: &'static str) {
    metrics::counter!(FORM_ACCEPTED, "form" => form).increment(1);
}

pub fn inc_form_rejected(form: &'static str) {
    metrics::counter!(FORM_REJECTED, "form" => form).increment(1);
}

pub fn inc_form_rate_limited(form: &'static str) {
    metrics::counter!(FORM_RATE_LIMITED, "form" => form).increment(1);
}

/// Records the outcome counts of one push fan-out.
pub fn add_push_outcomes(delivered: u64, gone: u64, failed: u64) {
    metrics::counter!(PUSH_DELIVERED).increment(delivered);
    metrics::counter!(PUSH_GONE).increment(gone);
    metrics::counter!(PUSH_FAILED).increment(failed);
}

pub fn add_orphans(bucket: &str, found: u64, removed: u64) {
    let bucket = bucket.to_string();
    metrics::counter!(ORPHANS_FOUND, "bucket" => bucket.clone()).increment(found);
    metrics::counter!(ORPHANS_REMOVED, "bucket" => bucket).increment(removed);
}

pub fn inc_backend_errors(op: &'static str) {
    metrics::counter!(BACKEND_ERRORS, "op" => op).increment(1);
}

/// Counts a response by status code.
pub fn inc_status_code(code: u16) {
    metrics::counter!(RESP_STATUS_TOTAL, "code" => code.to_string()).increment(1);
}

pub fn inc_panics() {
    metrics::counter!(PANICS_TOTAL).increment(1);
}
