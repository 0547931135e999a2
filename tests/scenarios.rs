//! End-to-end runs over on-disk collections with a scripted HTTP client

#[path = "scenarios/helpers.rs"]
mod helpers;

#[path = "scenarios/cancellation.rs"]
mod cancellation;
#[path = "scenarios/environments.rs"]
mod environments;
#[path = "scenarios/exit_codes.rs"]
mod exit_codes;
#[path = "scenarios/full_run.rs"]
mod full_run;
#[path = "scenarios/reporting.rs"]
mod reporting;
