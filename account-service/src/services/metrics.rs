use metrics::counter;

pub const PROVISION_OUTCOMES_TOTAL: &str = "account_provision_outcomes_total";
pub const STATUS_POLLS_TOTAL: &str = "account_status_polls_total";
pub const RELOCATION_OUTCOMES_TOTAL: &str = "account_relocation_outcomes_total";

/// Count a finished provisioning attempt by outcome (`succeeded` or an error kind).
pub fn record_provision_outcome(outcome: &'static str) {
    counter!(PROVISION_OUTCOMES_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_status_poll(state: &'static str) {
    counter!(STATUS_POLLS_TOTAL, "state" => state).increment(1);
}

/// Count a finished relocation by outcome (`moved`, `unchanged` or an error kind).
pub fn record_relocation_outcome(outcome: &'static str) {
    counter!(RELOCATION_OUTCOMES_TOTAL, "outcome" => outcome).increment(1);
}
