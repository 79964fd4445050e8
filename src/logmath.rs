//! Named log-space constants shared by the probability model.

use bio::stats::LogProb;

/// Mixture weight given to a read's best elsewhere-alignment when folding it
/// into the reference/alternative likelihoods.
pub const OMEGA: f64 = 1.0e-4;

/// Per-read-length penalty applied to the elsewhere probability; an
/// elsewhere alignment is charged `ALPHA` for every base of the read that the
/// alignment doesn't actually explain.
pub const ALPHA: f64 = 1.3;

lazy_static::lazy_static! {
    /// log(0.5), the prior mass assigned to the reference hypothesis.
    pub static ref REFPRIOR: LogProb = LogProb(0.5_f64.ln());

    pub static ref LN_3: LogProb = LogProb(3.0_f64.ln());
    pub static ref LN_0_5: LogProb = LogProb(0.5_f64.ln());
    pub static ref LN_0_1: LogProb = LogProb(0.1_f64.ln());
    pub static ref LN_0_9: LogProb = LogProb(0.9_f64.ln());

    pub static ref LN_ALPHA: f64 = ALPHA.ln();
    pub static ref LN_OMEGA: LogProb = LogProb(OMEGA.ln());
    pub static ref LN_1_OMEGA: LogProb = LogProb((1.0 - OMEGA).ln());

    /// `ln(ω/(1−ω))`, the elsewhere-mixture coefficient folded into both
    /// `prgu` and `prgv` (see `evaluator::evaluate_group`).
    pub static ref LN_OMEGA_RATIO: LogProb = *LN_OMEGA - *LN_1_OMEGA;
}

/// log(a + b) computed from log(a), log(b).
pub fn log_add_exp(a: LogProb, b: LogProb) -> LogProb {
    a.ln_add_exp(b)
}

/// log(sum(values)) computed from a slice of log-values.
pub fn log_sum_exp(values: &[LogProb]) -> LogProb {
    LogProb::ln_sum_exp(values)
}
