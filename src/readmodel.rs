//! Per-read probability model: the match/mismatch matrix built from base
//! calls and quality scores, the windowed likelihood of a read against a
//! reference, and the "elsewhere" (paralogous source) likelihood.

use bio::stats::{LogProb, PHREDProb};

use crate::logmath::LN_3;

const BASES: usize = 5; // A, T, G, C, N

lazy_static::lazy_static! {
    static ref SEQNT_MAP: [usize; 26] = {
        let mut map = [4usize; 26]; // default: N
        map[(b'A' - b'A') as usize] = 0;
        map[(b'T' - b'A') as usize] = 1;
        map[(b'G' - b'A') as usize] = 2;
        map[(b'C' - b'A') as usize] = 3;
        map[(b'N' - b'A') as usize] = 4;
        map
    };
    static ref COMPL_MAP: [u8; 26] = {
        let mut map = [b'N'; 26];
        map[(b'A' - b'A') as usize] = b'T';
        map[(b'T' - b'A') as usize] = b'A';
        map[(b'G' - b'A') as usize] = b'C';
        map[(b'C' - b'A') as usize] = b'G';
        map[(b'N' - b'A') as usize] = b'N';
        map
    };
}

pub fn base_index(base: u8) -> usize {
    let b = base.to_ascii_uppercase();
    if !(b'A'..=b'Z').contains(&b) {
        return 4;
    }
    SEQNT_MAP[(b - b'A') as usize]
}

pub fn complement(base: u8) -> u8 {
    let b = base.to_ascii_uppercase();
    if !(b'A'..=b'Z').contains(&b) {
        return b'N';
    }
    COMPL_MAP[(b - b'A') as usize]
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

pub fn reverse(values: &[u8]) -> Vec<u8> {
    values.iter().rev().copied().collect()
}

/// A phred quality of 0 makes the error probability exactly 1, which sends
/// `is_match` to `ln(0)`. Treat it as a phred of 0.1 instead, same
/// workaround the original evaluator applies.
fn error_logprob(phred: u8) -> LogProb {
    if phred == 0 {
        LogProb::from(PHREDProb(0.1))
    } else {
        LogProb::from(PHREDProb(phred as f64))
    }
}

/// Per-position match/mismatch probability table for one read: row `i`
/// holds, for each of the 5 possible reference bases, the log-probability
/// that position `i` of the read is consistent with that base.
#[derive(Clone, Debug)]
pub struct ProbMatrix {
    rows: Vec<[LogProb; BASES]>,
    is_match: Vec<LogProb>,
    no_match: Vec<LogProb>,
}

impl ProbMatrix {
    pub fn build(seq: &[u8], qual: &[u8]) -> Self {
        let mut rows = Vec::with_capacity(seq.len());
        let mut is_match = Vec::with_capacity(seq.len());
        let mut no_match = Vec::with_capacity(seq.len());

        for (&base, &q) in seq.iter().zip(qual.iter()) {
            let err = error_logprob(q);
            let match_lp = err.ln_one_minus_exp();
            let mismatch_lp = err - *LN_3;
            let mut row = [mismatch_lp; BASES];
            row[base_index(base)] = match_lp;
            rows.push(row);
            is_match.push(match_lp);
            no_match.push(mismatch_lp);
        }

        ProbMatrix { rows, is_match, no_match }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The probability that this read originates from an unrelated locus
    /// elsewhere in the genome, discounted by `ALPHA` for every base of the
    /// read the alignment leaves unexplained (soft-clipped).
    pub fn prob_elsewhere(&self, inferred_length: usize) -> LogProb {
        let read_length = self.rows.len();
        let a = LogProb(self.is_match.iter().map(|lp| **lp).sum());
        let delta: Vec<LogProb> =
            self.no_match.iter().zip(self.is_match.iter()).map(|(n, m)| *n - *m).collect();
        let b = a + crate::logmath::log_sum_exp(&delta);
        let combined = crate::logmath::log_add_exp(a, b);
        LogProb(*combined - *crate::logmath::LN_ALPHA * (read_length as f64 - inferred_length as f64))
    }
}

/// Sum of `matrix` entries for a read placed so its first base lands at
/// `seq_pos` in `seq`, short-circuiting once the running total falls more
/// than 10 nats below `baseline` (a contribution below ~1e-5 of the best
/// placement seen so far isn't worth continuing to accumulate).
pub fn calc_prob(matrix: &ProbMatrix, seq: &[u8], seq_pos: i64, baseline: LogProb) -> LogProb {
    let read_length = matrix.len() as i64;
    let seq_length = seq.len() as i64;
    let mut probability = LogProb::ln_one();

    let mut b = seq_pos;
    while b < seq_pos + read_length {
        if b < 0 {
            b += 1;
            continue;
        }
        if b >= seq_length {
            break;
        }
        let row = &matrix.rows[(b - seq_pos) as usize];
        probability = probability + row[base_index(seq[b as usize])];
        if *probability < *baseline - 10.0 {
            break;
        }
        b += 1;
    }

    probability
}

/// Likelihood of a read against `seq`, marginalized over every placement
/// within one read length of `pos` (to absorb small indel-induced shifts),
/// using a running best-so-far as the `calc_prob` early-exit baseline.
pub fn calc_prob_distrib(matrix: &ProbMatrix, seq: &[u8], pos: i64) -> LogProb {
    let read_length = matrix.len() as i64;
    let seq_length = seq.len() as i64;
    let mut baseline = calc_prob(matrix, seq, pos, LogProb(-1000.0));
    let mut probability: Option<LogProb> = None;

    let n1 = pos - read_length;
    let n2 = pos + read_length;
    for i in n1..n2 {
        if i + read_length < 0 {
            continue;
        }
        if i >= seq_length {
            break;
        }
        let p = calc_prob(matrix, seq, i, baseline);
        probability = Some(match probability {
            None => p,
            Some(prev) => prev.ln_add_exp(p),
        });
        if let Some(prob) = probability {
            if *prob > *baseline {
                baseline = prob;
            }
        }
    }

    probability.unwrap_or_else(LogProb::ln_zero)
}
