//! The core per-hypothesis-set evaluation: for one group of nearby
//! candidate variants, builds every combination ("hypothesis") up to
//! `maxh`, scores every read against each combination's alternative
//! haplotype, and marginalizes into a per-variant probability and odds.

use std::io::{Read as IoRead, Seek};

use anyhow::Result;
use bio::io::fasta;
use bio::stats::LogProb;
use derive_builder::Builder;
use itertools::Itertools;

use crate::altbuilder;
use crate::io::bam::Read;
use crate::logmath;
use crate::readmodel::{self, ProbMatrix};
use crate::refcache::RefCache;
use crate::variant::Variant;

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct EvaluationParams {
    #[builder(default = "1024")]
    pub maxh: usize,
    #[builder(default = "false")]
    pub mvh: bool,
    #[builder(default = "0.5")]
    pub hetbias: f64,
    #[builder(default = "false")]
    pub pao: bool,
    #[builder(default = "false")]
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct VariantResult {
    pub variant: Variant,
    pub read_count: i32,
    pub alt_read_count: i32,
    pub prob: f64,
    pub odds: f64,
    pub set: Vec<Variant>,
}

/// Enumerates hypothesis combinations over `n` variant indices in the order
/// the original evaluator does: every singleton first, then (if `n > 1`) the
/// full set, then every intermediate size ascending, stopping once the
/// number of intermediate-size combinations emitted reaches `maxh`.
///
/// `mvh` collapses a set to a single multi-variant hypothesis: singletons
/// and the full set are still emitted (so every variant still gets a
/// per-variant row), but no intermediate sizes are considered at all.
pub fn enumerate_combinations(n: usize, maxh: usize, mvh: bool) -> Vec<Vec<usize>> {
    let mut combos: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    if n > 1 {
        combos.push((0..n).collect());
        if !mvh {
            for k in 2..n {
                for c in (0..n).combinations(k) {
                    combos.push(c);
                }
                if combos.len() >= n + 1 + maxh {
                    break;
                }
            }
        }
    }

    combos
}

pub fn evaluate_group<R: IoRead + Seek>(
    group: &[Variant],
    reads: &[Read],
    refseq: &[u8],
    refcache: &RefCache,
    fasta_reader: &mut fasta::IndexedReader<R>,
    params: &EvaluationParams,
) -> Result<Vec<VariantResult>> {
    let nvariants = group.len();
    let combos = enumerate_combinations(nvariants, params.maxh, params.mvh);
    let ncombos = combos.len();

    let (alt_prior, het_prior) = if nvariants == 1 || params.mvh {
        (
            LogProb((0.5 * (1.0 - params.hetbias)).ln()),
            LogProb((0.5 * params.hetbias).ln()),
        )
    } else {
        (
            LogProb((0.5 * (1.0 - params.hetbias) / ncombos as f64).ln()),
            LogProb((0.5 * params.hetbias / ncombos as f64).ln()),
        )
    };

    let mut ref_acc = LogProb::ln_one();
    let mut alt = vec![LogProb::ln_one(); ncombos];
    let mut het = vec![LogProb::ln_one(); ncombos];
    let mut ref_count = vec![0i32; ncombos];
    let mut alt_count = vec![0i32; ncombos];

    let mut pout = vec![LogProb::ln_zero(); reads.len()];
    let mut prgu = vec![LogProb::ln_zero(); reads.len()];

    for (seti, combo) in combos.iter().enumerate() {
        let combo_variants: Vec<&Variant> = combo.iter().map(|&i| &group[i]).collect();
        let altseq = altbuilder::build_alt(refseq, &combo_variants);

        for (readi, read) in reads.iter().enumerate() {
            if read.unmapped {
                continue;
            }
            if params.pao && read.secondary {
                continue;
            }

            let matrix = ProbMatrix::build(&read.qseq, &read.qual);

            if seti == 0 {
                pout[readi] = matrix.prob_elsewhere(read.inferred_length);
                prgu[readi] = readmodel::calc_prob_distrib(&matrix, refseq, read.pos);
            }
            let mut prgv = readmodel::calc_prob_distrib(&matrix, &altseq, read.pos);

            if !params.pao {
                if let Some(xa) = &read.multimap {
                    for entry in crate::io::bam::parse_xa(xa) {
                        let flip = (entry.pos < 0) != read.reverse;
                        let (xa_seq, xa_qual);
                        let xa_matrix = if flip {
                            xa_seq = readmodel::reverse_complement(&read.qseq);
                            xa_qual = readmodel::reverse(&read.qual);
                            ProbMatrix::build(&xa_seq, &xa_qual)
                        } else {
                            matrix.clone()
                        };

                        let xa_pos = entry.pos.abs() - 1;
                        let xa_fasta = refcache.fetch(&entry.chr, fasta_reader)?;
                        let ref_readprob = readmodel::calc_prob_distrib(&xa_matrix, &xa_fasta.seq, xa_pos);

                        if seti == 0 {
                            let elsewhere = xa_matrix.prob_elsewhere(read.inferred_length);
                            pout[readi] = pout[readi].ln_add_exp(elsewhere);
                            prgu[readi] = prgu[readi].ln_add_exp(ref_readprob);
                        }

                        let alt_readprob = if entry.chr.eq_ignore_ascii_case(&read.chr)
                            && (xa_pos - combo_variants[0].pos).abs() < 50
                        {
                            readmodel::calc_prob_distrib(&xa_matrix, &altseq, xa_pos)
                        } else {
                            ref_readprob
                        };
                        prgv = prgv.ln_add_exp(alt_readprob);
                    }
                }
            }

            if seti == 0 {
                prgu[readi] = logmath::log_add_exp(pout[readi] + *logmath::LN_OMEGA_RATIO, prgu[readi]);
            }
            prgv = logmath::log_add_exp(pout[readi] + *logmath::LN_OMEGA_RATIO, prgv);

            let phet_50 = logmath::log_add_exp(prgv + *logmath::LN_0_5, prgu[readi] + *logmath::LN_0_5);
            let phet_10 = logmath::log_add_exp(prgv + *logmath::LN_0_1, prgu[readi] + *logmath::LN_0_9);
            let phet_90 = logmath::log_add_exp(prgv + *logmath::LN_0_9, prgu[readi] + *logmath::LN_0_1);
            let phet = LogProb(phet_50.max(*phet_10).max(*phet_90));

            let diff = *prgv - *prgu[readi];
            if diff > 0.69 {
                alt_count[seti] += 1;
            } else if -diff > 0.69 {
                ref_count[seti] += 1;
            }

            if seti == 0 {
                ref_acc = ref_acc + prgu[readi] + *logmath::REFPRIOR;
            }
            alt[seti] = alt[seti] + prgv + alt_prior;
            het[seti] = het[seti] + phet + het_prior;

            if params.debug {
                log::debug!(
                    "{}\tseti={}\tprgu={:.3}\tprgv={:.3}\tphet={:.3}",
                    read.name,
                    seti,
                    *prgu[readi],
                    *prgv,
                    *phet
                );
            }
        }
    }

    let mut total = ref_acc;
    let mut max_ref_count = 0;
    let mut max_alt_count = 0;
    for seti in 0..ncombos {
        total = logmath::log_add_exp(ref_acc, logmath::log_add_exp(alt[seti], het[seti]));
        max_ref_count = max_ref_count.max(ref_count[seti]);
        max_alt_count = max_alt_count.max(alt_count[seti]);
    }
    let read_count = max_ref_count + max_alt_count;

    let mut results = Vec::with_capacity(nvariants);
    for i in 0..nvariants {
        let mut has_alt: Option<LogProb> = None;
        let mut not_alt = ref_acc;
        let mut has_alt_count = 0;

        for seti in 0..ncombos {
            let combined = logmath::log_add_exp(alt[seti], het[seti]);
            if combos[seti].contains(&i) {
                has_alt = Some(match has_alt {
                    None => combined,
                    Some(h) => logmath::log_add_exp(h, combined),
                });
                has_alt_count = has_alt_count.max(alt_count[seti]);
            } else {
                not_alt = logmath::log_add_exp(not_alt, combined);
            }
        }

        let has_alt = has_alt.unwrap_or_else(LogProb::ln_zero);
        let prob = (*has_alt - *total) * std::f64::consts::LOG10_E;
        let odds = (*has_alt - *not_alt) * std::f64::consts::LOG10_E;

        results.push(VariantResult {
            variant: group[i].clone(),
            read_count,
            alt_read_count: has_alt_count,
            prob,
            odds,
            set: group.to_vec(),
        });
    }

    Ok(results)
}
