use std::fs::File;
use std::path::PathBuf;

use anyhow::Result;
use bio::io::fasta;
use structopt::StructOpt;

use crate::errors::Error;
use crate::evaluator::{self, EvaluationParamsBuilder};
use crate::grouper;
use crate::io::{bam, vcf};
use crate::output;
use crate::refcache::RefCache;
use crate::variant::Variant;
use crate::workerpool;

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "eagle",
    about = "Explicit alternative genome likelihood evaluator: re-scores candidate variants by comparing read support for the reference and alternative haplotypes.",
    setting = structopt::clap::AppSettings::ColoredHelp,
)]
pub struct Opt {
    /// Variants VCF file.
    #[structopt(short, long = "vcf", parse(from_os_str))]
    pub vcf: PathBuf,

    /// Alignment data BAM file (coordinate sorted and indexed).
    #[structopt(short = "a", long = "bam", parse(from_os_str))]
    pub bam: PathBuf,

    /// Reference sequence FASTA file (indexed with a .fai).
    #[structopt(short, long = "ref", parse(from_os_str))]
    pub reference: PathBuf,

    /// Output file; prints to stdout if not given.
    #[structopt(short, long = "out", parse(from_os_str))]
    pub out: Option<PathBuf>,

    /// Number of worker threads to use.
    #[structopt(short = "t", long = "numproc", default_value = "1")]
    pub numproc: usize,

    /// Consider nearby variants within n bases as a set of hypotheses (0 disables grouping).
    #[structopt(short = "n", long = "distlim", default_value = "10")]
    pub distlim: i64,

    /// Maximum number of combinations to consider in a set of hypotheses.
    #[structopt(short = "m", long = "maxh", default_value = "1024")]
    pub maxh: usize,

    /// Consider nearby variants as one multi-variant hypothesis rather than enumerating combinations.
    #[structopt(long = "mvh")]
    pub mvh: bool,

    /// Prior probability bias towards heterozygous mutations, in [0,1].
    #[structopt(short = "b", long = "hetbias", default_value = "0.5")]
    pub hetbias: f64,

    /// Consider primary alignments only.
    #[structopt(long = "pao")]
    pub pao: bool,

    /// Print per-read diagnostics to stderr.
    #[structopt(long = "debug")]
    pub debug: bool,
}

impl Opt {
    /// Clamps out-of-range option values to their defaults rather than
    /// failing outright, matching how the evaluator has always treated them.
    pub fn validated(mut self) -> Result<Self, Error> {
        if self.numproc < 1 {
            self.numproc = 1;
        }
        if self.distlim < 0 {
            self.distlim = 0;
        }
        if !(0.0..=1.0).contains(&self.hetbias) {
            self.hetbias = 0.5;
        }
        Ok(self)
    }
}

/// Top-level pipeline: read candidates, group them, evaluate every group
/// across a worker pool, and write the report.
pub fn run(opt: Opt) -> Result<()> {
    let opt = opt.validated()?;

    let variants = vcf::read_vcf(&opt.vcf)?;
    if variants.is_empty() {
        return Err(Error::MissingInput { what: "no variants found in VCF".to_owned() }.into());
    }
    let groups = grouper::group_variants(&variants, opt.distlim);
    log::info!("{} variant(s) grouped into {} hypothesis set(s)", variants.len(), groups.len());

    let params = EvaluationParamsBuilder::default()
        .maxh(opt.maxh)
        .mvh(opt.mvh)
        .hetbias(opt.hetbias)
        .pao(opt.pao)
        .debug(opt.debug)
        .build()
        .map_err(|e| Error::BadOption { msg: e.to_string() })?;

    let bam_path = opt.bam.clone();
    let reference_path = opt.reference.clone();
    let refcache = std::sync::Arc::new(RefCache::new());

    let results = workerpool::run_jobs(groups, opt.numproc, move |group: &Vec<Variant>| {
        evaluate_one_group(group, &bam_path, &reference_path, &refcache, &params)
    })?;

    let mut flattened: Vec<_> = results.into_iter().flatten().collect();
    output::write_results(&mut flattened, opt.out.as_deref())?;
    Ok(())
}

fn evaluate_one_group(
    group: &[Variant],
    bam_path: &PathBuf,
    reference_path: &PathBuf,
    refcache: &RefCache,
    params: &evaluator::EvaluationParams,
) -> Result<Option<Vec<evaluator::VariantResult>>> {
    let first = &group[0];
    let last = &group[group.len() - 1];
    let reads = bam::fetch_reads(bam_path, &first.chr, first.pos - 1, last.pos)?;
    if reads.is_empty() {
        return Ok(None);
    }

    let mut fasta_reader = fasta::IndexedReader::from_file(reference_path)
        .map_err(|_| Error::MalformedFaidx { path: reference_path.clone() })?;
    let refseq = refcache.fetch(&first.chr, &mut fasta_reader)?;

    let results = evaluator::evaluate_group(group, &reads, &refseq.seq, refcache, &mut fasta_reader, params)?;
    Ok(Some(results))
}
