//! Minimal tab-separated VCF candidate reader. Not a full BCF/VCF
//! implementation: it reads exactly the columns this evaluator needs
//! (`CHROM`, `POS`, `REF`, `ALT`) and expands comma-separated multi-allelic
//! records into one [`Variant`] per ref/alt pair.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::errors::Error;
use crate::variant::Variant;

pub fn read_vcf(path: impl AsRef<Path>) -> Result<Vec<Variant>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open VCF file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut variants = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(Error::MalformedVcf { line: line.clone() }.into());
        }

        let chr = fields[0].to_owned();
        let pos: i64 = fields[1]
            .parse()
            .map_err(|_| Error::MalformedVcf { line: line.clone() })?;
        let ref_field = fields[3];
        let alt_field = fields[4];

        for ref_allele in ref_field.split(',') {
            for alt_allele in alt_field.split(',') {
                variants.push(Variant {
                    chr: chr.clone(),
                    pos,
                    reference: ref_allele.to_owned(),
                    alt: alt_allele.to_owned(),
                });
            }
        }
    }

    variants.sort();
    Ok(variants)
}
