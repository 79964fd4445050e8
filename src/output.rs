//! Writes the final tab-separated report: one row per variant, variants
//! within a multi-variant hypothesis set all sharing the same bracketed
//! `Set` column.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Result;

use crate::evaluator::VariantResult;

pub const HEADER: &str = "#SEQ\tPOS\tREF\tALT\tReads\tAltReads\tProb\tOdds\tSet\n";

pub fn write_results(results: &mut [VariantResult], out: Option<&Path>) -> Result<()> {
    results.sort_by(|a, b| a.variant.cmp(&b.variant));

    let mut writer: Box<dyn Write> = match out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    writer.write_all(HEADER.as_bytes())?;
    for result in results {
        writeln!(writer, "{}", format_row(result))?;
    }
    Ok(())
}

fn format_row(r: &VariantResult) -> String {
    let mut set = String::new();
    if r.set.len() > 1 {
        for v in &r.set {
            set.push_str(&format!("{},{},{};", v.pos, v.reference, v.alt));
        }
    }

    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{:.6e}\t{:.6}\t[{}]",
        r.variant.chr, r.variant.pos, r.variant.reference, r.variant.alt, r.read_count, r.alt_read_count, r.prob, r.odds, set
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    fn variant(chr: &str, pos: i64) -> Variant {
        Variant { chr: chr.to_owned(), pos, reference: "A".to_owned(), alt: "T".to_owned() }
    }

    #[test]
    fn single_variant_set_has_empty_brackets() {
        let r = VariantResult {
            variant: variant("chr1", 100),
            read_count: 10,
            alt_read_count: 5,
            prob: -1.2,
            odds: 3.4,
            set: vec![variant("chr1", 100)],
        };
        let row = format_row(&r);
        assert!(row.ends_with("\t[]"));
    }

    #[test]
    fn multi_variant_set_lists_every_member() {
        let set = vec![variant("chr1", 100), variant("chr1", 105)];
        let r = VariantResult {
            variant: variant("chr1", 100),
            read_count: 10,
            alt_read_count: 5,
            prob: -1.2,
            odds: 3.4,
            set: set.clone(),
        };
        let row = format_row(&r);
        assert!(row.contains("100,A,T;105,A,T;"));
    }
}
