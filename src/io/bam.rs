//! Region-scoped BAM reading: fetches the reads overlapping a hypothesis
//! set's span and exposes the fields the probability model needs.

use std::path::Path;

use anyhow::Result;
use rust_htslib::bam::record::{Aux, Cigar};
use rust_htslib::bam::{self, Read as HtsRead};

use crate::errors::Error;

#[derive(Clone, Debug)]
pub struct Read {
    pub name: String,
    pub chr: String,
    pub pos: i64,
    pub qseq: Vec<u8>,
    pub qual: Vec<u8>,
    pub inferred_length: usize,
    pub unmapped: bool,
    pub reverse: bool,
    pub secondary: bool,
    pub multimap: Option<String>,
}

/// One decoded entry from a BWA-style `XA` tag:
/// `chrom,[+-]pos,cigar,editdist;...`. `pos` carries the sign the tag
/// encodes (negative meaning the alternate alignment is on the reverse
/// strand); its magnitude is still 1-based like the primary `POS` field.
#[derive(Debug, Clone)]
pub struct XaEntry {
    pub chr: String,
    pub pos: i64,
}

/// Hand-written scanner over the compact `XA` format rather than a `regex`
/// dependency pulled in for this one use.
pub fn parse_xa(xa: &str) -> Vec<XaEntry> {
    let mut entries = Vec::new();
    for entry in xa.split(';') {
        if entry.is_empty() {
            continue;
        }
        let fields: Vec<&str> = entry.split(',').collect();
        if fields.len() < 4 {
            continue;
        }
        let chr = fields[0].to_owned();
        let pos: i64 = match fields[1].parse() {
            Ok(p) => p,
            Err(_) => continue,
        };
        entries.push(XaEntry { chr, pos });
    }
    entries
}

pub fn fetch_reads(bam_path: impl AsRef<Path>, chr: &str, start: i64, end: i64) -> Result<Vec<Read>> {
    let path = bam_path.as_ref();
    let mut reader =
        bam::IndexedReader::from_path(path).map_err(|_| Error::BamOpen { path: path.to_owned() })?;

    let tid = reader
        .header()
        .tid(chr.as_bytes())
        .ok_or_else(|| Error::ContigNotPresent { name: chr.to_owned() })?;
    reader
        .fetch((tid, start.max(0), end))
        .map_err(|_| Error::BamIndex { region: format!("{}:{}-{}", chr, start, end) })?;

    let mut reads = Vec::new();
    for record in reader.records() {
        let record = record?;

        let qseq = record.seq().as_bytes().to_ascii_uppercase();
        let qual: Vec<u8> = record.qual().to_vec();
        let inferred_length: usize = record
            .cigar()
            .iter()
            .map(|c| match c {
                Cigar::Match(n) | Cigar::Ins(n) | Cigar::SoftClip(n) | Cigar::Equal(n) | Cigar::Diff(n) => {
                    *n as usize
                }
                _ => 0,
            })
            .sum();

        let multimap = match record.aux(b"XA") {
            Ok(Aux::String(s)) => Some(s.to_owned()),
            _ => None,
        };

        reads.push(Read {
            name: String::from_utf8_lossy(record.qname()).into_owned(),
            chr: chr.to_owned(),
            pos: record.pos(),
            qseq,
            qual,
            inferred_length,
            unmapped: record.is_unmapped(),
            reverse: record.is_reverse(),
            secondary: record.is_secondary() || record.is_supplementary(),
            multimap,
        });
    }

    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_xa_entries() {
        let entries = parse_xa("chr2,-1500,76M,2;chr3,+300,76M,1;");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].chr, "chr2");
        assert_eq!(entries[0].pos, -1500);
        assert_eq!(entries[1].chr, "chr3");
        assert_eq!(entries[1].pos, 300);
    }

    #[test]
    fn ignores_malformed_entries() {
        let entries = parse_xa("garbage;;chr1,100");
        assert!(entries.is_empty());
    }
}
