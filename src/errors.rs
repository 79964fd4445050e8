use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("bad command line option: {msg}")]
    BadOption { msg: String },

    #[error("missing required input: {what}")]
    MissingInput { what: String },

    #[error("malformed VCF line: {line}")]
    MalformedVcf { line: String },

    #[error("malformed or missing FASTA index for {path}")]
    MalformedFaidx { path: PathBuf },

    #[error("contig {name} not found in reference")]
    ContigNotPresent { name: String },

    #[error("failed to open BAM file {path}")]
    BamOpen { path: PathBuf },

    #[error("failed to query BAM index for region {region}")]
    BamIndex { region: String },
}
