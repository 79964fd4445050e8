pub mod bam;
pub mod vcf;
