//! Labeled variant dataset loader.
//!
//! Expects a CSV with `chrom,pos,ref,alt,class` columns, the shape of the
//! BRCA1 saturation-mutagenesis table (Findlay et al. 2018) after export.
//! `class` is one of LOF, FUNC, INT; FUNC and INT together form the
//! functional (negative) class for calibration.

use std::path::Path;

use anyhow::{bail, Context};
use helyx_common::dna::parse_base;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FunctionalClass {
    #[serde(rename = "LOF")]
    Lof,
    #[serde(rename = "FUNC")]
    Func,
    #[serde(rename = "INT")]
    Int,
}

impl FunctionalClass {
    pub fn is_lof(self) -> bool {
        matches!(self, FunctionalClass::Lof)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawRow {
    chrom: String,
    pos: u64,
    #[serde(rename = "ref")]
    reference: String,
    alt: String,
    class: FunctionalClass,
}

/// One validated dataset row.
#[derive(Debug, Clone)]
pub struct DatasetRow {
    pub chrom: String,
    /// 1-based chromosome position.
    pub pos: u64,
    /// Reference base as listed by the dataset. Verified against the fetched
    /// window before scoring.
    pub reference: char,
    pub alt: char,
    pub class: FunctionalClass,
}

pub fn load_dataset(path: &Path) -> anyhow::Result<Vec<DatasetRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening dataset {}", path.display()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<RawRow>().enumerate() {
        let line = i + 2; // header is line 1
        let raw = record.with_context(|| format!("dataset line {}", line))?;

        let Some(reference) = parse_base(&raw.reference) else {
            bail!("dataset line {}: bad reference base {:?}", line, raw.reference);
        };
        let Some(alt) = parse_base(&raw.alt) else {
            bail!("dataset line {}: bad alternate base {:?}", line, raw.alt);
        };
        if raw.pos < 1 {
            bail!("dataset line {}: position must be 1-based", line);
        }

        rows.push(DatasetRow {
            chrom: raw.chrom,
            pos: raw.pos,
            reference,
            alt,
            class: raw.class,
        });
    }
    Ok(rows)
}
