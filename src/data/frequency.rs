//! Allele-frequency data.

use super::Dataset;
use crate::error::{CoreError, Result};

/// Allele frequencies per accession and locus.
///
/// Each accession carries one entry per locus: `Some(freqs)` with one
/// frequency per allele, or `None` when the locus is missing for that
/// accession. Distance measures skip missing loci instead of treating
/// them as zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyData {
    names: Vec<String>,
    rows: Vec<Vec<Option<Vec<f64>>>>,
    allele_counts: Vec<usize>,
}

impl FrequencyData {
    /// Builds the dataset, checking that the rows are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] when the collection is empty, names and
    /// rows disagree in length, accessions have different locus counts, a
    /// locus has different allele counts across accessions, or a frequency
    /// lies outside `[0, 1]`.
    pub fn new(names: Vec<String>, rows: Vec<Vec<Option<Vec<f64>>>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(CoreError::config("frequency data contains no accessions"));
        }
        if names.len() != rows.len() {
            return Err(CoreError::config(format!(
                "{} names given for {} accessions",
                names.len(),
                rows.len()
            )));
        }

        let loci = rows[0].len();
        if loci == 0 {
            return Err(CoreError::config("frequency data contains no loci"));
        }
        let mut allele_counts: Vec<Option<usize>> = vec![None; loci];

        for (a, row) in rows.iter().enumerate() {
            if row.len() != loci {
                return Err(CoreError::config(format!(
                    "accession {} has {} loci, expected {loci}",
                    names[a],
                    row.len()
                )));
            }
            for (l, entry) in row.iter().enumerate() {
                let Some(freqs) = entry else { continue };
                match allele_counts[l] {
                    None => allele_counts[l] = Some(freqs.len()),
                    Some(n) if n != freqs.len() => {
                        return Err(CoreError::config(format!(
                            "locus {l} of accession {} has {} alleles, expected {n}",
                            names[a],
                            freqs.len()
                        )));
                    }
                    Some(_) => {}
                }
                if let Some(f) = freqs.iter().find(|f| !(0.0..=1.0).contains(*f)) {
                    return Err(CoreError::config(format!(
                        "frequency {f} at locus {l} of accession {} is outside [0, 1]",
                        names[a]
                    )));
                }
            }
        }

        Ok(Self {
            names,
            rows,
            allele_counts: allele_counts.into_iter().map(|c| c.unwrap_or(0)).collect(),
        })
    }

    /// Name of the accession at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Total number of loci, including loci missing for some accessions.
    pub fn number_of_loci(&self) -> usize {
        self.allele_counts.len()
    }

    /// Number of alleles observed at `locus` (0 if missing everywhere).
    pub fn allele_count(&self, locus: usize) -> usize {
        self.allele_counts[locus]
    }

    /// Per-locus frequency vectors of one accession.
    pub fn row_elements(&self, index: usize) -> &[Option<Vec<f64>>] {
        &self.rows[index]
    }
}

impl Dataset for FrequencyData {
    fn size(&self) -> usize {
        self.rows.len()
    }
}
