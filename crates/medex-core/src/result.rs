//! Extraction result and its text report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fields extracted from one document.
///
/// Each list keeps first-occurrence order and holds no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub patient_names: Vec<String>,
    pub dates_of_birth: Vec<String>,
    pub claim_ids: Vec<String>,
}

impl ExtractionResult {
    pub fn new(
        patient_names: Vec<String>,
        dates_of_birth: Vec<String>,
        claim_ids: Vec<String>,
    ) -> Self {
        Self {
            patient_names,
            dates_of_birth,
            claim_ids,
        }
    }

    /// True when nothing was found in any category.
    pub fn is_empty(&self) -> bool {
        self.patient_names.is_empty() && self.dates_of_birth.is_empty() && self.claim_ids.is_empty()
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    write!(f, "{}:", title)?;
    if items.is_empty() {
        return write!(f, " None found");
    }
    for item in items {
        write!(f, "\n  - {}", item)?;
    }
    Ok(())
}

impl fmt::Display for ExtractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXTRACTED PATIENT INFORMATION ===")?;
        writeln!(f)?;
        write_section(f, "Patient Names", &self.patient_names)?;
        write!(f, "\n\n")?;
        write_section(f, "Dates of Birth", &self.dates_of_birth)?;
        write!(f, "\n\n")?;
        write_section(f, "Claim IDs", &self.claim_ids)?;
        write!(f, "\n\n=====================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_report() {
        let report = ExtractionResult::default().to_string();
        assert_eq!(
            report,
            "=== EXTRACTED PATIENT INFORMATION ===\n\
             \n\
             Patient Names: None found\n\
             \n\
             Dates of Birth: None found\n\
             \n\
             Claim IDs: None found\n\
             \n\
             ====================================="
        );
    }

    #[test]
    fn test_report_lists_items() {
        let result = ExtractionResult::new(
            vec!["Emily Johnson".into(), "Robert Smith".into()],
            vec!["March 15, 1978".into()],
            Vec::new(),
        );

        assert_eq!(
            result.to_string(),
            "=== EXTRACTED PATIENT INFORMATION ===\n\
             \n\
             Patient Names:\n  - Emily Johnson\n  - Robert Smith\n\
             \n\
             Dates of Birth:\n  - March 15, 1978\n\
             \n\
             Claim IDs: None found\n\
             \n\
             ====================================="
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(ExtractionResult::default().is_empty());
        assert!(!ExtractionResult::new(vec![], vec![], vec!["CLM123456".into()]).is_empty());
    }
}
