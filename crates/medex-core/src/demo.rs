//! Sample report used when no input file is given.

/// A short medical report exercising every extractor.
pub const DEMO_DOCUMENT: &str = "\
Medical Report
===============
Patient: Dr. Emily Johnson
Date of Birth: March 15, 1978
Claim Number: MED2024001234

Patient Mr. Robert Smith (DOB: 12/05/1965) visited for consultation.
Claim ID: ABC987654321

Additional Information:
- Patient Name: Maria Garcia
- Born: January 8, 1990
- Medical ID: XYZ123456789
";
