//! School-group vocabulary
//!
//! The codes are opaque strings shared with `Schedule::authorizeds`. They
//! must stay byte-for-byte identical to keep existing registrations valid.

pub const SCHOOL_CODES: &[&str] = &[
    "1G01", "1G02", "1G03", "1G04", "1G05", "1G06", "1G07", "1G08", "1G09",
    "1ST2S1", "1ST2S2", "1ST2S3",
    "1STI2D1", "1STI2D2", "1STI2D3", "1STI2D4", "1STI2D5",
    "1STL",
    "1STMG1", "1STMG2", "1STMG3", "1STMG4",
    "201", "202", "203", "204", "205", "206", "207", "208", "209",
    "210", "211", "212", "213", "214", "215", "216", "217",
    "AERO1", "AERO2",
    "AMCRCI1", "AMCRCI2",
    "CICN1", "CICN2",
    "CPRP1", "CPRP2",
    "EL1", "EL2",
    "MCO1", "MCO2",
    "MGI", "MLDS", "PC2", "PCSI",
    "SAM1", "SAM2",
    "SNIR2",
    "SP3S1", "SP3S2",
    "SPTSI", "SUTSI",
    "TG01", "TG02", "TG03", "TG04", "TG05", "TG06", "TG07", "TG08", "TG09",
    "TST2S1", "TST2S2", "TST2S3",
    "TSTI2D1", "TSTI2D2", "TSTI2D3", "TSTI2D4", "TSTI2D5",
    "TSTL",
    "TSTMG1", "TSTMG2", "TSTMG3", "TSTMG4",
];

pub fn is_known_school(code: &str) -> bool {
    SCHOOL_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_complete_and_unique() {
        assert_eq!(SCHOOL_CODES.len(), 84);
        let mut sorted = SCHOOL_CODES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), SCHOOL_CODES.len());
    }

    #[test]
    fn test_is_known_school() {
        assert!(is_known_school("TSTI2D4"));
        assert!(is_known_school("201"));
        assert!(!is_known_school("AU02"));
        assert!(!is_known_school("tg01"));
    }
}
