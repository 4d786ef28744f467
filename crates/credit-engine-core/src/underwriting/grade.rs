use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Score;

/// Underwriting band summarising a 0-100 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskGrade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl RiskGrade {
    pub const ALL: [RiskGrade; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];

    /// Band lookup: >=85 A, >=70 B, >=55 C, >=40 D, >=25 E, else F.
    pub fn from_score(score: Score) -> Self {
        if score >= dec!(85) {
            Self::A
        } else if score >= dec!(70) {
            Self::B
        } else if score >= dec!(55) {
            Self::C
        } else if score >= dec!(40) {
            Self::D
        } else if score >= dec!(25) {
            Self::E
        } else {
            Self::F
        }
    }

    /// Inclusive lower bound of the band.
    pub fn floor(self) -> Score {
        match self {
            Self::A => dec!(85),
            Self::B => dec!(70),
            Self::C => dec!(55),
            Self::D => dec!(40),
            Self::E => dec!(25),
            Self::F => Decimal::ZERO,
        }
    }

    /// Representative score inside the band.
    pub fn representative_score(self) -> Score {
        match self {
            Self::A => dec!(90),
            Self::B => dec!(75),
            Self::C => dec!(60),
            Self::D => dec!(45),
            Self::E => dec!(30),
            Self::F => dec!(15),
        }
    }

    /// A or B.
    pub fn is_prime(self) -> bool {
        matches!(self, Self::A | Self::B)
    }

    /// C or D.
    pub fn is_near_prime(self) -> bool {
        matches!(self, Self::C | Self::D)
    }
}

impl std::fmt::Display for RiskGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(RiskGrade::from_score(dec!(100)), RiskGrade::A);
        assert_eq!(RiskGrade::from_score(dec!(85)), RiskGrade::A);
        assert_eq!(RiskGrade::from_score(dec!(84)), RiskGrade::B);
        assert_eq!(RiskGrade::from_score(dec!(84.99)), RiskGrade::B);
        assert_eq!(RiskGrade::from_score(dec!(70)), RiskGrade::B);
        assert_eq!(RiskGrade::from_score(dec!(55)), RiskGrade::C);
        assert_eq!(RiskGrade::from_score(dec!(40)), RiskGrade::D);
        assert_eq!(RiskGrade::from_score(dec!(39)), RiskGrade::E);
        assert_eq!(RiskGrade::from_score(dec!(25)), RiskGrade::E);
        assert_eq!(RiskGrade::from_score(dec!(24.5)), RiskGrade::F);
        assert_eq!(RiskGrade::from_score(Decimal::ZERO), RiskGrade::F);
    }

    #[test]
    fn test_representative_score_maps_back_to_grade() {
        for grade in RiskGrade::ALL {
            assert_eq!(RiskGrade::from_score(grade.representative_score()), grade);
            assert_eq!(RiskGrade::from_score(grade.floor()), grade);
        }
    }

    #[test]
    fn test_grade_ordering_best_first() {
        assert!(RiskGrade::A < RiskGrade::B);
        assert!(RiskGrade::E < RiskGrade::F);
    }
}
