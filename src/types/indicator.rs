//! Defines the measurement types ("indicators") published by the gas transparency
//! platform, together with the short column names used for them in topology tables.

use crate::aggregate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The type of measurement a record reports.
///
/// Every indicator has two spellings: the long platform name (e.g. `"Physical Flow"`),
/// which is what raw records carry, and the short topology column name (e.g. `"flow"`),
/// which is the header of the strategy column in a topology table. Both parse to the
/// same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Indicator {
    Nomination,
    Renomination,
    Allocation,
    /// Measured physical flow through the point.
    PhysicalFlow,
    /// Gross calorific value.
    Gcv,
    WobbeIndex,
    FirmTechnical,
    FirmBooked,
    FirmAvailable,
    InterruptibleTotal,
    InterruptibleBooked,
    InterruptibleAvailable,
    PlannedInterruptionFirm,
    UnplannedInterruptionFirm,
    PlannedInterruptionInterruptible,
    ActualInterruptionInterruptible,
}

impl Indicator {
    pub const ALL: [Indicator; 16] = [
        Indicator::Nomination,
        Indicator::Renomination,
        Indicator::Allocation,
        Indicator::PhysicalFlow,
        Indicator::Gcv,
        Indicator::WobbeIndex,
        Indicator::FirmTechnical,
        Indicator::FirmBooked,
        Indicator::FirmAvailable,
        Indicator::InterruptibleTotal,
        Indicator::InterruptibleBooked,
        Indicator::InterruptibleAvailable,
        Indicator::PlannedInterruptionFirm,
        Indicator::UnplannedInterruptionFirm,
        Indicator::PlannedInterruptionInterruptible,
        Indicator::ActualInterruptionInterruptible,
    ];

    /// The indicators requested by a download when the caller does not name any.
    pub const DEFAULT_DOWNLOAD: [Indicator; 6] = [
        Indicator::PhysicalFlow,
        Indicator::FirmTechnical,
        Indicator::FirmBooked,
        Indicator::Gcv,
        Indicator::Nomination,
        Indicator::Renomination,
    ];

    /// The long name as used by the platform and in raw records.
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Nomination => "Nomination",
            Indicator::Renomination => "Renomination",
            Indicator::Allocation => "Allocation",
            Indicator::PhysicalFlow => "Physical Flow",
            Indicator::Gcv => "GCV",
            Indicator::WobbeIndex => "Wobbe Index",
            Indicator::FirmTechnical => "Firm Technical",
            Indicator::FirmBooked => "Firm Booked",
            Indicator::FirmAvailable => "Firm Available",
            Indicator::InterruptibleTotal => "Interruptible Total",
            Indicator::InterruptibleBooked => "Interruptible Booked",
            Indicator::InterruptibleAvailable => "Interruptible Available",
            Indicator::PlannedInterruptionFirm => "Planned interruption of firm capacity",
            Indicator::UnplannedInterruptionFirm => "Unplanned interruption of firm capacity",
            Indicator::PlannedInterruptionInterruptible => {
                "Planned interruption of interruptible capacity"
            }
            Indicator::ActualInterruptionInterruptible => {
                "Actual interruption of interruptible capacity"
            }
        }
    }

    /// The short name used as the strategy column header in topology tables.
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::Nomination => "nom",
            Indicator::Renomination => "renom",
            Indicator::Allocation => "alloc",
            Indicator::PhysicalFlow => "flow",
            Indicator::Gcv => "gcv",
            Indicator::WobbeIndex => "wob",
            Indicator::FirmTechnical => "firm",
            Indicator::FirmBooked => "firmbooked",
            Indicator::FirmAvailable => "firmavail",
            Indicator::InterruptibleTotal => "inttot",
            Indicator::InterruptibleBooked => "intbooked",
            Indicator::InterruptibleAvailable => "intavail",
            Indicator::PlannedInterruptionFirm => "planinterruptfirm",
            Indicator::UnplannedInterruptionFirm => "unplaninterruptfirm",
            Indicator::PlannedInterruptionInterruptible => "planinterruptint",
            Indicator::ActualInterruptionInterruptible => "unplaninterruptint",
        }
    }
}

impl FromStr for Indicator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Indicator::ALL
            .into_iter()
            .find(|ind| ind.label() == trimmed || ind.column() == trimmed)
            .ok_or_else(|| ConfigError::UnknownIndicator(trimmed.to_string()))
    }
}

/// Formats an `Indicator` using its long platform name.
///
/// # Examples
///
/// ```
/// use gastp::Indicator;
///
/// assert_eq!(Indicator::PhysicalFlow.to_string(), "Physical Flow");
/// assert_eq!("firmbooked".parse::<Indicator>().unwrap(), Indicator::FirmBooked);
/// ```
impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_spellings() {
        for ind in Indicator::ALL {
            assert_eq!(ind.label().parse::<Indicator>().unwrap(), ind);
            assert_eq!(ind.column().parse::<Indicator>().unwrap(), ind);
        }
    }

    #[test]
    fn test_parse_unknown_indicator() {
        let err = "Linepack".parse::<Indicator>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownIndicator(name) if name == "Linepack"));
    }

    #[test]
    fn test_column_names_are_unique() {
        let mut columns: Vec<&str> = Indicator::ALL.iter().map(|i| i.column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), Indicator::ALL.len());
    }
}
