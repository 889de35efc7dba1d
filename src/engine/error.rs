use thiserror::Error;

use crate::domain::{ClientMode, PriceLevel, Region};

/// Errors raised while building a scenario
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("No rules configured for region {region} in {mode} mode")]
    MissingRules { region: Region, mode: ClientMode },

    #[error("Empty kit catalog for region {region} in {mode} mode")]
    EmptyCatalog { region: Region, mode: ClientMode },

    #[error("Kit {power_w} W has no {level} price")]
    MissingPriceLevel { power_w: u32, level: PriceLevel },

    #[error("Empty financing window for region {region} in {mode} mode")]
    EmptyFinancingWindow { region: Region, mode: ClientMode },

    #[error("No {power_w} W kit in the {region} {mode} catalog")]
    UnknownKitPower {
        power_w: u32,
        region: Region,
        mode: ClientMode,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    /// Faults in the deployed rule tables, as opposed to bad caller input
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            EngineError::MissingRules { .. }
                | EngineError::EmptyCatalog { .. }
                | EngineError::MissingPriceLevel { .. }
                | EngineError::EmptyFinancingWindow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_classification() {
        assert!(EngineError::MissingRules {
            region: Region::Island,
            mode: ClientMode::Residential,
        }
        .is_configuration_fault());
        assert!(!EngineError::InvalidInput("negative discount".to_string()).is_configuration_fault());
        assert!(!EngineError::UnknownKitPower {
            power_w: 4200,
            region: Region::Mainland,
            mode: ClientMode::Residential,
        }
        .is_configuration_fault());
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::UnknownKitPower {
            power_w: 4200,
            region: Region::Mainland,
            mode: ClientMode::Residential,
        };
        assert_eq!(
            error.to_string(),
            "No 4200 W kit in the mainland residential catalog"
        );
    }
}
