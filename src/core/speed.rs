use crate::domain::model::TravelMode;
use serde::{Deserialize, Serialize};

/// Average effective speeds in km/h, including waits and transfers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedTable {
    pub walk: f64,
    pub transit: f64,
    pub taxi: f64,
}

impl SpeedTable {
    /// The fixed table used by the generator, the reach-radius filter and
    /// legend text alike.
    pub const STANDARD: SpeedTable = SpeedTable {
        walk: 4.0,
        transit: 20.0,
        taxi: 35.0,
    };
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedModel {
    table: SpeedTable,
}

impl SpeedModel {
    pub fn new(table: SpeedTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SpeedTable {
        &self.table
    }

    pub fn speed_kmh(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walk => self.table.walk,
            TravelMode::Transit => self.table.transit,
            TravelMode::Taxi => self.table.taxi,
        }
    }

    /// Straight-line distance covered in `minutes`, in km.
    pub fn reach_km(&self, mode: TravelMode, minutes: u32) -> f64 {
        self.speed_kmh(mode) * minutes as f64 / 60.0
    }

    pub fn describe_reach(&self, mode: TravelMode, minutes: u32) -> String {
        format!(
            "{}: {:.1}km in {}min ({}km/h)",
            mode,
            self.reach_km(mode, minutes),
            minutes,
            self.speed_kmh(mode)
        )
    }
}
