use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};

/// Rows that belong to a calendar day
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Daily water balance terms, mm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterFluxDay {
    pub date: NaiveDate,
    pub growing_season: bool,
    pub water_content: f64,
    pub groundwater_depth: Option<f64>,
    pub surface_storage: f64,
    pub irrigation: f64,
    pub infiltration: f64,
    pub runoff: f64,
    pub deep_percolation: f64,
    pub capillary_rise: f64,
    pub groundwater_inflow: f64,
    pub soil_evaporation: f64,
    pub potential_soil_evaporation: f64,
    pub transpiration: f64,
    pub potential_transpiration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropGrowthDay {
    pub date: NaiveDate,
    pub growing_season: bool,
    pub growing_degree_days: f64,
    pub cumulative_gdd: f64,
    /// m
    pub root_depth: f64,
    /// fraction 0-1
    pub canopy_cover: f64,
    pub canopy_cover_no_stress: f64,
    /// t/ha
    pub biomass: f64,
    pub biomass_no_stress: f64,
    pub harvest_index: f64,
    pub dry_yield: f64,
    pub fresh_yield: f64,
    pub yield_potential: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterStorageDay {
    pub date: NaiveDate,
    pub growing_season: bool,
    /// m³/m³ per soil compartment, top down
    pub compartments: Vec<f64>,
}

/// One row per completed season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub season: u32,
    pub crop_type: String,
    pub harvest_date: NaiveDate,
    pub dry_yield: f64,
    pub fresh_yield: f64,
    pub yield_potential: f64,
    pub seasonal_irrigation: f64,
}

impl Dated for WaterFluxDay {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for CropGrowthDay {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for WaterStorageDay {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTable {
    WaterFlux,
    CropGrowth,
    WaterStorage,
}

impl OutputTable {
    pub fn name(self) -> &'static str {
        match self {
            OutputTable::WaterFlux => "water_flux",
            OutputTable::CropGrowth => "crop_growth",
            OutputTable::WaterStorage => "water_storage",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub water_flux: Vec<WaterFluxDay>,
    pub crop_growth: Vec<CropGrowthDay>,
    pub water_storage: Vec<WaterStorageDay>,
    pub final_stats: Vec<SeasonStats>,
}

/// Rows dated within `from..=to`
pub fn filter_window<T: Dated + Clone>(rows: &[T], from: NaiveDate, to: NaiveDate) -> Vec<T> {
    rows.iter()
        .filter(|r| (from..=to).contains(&r.date()))
        .cloned()
        .collect()
}

impl SimulationOutput {
    /// Copy restricted to `from..=to`; season statistics are kept when
    /// their harvest falls in the window
    pub fn window(&self, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            water_flux: filter_window(&self.water_flux, from, to),
            crop_growth: filter_window(&self.crop_growth, from, to),
            water_storage: filter_window(&self.water_storage, from, to),
            final_stats: self
                .final_stats
                .iter()
                .filter(|s| (from..=to).contains(&s.harvest_date))
                .cloned()
                .collect(),
        }
    }

    /// Days with a non-zero irrigation depth
    pub fn irrigation_events(&self) -> Vec<(NaiveDate, f64)> {
        self.water_flux
            .iter()
            .filter(|d| d.irrigation > 0.0)
            .map(|d| (d.date, d.irrigation))
            .collect()
    }

    pub fn seasonal_irrigation(&self) -> f64 {
        self.water_flux.iter().map(|d| d.irrigation).sum()
    }

    /// One numeric column of a daily table, by field name
    pub fn select_column(&self, table: OutputTable, column: &str) -> Result<Vec<(NaiveDate, f64)>> {
        match table {
            OutputTable::WaterFlux => select(&self.water_flux, table, column),
            OutputTable::CropGrowth => select(&self.crop_growth, table, column),
            OutputTable::WaterStorage => select(&self.water_storage, table, column),
        }
    }
}

fn select<T: Dated + Serialize>(
    rows: &[T],
    table: OutputTable,
    column: &str,
) -> Result<Vec<(NaiveDate, f64)>> {
    rows.iter()
        .map(|row| {
            let value = serde_json::to_value(row)
                .map_err(|e| ProcessingError::Simulation(e.to_string()))?;
            let field = value.get(column).ok_or_else(|| {
                ProcessingError::Simulation(format!(
                    "table {} has no column '{}'",
                    table.name(),
                    column
                ))
            })?;
            let number = field.as_f64().ok_or_else(|| {
                ProcessingError::Simulation(format!(
                    "column '{}' of {} is not numeric",
                    column,
                    table.name()
                ))
            })?;
            Ok((row.date(), number))
        })
        .collect()
}
