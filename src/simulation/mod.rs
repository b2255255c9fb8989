//! Crop water-balance simulation over an exported climate file.
//!
//! The model itself lives behind [`CropSimulator`]; this module owns the
//! typed run configuration, checks the weather table against the simulation
//! window and post-processes the daily output tables.

pub mod output;
pub mod parameters;

pub use output::{
    filter_window, CropGrowthDay, Dated, OutputTable, SeasonStats, SimulationOutput,
    WaterFluxDay, WaterStorageDay,
};
pub use parameters::{
    Crop, DepthMethod, FieldManagement, GroundWater, InitialWaterContent, IrrigationEvent,
    IrrigationManagement, IrrigationMethod, SimulationConfig, Soil, SoilLayer, SoilTexture,
    WaterContentValue,
};

use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::WeatherDay;

/// A crop model that turns a configuration and daily weather into output tables
pub trait CropSimulator {
    /// `weather` covers `config.start..=config.end`, one row per day, in order
    fn simulate(&self, config: &SimulationConfig, weather: &[WeatherDay]) -> Result<SimulationOutput>;
}

/// Rows of `weather` spanning the simulation window. The window must be
/// covered without gaps; rows outside it are ignored.
pub fn weather_window<'a>(config: &SimulationConfig, weather: &'a [WeatherDay]) -> Result<&'a [WeatherDay]> {
    let start = weather.partition_point(|d| d.date < config.start);
    let end = weather.partition_point(|d| d.date <= config.end);
    let window = &weather[start..end];

    let (first, last) = match (window.first(), window.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => {
            return Err(ProcessingError::Simulation(format!(
                "no weather between {} and {}",
                config.start, config.end
            )))
        }
    };

    if first != config.start || last != config.end {
        return Err(ProcessingError::Simulation(format!(
            "weather covers {} to {}, simulation needs {} to {}",
            first, last, config.start, config.end
        )));
    }

    if let Some(pair) = window
        .windows(2)
        .find(|w| (w[1].date - w[0].date).num_days() != 1)
    {
        return Err(ProcessingError::Simulation(format!(
            "weather is not contiguous between {} and {}",
            pair[0].date, pair[1].date
        )));
    }

    Ok(window)
}

/// Check the configuration, slice the weather to the window and run the engine
pub fn run_simulation<S: CropSimulator + ?Sized>(
    simulator: &S,
    config: &SimulationConfig,
    weather: &[WeatherDay],
) -> Result<SimulationOutput> {
    config.check()?;

    if weather.windows(2).any(|w| w[0].date >= w[1].date) {
        return Err(ProcessingError::Simulation(
            "weather rows must be in strictly increasing date order".to_string(),
        ));
    }

    let window = weather_window(config, weather)?;
    debug!(days = window.len(), start = %config.start, end = %config.end, "Running crop simulation");

    let output = simulator.simulate(config, window)?;

    if let Some(day) = output
        .water_flux
        .iter()
        .find(|d| d.date < config.start || d.date > config.end)
    {
        return Err(ProcessingError::Simulation(format!(
            "simulator returned a row for {} outside the window",
            day.date
        )));
    }

    info!(
        days = output.water_flux.len(),
        seasons = output.final_stats.len(),
        irrigation_mm = output.seasonal_irrigation(),
        "Simulation finished"
    );
    Ok(output)
}
