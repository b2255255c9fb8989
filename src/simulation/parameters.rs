use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::error::{ProcessingError, Result};

fn invalid(message: impl Into<String>) -> ProcessingError {
    ProcessingError::Simulation(message.into())
}

/// Built-in AquaCrop soil texture classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilTexture {
    Clay,
    ClayLoam,
    Loam,
    LoamySand,
    Sand,
    SandyClay,
    SandyClayLoam,
    SandyLoam,
    Silt,
    SiltClayLoam,
    SiltLoam,
    SiltClay,
    Paddy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SoilLayer {
    /// metres
    #[validate(range(min = 0.01, max = 10.0))]
    pub thickness: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub wilting_point: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub field_capacity: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub saturation: f64,
    /// mm/day
    #[validate(range(min = 0.0))]
    pub ksat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Soil {
    Texture {
        texture: SoilTexture,
    },
    Custom {
        name: String,
        layers: Vec<SoilLayer>,
        curve_number: f64,
        readily_evaporable_water: f64,
    },
}

impl Soil {
    pub fn texture(texture: SoilTexture) -> Self {
        Soil::Texture { texture }
    }

    pub fn check(&self) -> Result<()> {
        let Soil::Custom {
            layers,
            curve_number,
            readily_evaporable_water,
            ..
        } = self
        else {
            return Ok(());
        };

        if layers.is_empty() {
            return Err(invalid("custom soil needs at least one layer"));
        }
        for (i, layer) in layers.iter().enumerate() {
            layer.validate()?;
            if !(layer.wilting_point < layer.field_capacity
                && layer.field_capacity < layer.saturation)
            {
                return Err(invalid(format!(
                    "soil layer {}: expected WP < FC < SAT, got {} / {} / {}",
                    i + 1,
                    layer.wilting_point,
                    layer.field_capacity,
                    layer.saturation
                )));
            }
        }
        if !(1.0..=100.0).contains(curve_number) {
            return Err(invalid(format!("curve number {} outside 1-100", curve_number)));
        }
        if *readily_evaporable_water < 0.0 {
            return Err(invalid("readily evaporable water must be non-negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Crop {
    #[validate(length(min = 1))]
    pub crop_type: String,
    /// `MM/DD`
    pub planting_date: String,
    pub harvest_date: Option<String>,
    /// Parameter name -> value, passed to the engine untouched
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

impl Crop {
    pub fn new(crop_type: impl Into<String>, planting_date: impl Into<String>) -> Self {
        Self {
            crop_type: crop_type.into(),
            planting_date: planting_date.into(),
            harvest_date: None,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, parameter: &str, value: f64) -> Self {
        self.overrides.insert(parameter.to_string(), value);
        self
    }

    pub fn planting_month_day(&self) -> Result<(u32, u32)> {
        parse_month_day(&self.planting_date)
    }

    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.planting_month_day()?;
        if let Some(harvest) = &self.harvest_date {
            parse_month_day(harvest)?;
        }
        Ok(())
    }
}

/// Parse `MM/DD`; 02/29 is accepted
pub fn parse_month_day(text: &str) -> Result<(u32, u32)> {
    let bad = || invalid(format!("'{}' is not a MM/DD date", text));
    let (month, day) = text.trim().split_once('/').ok_or_else(bad)?;
    let month: u32 = month.parse().map_err(|_| bad())?;
    let day: u32 = day.parse().map_err(|_| bad())?;

    NaiveDate::from_ymd_opt(2000, month, day).ok_or_else(bad)?;
    Ok((month, day))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterContentValue {
    FieldCapacity,
    WiltingPoint,
    Saturation,
    /// % of total available water
    PercentTaw(f64),
    /// m³/m³
    Volumetric(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMethod {
    Layer,
    Depth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialWaterContent {
    pub method: DepthMethod,
    /// Layer numbers or depths (m), one per value
    pub positions: Vec<f64>,
    pub values: Vec<WaterContentValue>,
}

impl Default for InitialWaterContent {
    fn default() -> Self {
        Self {
            method: DepthMethod::Layer,
            positions: vec![1.0],
            values: vec![WaterContentValue::FieldCapacity],
        }
    }
}

impl InitialWaterContent {
    pub fn check(&self) -> Result<()> {
        if self.values.is_empty() || self.values.len() != self.positions.len() {
            return Err(invalid(format!(
                "initial water content needs one position per value ({} positions, {} values)",
                self.positions.len(),
                self.values.len()
            )));
        }
        if self.positions.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("initial water content positions must increase"));
        }
        for value in &self.values {
            match value {
                WaterContentValue::PercentTaw(p) if !(0.0..=100.0).contains(p) => {
                    return Err(invalid(format!("{}% TAW outside 0-100", p)))
                }
                WaterContentValue::Volumetric(v) if !(0.0..=1.0).contains(v) => {
                    return Err(invalid(format!("volumetric content {} outside 0-1", v)))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrigationEvent {
    pub date: NaiveDate,
    /// mm
    pub depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum IrrigationMethod {
    Rainfed,
    /// Irrigate when root-zone depletion reaches the stage threshold (% TAW):
    /// emergence, canopy growth, maximum canopy, senescence
    SoilMoistureThreshold { thresholds: [f64; 4] },
    FixedInterval { interval_days: u32 },
    Schedule { events: Vec<IrrigationEvent> },
    /// Keep root-zone water above this % TAW every day
    NetIrrigation { threshold: f64 },
    ConstantDepth { depth: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct IrrigationManagement {
    pub method: IrrigationMethod,
    /// %
    #[validate(range(min = 0.0, max = 100.0))]
    pub application_efficiency: f64,
    /// %
    #[validate(range(min = 0.0, max = 100.0))]
    pub wetted_surface: f64,
    /// mm per event
    #[validate(range(min = 0.0))]
    pub max_irrigation: f64,
}

impl IrrigationManagement {
    pub fn new(method: IrrigationMethod) -> Self {
        Self {
            method,
            application_efficiency: 100.0,
            wetted_surface: 100.0,
            max_irrigation: 25.0,
        }
    }

    pub fn rainfed() -> Self {
        Self::new(IrrigationMethod::Rainfed)
    }

    pub fn check(&self) -> Result<()> {
        self.validate()?;
        match &self.method {
            IrrigationMethod::SoilMoistureThreshold { thresholds } => {
                if let Some(t) = thresholds.iter().find(|t| !(0.0..=100.0).contains(*t)) {
                    return Err(invalid(format!("threshold {}% TAW outside 0-100", t)));
                }
            }
            IrrigationMethod::FixedInterval { interval_days } if *interval_days == 0 => {
                return Err(invalid("irrigation interval must be at least one day"));
            }
            IrrigationMethod::Schedule { events } => {
                if events.iter().any(|e| e.depth < 0.0) {
                    return Err(invalid("scheduled irrigation depth must be non-negative"));
                }
                if events.windows(2).any(|w| w[0].date >= w[1].date) {
                    return Err(invalid("irrigation schedule dates must increase"));
                }
            }
            IrrigationMethod::NetIrrigation { threshold } if !(0.0..=100.0).contains(threshold) => {
                return Err(invalid(format!("net irrigation threshold {} outside 0-100", threshold)));
            }
            IrrigationMethod::ConstantDepth { depth } if *depth < 0.0 => {
                return Err(invalid("constant irrigation depth must be non-negative"));
            }
            _ => {}
        }
        Ok(())
    }
}

impl Default for IrrigationManagement {
    fn default() -> Self {
        Self::rainfed()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroundWater {
    #[default]
    Absent,
    /// Water table depth in metres
    Constant { depth: f64 },
    Variable { observations: Vec<(NaiveDate, f64)> },
}

impl GroundWater {
    pub fn check(&self) -> Result<()> {
        match self {
            GroundWater::Absent => Ok(()),
            GroundWater::Constant { depth } if *depth <= 0.0 => {
                Err(invalid("water table depth must be positive"))
            }
            GroundWater::Constant { .. } => Ok(()),
            GroundWater::Variable { observations } => {
                if observations.is_empty() {
                    return Err(invalid("variable water table needs at least one observation"));
                }
                if observations.iter().any(|(_, depth)| *depth <= 0.0) {
                    return Err(invalid("water table depth must be positive"));
                }
                if observations.windows(2).any(|w| w[0].0 >= w[1].0) {
                    return Err(invalid("water table observation dates must increase"));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FieldManagement {
    pub mulches: bool,
    /// % of surface covered
    #[validate(range(min = 0.0, max = 100.0))]
    pub mulch_pct: f64,
    /// Soil evaporation adjustment factor for mulch
    #[validate(range(min = 0.0, max = 1.0))]
    pub mulch_factor: f64,
    pub bunds: bool,
    /// m
    #[validate(range(min = 0.0))]
    pub bund_height: f64,
    /// mm
    #[validate(range(min = 0.0))]
    pub bund_water: f64,
    pub curve_number_adjusted: bool,
    /// % change of the curve number
    #[validate(range(min = -100.0, max = 100.0))]
    pub curve_number_adjustment_pct: f64,
    pub runoff_inhibited: bool,
}

impl Default for FieldManagement {
    fn default() -> Self {
        Self {
            mulches: false,
            mulch_pct: 50.0,
            mulch_factor: 0.5,
            bunds: false,
            bund_height: 0.0,
            bund_water: 0.0,
            curve_number_adjusted: false,
            curve_number_adjustment_pct: 0.0,
            runoff_inhibited: false,
        }
    }
}

impl FieldManagement {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.bunds && self.bund_height <= 0.0 {
            return Err(invalid("bunds enabled with zero height"));
        }
        Ok(())
    }
}

/// Everything the engine needs besides the weather table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub soil: Soil,
    pub crop: Crop,
    #[serde(default)]
    pub initial_water_content: InitialWaterContent,
    #[serde(default)]
    pub irrigation: IrrigationManagement,
    #[serde(default)]
    pub groundwater: GroundWater,
    #[serde(default)]
    pub field_management: FieldManagement,
}

impl SimulationConfig {
    pub fn new(start: NaiveDate, end: NaiveDate, soil: Soil, crop: Crop) -> Self {
        Self {
            start,
            end,
            soil,
            crop,
            initial_water_content: InitialWaterContent::default(),
            irrigation: IrrigationManagement::default(),
            groundwater: GroundWater::default(),
            field_management: FieldManagement::default(),
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn check(&self) -> Result<()> {
        if self.start > self.end {
            return Err(invalid(format!(
                "simulation starts {} after it ends {}",
                self.start, self.end
            )));
        }

        self.soil.check()?;
        self.crop.check()?;
        self.initial_water_content.check()?;
        self.irrigation.check()?;
        self.groundwater.check()?;
        self.field_management.check()?;

        if let IrrigationMethod::Schedule { events } = &self.irrigation.method {
            if let Some(e) = events.iter().find(|e| e.date < self.start || e.date > self.end) {
                return Err(invalid(format!(
                    "irrigation on {} falls outside the simulation window",
                    e.date
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn maize() -> SimulationConfig {
        SimulationConfig::new(
            date(2022, 11, 1),
            date(2023, 5, 30),
            Soil::texture(SoilTexture::Loam),
            Crop::new("Maize", "11/01"),
        )
    }

    #[test]
    fn test_default_configuration_is_valid() {
        let config = maize();
        assert!(config.check().is_ok());
        assert_eq!(config.days(), 211);
        assert_eq!(config.crop.planting_month_day().unwrap(), (11, 1));
    }

    #[test]
    fn test_month_day_parsing() {
        assert_eq!(parse_month_day("02/29").unwrap(), (2, 29));
        assert!(parse_month_day("13/01").is_err());
        assert!(parse_month_day("2022/11/01").is_err());
        assert!(parse_month_day("11-01").is_err());
    }

    #[test]
    fn test_threshold_irrigation_and_management() {
        let mut config = maize();
        config.irrigation = IrrigationManagement {
            application_efficiency: 90.0,
            max_irrigation: 50.0,
            ..IrrigationManagement::new(IrrigationMethod::SoilMoistureThreshold {
                thresholds: [50.0, 50.0, 50.0, 50.0],
            })
        };
        config.field_management = FieldManagement {
            mulches: true,
            mulch_pct: 80.0,
            mulch_factor: 0.3,
            ..Default::default()
        };
        config.groundwater = GroundWater::Variable {
            observations: vec![
                (date(2022, 11, 1), 2.5),
                (date(2023, 3, 1), 2.0),
                (date(2023, 7, 1), 2.5),
            ],
        };
        assert!(config.check().is_ok());

        config.irrigation.method = IrrigationMethod::SoilMoistureThreshold {
            thresholds: [50.0, 120.0, 50.0, 50.0],
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_invalid_components() {
        let mut config = maize();
        config.soil = Soil::Custom {
            name: "layered".to_string(),
            layers: vec![SoilLayer {
                thickness: 0.5,
                wilting_point: 0.3,
                field_capacity: 0.2,
                saturation: 0.45,
                ksat: 300.0,
            }],
            curve_number: 61.0,
            readily_evaporable_water: 9.0,
        };
        assert!(config.check().is_err());

        let mut config = maize();
        config.irrigation = IrrigationManagement::new(IrrigationMethod::Schedule {
            events: vec![IrrigationEvent {
                date: date(2024, 1, 1),
                depth: 25.0,
            }],
        });
        assert!(config.check().is_err());

        let mut config = maize();
        config.initial_water_content = InitialWaterContent {
            method: DepthMethod::Depth,
            positions: vec![0.3, 0.9],
            values: vec![WaterContentValue::PercentTaw(40.0)],
        };
        assert!(config.check().is_err());

        let mut config = maize();
        config.end = date(2022, 10, 1);
        assert!(config.check().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "start": "2022-11-01",
            "end": "2023-05-30",
            "soil": {"kind": "texture", "texture": "SandyLoam"},
            "crop": {"crop_type": "Maize", "planting_date": "11/01", "harvest_date": null},
            "irrigation": {
                "method": {"method": "fixed_interval", "interval_days": 7},
                "application_efficiency": 85.0,
                "wetted_surface": 100.0,
                "max_irrigation": 30.0
            }
        }"#;

        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.soil, Soil::texture(SoilTexture::SandyLoam));
        assert_eq!(config.groundwater, GroundWater::Absent);
        assert_eq!(
            config.irrigation.method,
            IrrigationMethod::FixedInterval { interval_days: 7 }
        );
        assert!(config.check().is_ok());
    }
}
