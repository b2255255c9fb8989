use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Every column an INMET automatic-station export is known to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    Date,
    Hour,
    Precipitation,
    StationPressure,
    PressureMax,
    PressureMin,
    GlobalRadiation,
    DryBulbTemp,
    DewPoint,
    TempMax,
    TempMin,
    DewPointMax,
    DewPointMin,
    HumidityMax,
    HumidityMin,
    RelativeHumidity,
    WindDirection,
    WindGust,
    WindSpeed,
}

/// Source header text -> canonical field. Both the pre-2019 and the current
/// INMET layouts are listed.
const HEADER_TABLE: &[(&str, CanonicalField)] = &[
    ("DATA (YYYY-MM-DD)", CanonicalField::Date),
    ("Data", CanonicalField::Date),
    ("HORA (UTC)", CanonicalField::Hour),
    ("Hora UTC", CanonicalField::Hour),
    ("PRECIPITAÇÃO TOTAL, HORÁRIO (mm)", CanonicalField::Precipitation),
    (
        "PRESSAO ATMOSFERICA AO NIVEL DA ESTACAO, HORARIA (mB)",
        CanonicalField::StationPressure,
    ),
    (
        "PRESSÃO ATMOSFERICA MAX.NA HORA ANT. (AUT) (mB)",
        CanonicalField::PressureMax,
    ),
    (
        "PRESSÃO ATMOSFERICA MIN. NA HORA ANT. (AUT) (mB)",
        CanonicalField::PressureMin,
    ),
    ("RADIACAO GLOBAL (Kj/m²)", CanonicalField::GlobalRadiation),
    (
        "TEMPERATURA DO AR - BULBO SECO, HORARIA (°C)",
        CanonicalField::DryBulbTemp,
    ),
    ("TEMPERATURA DO PONTO DE ORVALHO (°C)", CanonicalField::DewPoint),
    (
        "TEMPERATURA MÁXIMA NA HORA ANT. (AUT) (°C)",
        CanonicalField::TempMax,
    ),
    (
        "TEMPERATURA MÍNIMA NA HORA ANT. (AUT) (°C)",
        CanonicalField::TempMin,
    ),
    (
        "TEMPERATURA ORVALHO MAX. NA HORA ANT. (AUT) (°C)",
        CanonicalField::DewPointMax,
    ),
    (
        "TEMPERATURA ORVALHO MIN. NA HORA ANT. (AUT) (°C)",
        CanonicalField::DewPointMin,
    ),
    ("UMIDADE REL. MAX. NA HORA ANT. (AUT) (%)", CanonicalField::HumidityMax),
    ("UMIDADE REL. MIN. NA HORA ANT. (AUT) (%)", CanonicalField::HumidityMin),
    (
        "UMIDADE RELATIVA DO AR, HORARIA (%)",
        CanonicalField::RelativeHumidity,
    ),
    (
        "VENTO, DIREÇÃO HORARIA (gr) (° (gr))",
        CanonicalField::WindDirection,
    ),
    ("VENTO, RAJADA MAXIMA (m/s)", CanonicalField::WindGust),
    ("VENTO, VELOCIDADE HORARIA (m/s)", CanonicalField::WindSpeed),
];

impl CanonicalField {
    /// Look up a source header. Surrounding whitespace is ignored and the
    /// comparison is case-insensitive (INMET has shipped both `Kj/m²` and
    /// `KJ/m²`).
    pub fn from_header(header: &str) -> Option<Self> {
        let wanted = header.trim().to_uppercase();
        HEADER_TABLE
            .iter()
            .find(|(text, _)| text.to_uppercase() == wanted)
            .map(|(_, field)| *field)
    }

    /// Short name used in logs and the cleaned CSV
    pub fn short_name(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Hour => "hour",
            CanonicalField::Precipitation => "precip",
            CanonicalField::StationPressure => "pressure",
            CanonicalField::PressureMax => "pressure_max",
            CanonicalField::PressureMin => "pressure_min",
            CanonicalField::GlobalRadiation => "rad",
            CanonicalField::DryBulbTemp => "temp",
            CanonicalField::DewPoint => "dew_point",
            CanonicalField::TempMax => "tmax",
            CanonicalField::TempMin => "tmin",
            CanonicalField::DewPointMax => "dew_point_max",
            CanonicalField::DewPointMin => "dew_point_min",
            CanonicalField::HumidityMax => "rh_max",
            CanonicalField::HumidityMin => "rh_min",
            CanonicalField::RelativeHumidity => "rh",
            CanonicalField::WindDirection => "wind_dir",
            CanonicalField::WindGust => "wind_gust",
            CanonicalField::WindSpeed => "wind",
        }
    }

    /// Measurement columns carried into `RawObservation`
    pub fn measurements() -> [CanonicalField; 6] {
        [
            CanonicalField::Precipitation,
            CanonicalField::TempMax,
            CanonicalField::TempMin,
            CanonicalField::RelativeHumidity,
            CanonicalField::WindSpeed,
            CanonicalField::GlobalRadiation,
        ]
    }
}

/// One hourly row of a station export. `None` marks an absent value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub timestamp: NaiveDateTime,
    pub precipitation: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub radiation: Option<f64>,
    /// Hash of the complete source row, mapped columns or not
    pub fingerprint: u64,
}

impl RawObservation {
    pub fn new(timestamp: NaiveDateTime, fingerprint: u64) -> Self {
        Self {
            timestamp,
            precipitation: None,
            temp_max: None,
            temp_min: None,
            relative_humidity: None,
            wind_speed: None,
            radiation: None,
            fingerprint,
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: Option<f64>) {
        match field {
            CanonicalField::Precipitation => self.precipitation = value,
            CanonicalField::TempMax => self.temp_max = value,
            CanonicalField::TempMin => self.temp_min = value,
            CanonicalField::RelativeHumidity => self.relative_humidity = value,
            CanonicalField::WindSpeed => self.wind_speed = value,
            CanonicalField::GlobalRadiation => self.radiation = value,
            _ => {}
        }
    }

    pub fn date(&self) -> chrono::NaiveDate {
        self.timestamp.date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_both_layouts() {
        assert_eq!(
            CanonicalField::from_header("DATA (YYYY-MM-DD)"),
            Some(CanonicalField::Date)
        );
        assert_eq!(CanonicalField::from_header("Data"), Some(CanonicalField::Date));
        assert_eq!(
            CanonicalField::from_header("  Hora UTC "),
            Some(CanonicalField::Hour)
        );
        assert_eq!(
            CanonicalField::from_header("RADIACAO GLOBAL (KJ/m²)"),
            Some(CanonicalField::GlobalRadiation)
        );
        assert_eq!(
            CanonicalField::from_header("VENTO, VELOCIDADE HORARIA (m/s)"),
            Some(CanonicalField::WindSpeed)
        );
    }

    #[test]
    fn test_mis_decoded_header_is_unknown() {
        // UTF-8 bytes read as Latin-1
        assert_eq!(
            CanonicalField::from_header("PRECIPITAÃ\u{2021}ÃƒO TOTAL, HORÃ\u{81}RIO (mm)"),
            None
        );
        assert_eq!(CanonicalField::from_header("Unnamed: 19"), None);
    }

    #[test]
    fn test_set_ignores_unused_fields() {
        let ts = chrono::NaiveDate::from_ymd_opt(2022, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut obs = RawObservation::new(ts, 0);
        obs.set(CanonicalField::TempMax, Some(31.2));
        obs.set(CanonicalField::DewPoint, Some(22.0));

        assert_eq!(obs.temp_max, Some(31.2));
        assert_eq!(obs.temp_min, None);
        assert_eq!(obs.date().to_string(), "2022-01-01");
    }
}
