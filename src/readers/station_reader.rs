use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::Encoding;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{HeaderPolicy, PipelineConfig};
use crate::error::{ProcessingError, Result};
use crate::models::{CanonicalField, RawObservation, StationPreamble};
use crate::utils::constants::{
    DEFAULT_DECIMAL_MARKER, DEFAULT_FALLBACK_ENCODING, DEFAULT_HEADER_SKIP_LINES,
    DEFAULT_PRIMARY_ENCODING, MISSING_SENTINEL,
};

/// Everything recovered from one INMET export
#[derive(Debug, Clone)]
pub struct StationFile {
    pub observations: Vec<RawObservation>,
    pub preamble: StationPreamble,
    /// Name of the encoding that decoded the file
    pub encoding: &'static str,
    pub malformed_lines: usize,
    pub unknown_headers: Vec<String>,
    pub missing_measurements: Vec<CanonicalField>,
}

/// Column position of every mapped field in the header row
struct ColumnMap {
    date: usize,
    hour: usize,
    measurements: Vec<(CanonicalField, usize)>,
    unknown: Vec<String>,
    missing: Vec<CanonicalField>,
}

/// Why a single decoding attempt did not produce a usable file
enum AttemptError {
    Undecodable(&'static str),
    Rejected(ProcessingError),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Undecodable(name) => write!(f, "invalid {} byte sequence", name),
            AttemptError::Rejected(e) => write!(f, "{}", e),
        }
    }
}

pub struct StationReader {
    header_skip_lines: usize,
    separator: u8,
    decimal_marker: char,
    primary: &'static Encoding,
    fallback: &'static Encoding,
    missing_sentinels: Vec<String>,
    header_policy: HeaderPolicy,
}

impl StationReader {
    pub fn new() -> Self {
        Self {
            header_skip_lines: DEFAULT_HEADER_SKIP_LINES,
            separator: b';',
            decimal_marker: DEFAULT_DECIMAL_MARKER.chars().next().unwrap_or(','),
            primary: Encoding::for_label(DEFAULT_PRIMARY_ENCODING.as_bytes())
                .unwrap_or(encoding_rs::WINDOWS_1252),
            fallback: Encoding::for_label(DEFAULT_FALLBACK_ENCODING.as_bytes())
                .unwrap_or(encoding_rs::UTF_8),
            missing_sentinels: vec![MISSING_SENTINEL.to_string()],
            header_policy: HeaderPolicy::Strict,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            header_skip_lines: config.header_skip_lines,
            separator: config.field_separator_byte(),
            decimal_marker: config.decimal_char(),
            primary: config.primary_encoding()?,
            fallback: config.fallback_encoding()?,
            missing_sentinels: config.missing_sentinels.clone(),
            header_policy: config.header_policy,
        })
    }

    pub fn with_header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = policy;
        self
    }

    pub fn with_skip_lines(mut self, lines: usize) -> Self {
        self.header_skip_lines = lines;
        self
    }

    pub fn primary_encoding_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Read one station export, retrying with the fallback encoding when the
    /// primary one cannot decode it or yields headers that do not map.
    pub fn read_file(&self, path: &Path) -> Result<StationFile> {
        let bytes = fs::read(path)?;

        let primary = self.attempt(&bytes, self.primary, path);
        if let Ok(file) = &primary {
            if file.unknown_headers.is_empty() {
                return primary.map_err(|e| e.into_error());
            }
        }

        debug!(
            path = %path.display(),
            fallback = self.fallback.name(),
            "Primary encoding unusable, retrying"
        );
        let fallback = self.attempt(&bytes, self.fallback, path);

        match (primary, fallback) {
            (Ok(p), Ok(f)) => {
                // Lenient policy: keep whichever decoding maps more headers
                if f.unknown_headers.len() < p.unknown_headers.len() {
                    Ok(f)
                } else {
                    Ok(p)
                }
            }
            (Ok(p), Err(_)) => Ok(p),
            (Err(_), Ok(f)) => Ok(f),
            (Err(AttemptError::Rejected(p)), Err(AttemptError::Rejected(f)))
                if std::mem::discriminant(&p) == std::mem::discriminant(&f) =>
            {
                Err(p)
            }
            (Err(p), Err(f)) => Err(ProcessingError::FileDecodeFailure {
                path: path.to_path_buf(),
                primary: self.primary.name().to_string(),
                primary_cause: p.to_string(),
                fallback: self.fallback.name().to_string(),
                fallback_cause: f.to_string(),
            }),
        }
    }

    fn attempt(
        &self,
        bytes: &[u8],
        encoding: &'static Encoding,
        path: &Path,
    ) -> std::result::Result<StationFile, AttemptError> {
        let text = encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or(AttemptError::Undecodable(encoding.name()))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        self.parse_text(text, path)
            .map(|mut file| {
                file.encoding = encoding.name();
                file
            })
            .map_err(AttemptError::Rejected)
    }

    /// Parse decoded file contents: preamble, header row, data rows
    pub fn parse_text(&self, text: &str, path: &Path) -> Result<StationFile> {
        let mut preamble_lines = Vec::with_capacity(self.header_skip_lines);
        let mut rest = text;
        for _ in 0..self.header_skip_lines {
            match rest.split_once('\n') {
                Some((line, tail)) => {
                    preamble_lines.push(line.trim_end_matches('\r'));
                    rest = tail;
                }
                None => {
                    preamble_lines.push(rest.trim_end_matches('\r'));
                    rest = "";
                }
            }
        }
        let preamble = self.parse_preamble(&preamble_lines);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.separator)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(rest.as_bytes());

        let headers = reader.headers()?.clone();
        let columns = self.map_headers(&headers, path)?;

        for field in &columns.missing {
            warn!(
                path = %path.display(),
                column = field.short_name(),
                "Measurement column absent, values treated as missing"
            );
        }

        let mut observations = Vec::new();
        let mut malformed_lines = 0;

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    debug!(error = %e, "Unreadable line skipped");
                    malformed_lines += 1;
                    continue;
                }
            };

            match self.parse_record(&record, headers.len(), &columns) {
                Some(obs) => observations.push(obs),
                None => {
                    if !record.iter().all(|field| field.is_empty()) {
                        malformed_lines += 1;
                    }
                }
            }
        }

        if malformed_lines > 0 {
            warn!(
                path = %path.display(),
                skipped = malformed_lines,
                "Malformed lines skipped"
            );
        }

        Ok(StationFile {
            observations,
            preamble,
            encoding: "",
            malformed_lines,
            unknown_headers: columns.unknown,
            missing_measurements: columns.missing,
        })
    }

    fn map_headers(&self, headers: &StringRecord, path: &Path) -> Result<ColumnMap> {
        let mut date = None;
        let mut hour = None;
        let mut measurements = Vec::new();
        let mut unknown = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }

            match CanonicalField::from_header(header) {
                Some(CanonicalField::Date) => date = date.or(Some(idx)),
                Some(CanonicalField::Hour) => hour = hour.or(Some(idx)),
                Some(field) if CanonicalField::measurements().contains(&field) => {
                    if !measurements.iter().any(|(f, _)| *f == field) {
                        measurements.push((field, idx));
                    }
                }
                Some(_) => {}
                None => match self.header_policy {
                    HeaderPolicy::Strict => {
                        return Err(ProcessingError::UnknownColumn(header.to_string()))
                    }
                    HeaderPolicy::Lenient => {
                        warn!(path = %path.display(), header, "Unknown column ignored");
                        unknown.push(header.to_string());
                    }
                },
            }
        }

        let required = |field: Option<usize>, name: &str| {
            field.ok_or_else(|| ProcessingError::MissingRequiredColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
        };
        let date = required(date, "Date")?;
        let hour = required(hour, "Hour")?;

        let missing = CanonicalField::measurements()
            .into_iter()
            .filter(|field| !measurements.iter().any(|(f, _)| f == field))
            .collect();

        Ok(ColumnMap {
            date,
            hour,
            measurements,
            unknown,
            missing,
        })
    }

    /// Parse a data row; `None` for rows that must be skipped
    fn parse_record(
        &self,
        record: &StringRecord,
        header_count: usize,
        columns: &ColumnMap,
    ) -> Option<RawObservation> {
        if record.len() > header_count {
            return None;
        }

        let date = parse_date(record.get(columns.date)?)?;
        let time = parse_hour(record.get(columns.hour)?)?;

        let mut obs = RawObservation::new(NaiveDateTime::new(date, time), fingerprint(record));
        for (field, idx) in &columns.measurements {
            let value = record.get(*idx).and_then(|token| self.parse_value(token));
            obs.set(*field, value);
        }

        Some(obs)
    }

    /// Numeric coercion: empty, sentinel or unparseable tokens are absent
    pub fn parse_value(&self, token: &str) -> Option<f64> {
        let token = token.trim();
        if token.is_empty() || self.missing_sentinels.iter().any(|s| s == token) {
            return None;
        }

        let value = token
            .replace(self.decimal_marker, ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())?;

        let is_sentinel = self
            .missing_sentinels
            .iter()
            .filter_map(|s| s.parse::<f64>().ok())
            .any(|s| s == value);
        (!is_sentinel).then_some(value)
    }

    fn parse_preamble(&self, lines: &[&str]) -> StationPreamble {
        let mut preamble = StationPreamble::default();
        let separator = self.separator as char;

        for line in lines {
            let Some((key, value)) = line.split_once(separator) else {
                continue;
            };
            let key = key.trim().trim_end_matches(':').to_uppercase();
            let value = value.trim().trim_end_matches(separator).trim();
            if value.is_empty() {
                continue;
            }

            if key.starts_with("REGI") {
                preamble.region = Some(value.to_string());
            } else if key == "UF" {
                preamble.state = Some(value.to_string());
            } else if key.starts_with("ESTA") {
                preamble.station = Some(value.to_string());
            } else if key.contains("WMO") {
                preamble.wmo_code = Some(value.to_string());
            } else if key.starts_with("LATITUDE") {
                preamble.latitude = self.parse_value(value);
            } else if key.starts_with("LONGITUDE") {
                preamble.longitude = self.parse_value(value);
            } else if key.starts_with("ALTITUDE") {
                preamble.altitude = self.parse_value(value);
            }
        }

        preamble
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptError {
    fn into_error(self) -> ProcessingError {
        match self {
            AttemptError::Undecodable(name) => {
                ProcessingError::InvalidFormat(format!("invalid {} byte sequence", name))
            }
            AttemptError::Rejected(e) => e,
        }
    }
}

/// Day-first date parsing; `/` and `-` separators and two- or four-digit
/// years are accepted on any row.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let normalized = text.trim().replace('/', "-");
    let first = normalized.split('-').next()?;

    if first.len() == 4 {
        NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok()
    } else {
        NaiveDate::parse_from_str(&normalized, "%d-%m-%Y")
            .ok()
            .filter(|_| normalized.rsplit('-').next().is_some_and(|y| y.len() == 4))
            .or_else(|| NaiveDate::parse_from_str(&normalized, "%d-%m-%y").ok())
    }
}

/// `"1200 UTC"`, `"12:00"` and `"0"` all become an hour of the day
pub fn parse_hour(text: &str) -> Option<NaiveTime> {
    let digits: String = text.trim().replace(" UTC", "").replace(':', "");
    let digits = digits.trim();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let padded = format!("{:0>4}", digits);
    let hour = padded[..2].parse::<u32>().ok()?;
    let minute = padded[2..].parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn fingerprint(record: &StringRecord) -> u64 {
    let mut hasher = DefaultHasher::new();
    for field in record.iter() {
        field.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PREAMBLE: &str = "REGIAO:;NE\nUF:;MA\nESTACAO:;IMPERATRIZ\nCODIGO (WMO):;A225\nLATITUDE:;-5,53638888\nLONGITUDE:;-47,45999999\nALTITUDE:;126,33\nDATA DE FUNDACAO:;2008-05-28\n";

    const HEADER: &str = "Data;Hora UTC;PRECIPITAÇÃO TOTAL, HORÁRIO (mm);RADIACAO GLOBAL (Kj/m²);TEMPERATURA MÁXIMA NA HORA ANT. (AUT) (°C);TEMPERATURA MÍNIMA NA HORA ANT. (AUT) (°C);UMIDADE RELATIVA DO AR, HORARIA (%);VENTO, VELOCIDADE HORARIA (m/s);";

    fn station_text(rows: &[&str]) -> String {
        let mut text = String::from(PREAMBLE);
        text.push_str(HEADER);
        text.push('\n');
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    fn write_latin1(text: &str) -> NamedTempFile {
        let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(text);
        assert!(!unmappable);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file
    }

    #[test]
    fn test_read_latin1_file() -> Result<()> {
        let text = station_text(&[
            "2022/01/15;1200 UTC;0,2;1500;31,5;30,1;70;2,0;",
            "2022/01/15;1300 UTC;;-9999;32,0;30,9;65;2,4;",
        ]);
        let file = write_latin1(&text);

        let station = StationReader::new().read_file(file.path())?;
        assert_eq!(station.encoding, "windows-1252");
        assert_eq!(station.observations.len(), 2);
        assert_eq!(station.malformed_lines, 0);
        assert!(station.missing_measurements.is_empty());

        let first = &station.observations[0];
        assert_eq!(first.timestamp.to_string(), "2022-01-15 12:00:00");
        assert_eq!(first.precipitation, Some(0.2));
        assert_eq!(first.radiation, Some(1500.0));
        assert_eq!(first.temp_max, Some(31.5));
        assert_eq!(first.wind_speed, Some(2.0));

        let second = &station.observations[1];
        assert_eq!(second.precipitation, None);
        assert_eq!(second.radiation, None);

        assert_eq!(station.preamble.station.as_deref(), Some("IMPERATRIZ"));
        assert_eq!(station.preamble.latitude, Some(-5.53638888));
        assert_eq!(station.preamble.altitude, Some(126.33));

        Ok(())
    }

    #[test]
    fn test_utf8_file_uses_fallback() -> Result<()> {
        let text = station_text(&["2022/01/15;1200 UTC;0,2;1500;31,5;30,1;70;2,0;"]);
        let mut file = NamedTempFile::new()?;
        file.write_all(text.as_bytes())?;

        let station = StationReader::new().read_file(file.path())?;
        assert_eq!(station.encoding, "UTF-8");
        assert_eq!(station.observations[0].precipitation, Some(0.2));

        Ok(())
    }

    #[test]
    fn test_undecodable_file_reports_both_causes() {
        let mut text = station_text(&[]);
        text = text.replace("Data;", "Data;Bogus;");
        let file = write_latin1(&text);

        let err = StationReader::new().read_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileDecodeFailure);
        let message = err.to_string();
        assert!(message.contains("windows-1252"));
        assert!(message.contains("UTF-8"));
    }

    #[test]
    fn test_lenient_headers_and_missing_columns() -> Result<()> {
        let text = format!(
            "{}Data;Hora UTC;Extra;VENTO, VELOCIDADE HORARIA (m/s);\n2022-01-15;0000 UTC;x;1,5;\n",
            PREAMBLE
        );
        let mut file = NamedTempFile::new()?;
        file.write_all(text.as_bytes())?;

        let strict = StationReader::new().read_file(file.path());
        assert!(strict.is_err());

        let station = StationReader::new()
            .with_header_policy(HeaderPolicy::Lenient)
            .read_file(file.path())?;
        assert_eq!(station.unknown_headers, vec!["Extra".to_string()]);
        assert_eq!(station.missing_measurements.len(), 5);
        assert_eq!(station.observations[0].wind_speed, Some(1.5));
        assert_eq!(station.observations[0].temp_max, None);

        Ok(())
    }

    #[test]
    fn test_missing_hour_column() -> Result<()> {
        let text = format!("{}Data;VENTO, VELOCIDADE HORARIA (m/s)\n2022-01-15;1,5\n", PREAMBLE);
        let mut file = NamedTempFile::new()?;
        file.write_all(text.as_bytes())?;

        let err = StationReader::new().read_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredColumn);

        Ok(())
    }

    #[test]
    fn test_malformed_lines_skipped() -> Result<()> {
        let text = station_text(&[
            "2022/01/15;1200 UTC;0,2;1500;31,5;30,1;70;2,0;",
            "2022/01/15;1300 UTC;0,2;1500;31,5;30,1;70;2,0;;extra;fields",
            "not a date;1400 UTC;0,2;1500;31,5;30,1;70;2,0;",
            "2022/01/15;25h;0,2;1500;31,5;30,1;70;2,0;",
        ]);
        let file = write_latin1(&text);

        let station = StationReader::new().read_file(file.path())?;
        assert_eq!(station.observations.len(), 1);
        assert_eq!(station.malformed_lines, 3);

        Ok(())
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2022, 3, 4);
        assert_eq!(parse_date("2022-03-04"), expected);
        assert_eq!(parse_date("2022/03/04"), expected);
        assert_eq!(parse_date("04/03/2022"), expected);
        assert_eq!(parse_date("04-03-22"), expected);
        assert_eq!(parse_date("2022-13-04"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_hour_formats() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0);
        assert_eq!(parse_hour("1200 UTC"), noon);
        assert_eq!(parse_hour("12:00"), noon);
        assert_eq!(parse_hour("0"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_hour("930"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_hour("2500"), None);
        assert_eq!(parse_hour("noon"), None);
    }

    #[test]
    fn test_parse_value() {
        let reader = StationReader::new();
        assert_eq!(reader.parse_value("1,5"), Some(1.5));
        assert_eq!(reader.parse_value("-9999"), None);
        assert_eq!(reader.parse_value("-9999,0"), None);
        assert_eq!(reader.parse_value(""), None);
        assert_eq!(reader.parse_value("abc"), None);
    }
}
