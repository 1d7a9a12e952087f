//! Observing platform identity.

use std::collections::HashMap;

use super::fields::{require, FieldError};

/// Identity of the observing platform for one production run.
///
/// Built from the file-arrival payload. Polar orbiters carry an orbit
/// number; geostationary platforms send an empty orbit field, normalized
/// here to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatelliteId {
    /// Platform name, e.g. `meteosat`.
    pub name: String,
    /// Platform number, e.g. `9`.
    pub number: String,
    /// Instrument name, e.g. `seviri`.
    pub instrument: String,
    /// Orbit number, absent for geostationary platforms.
    pub orbit: Option<String>,
}

impl SatelliteId {
    /// Extracts the platform identity from the `satellite`/`satnumber`/
    /// `instrument`/`orbit` payload fields.
    ///
    /// An empty or missing orbit field becomes `None`.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FieldError> {
        let name = require(fields, "satellite")?.to_string();
        let number = require(fields, "satnumber")?.to_string();
        let instrument = require(fields, "instrument")?.to_string();
        let orbit = match fields.get("orbit") {
            Some(value) if !value.is_empty() => Some(value.clone()),
            _ => None,
        };
        Ok(Self {
            name,
            number,
            instrument,
            orbit,
        })
    }

    /// Platform name and number concatenated, e.g. `meteosat9`.
    ///
    /// This is the form satellite allow and deny lists are written in.
    pub fn identity(&self) -> String {
        format!("{}{}", self.name, self.number)
    }

    /// Orbit number as written into output names. Orbit-less platforms
    /// render as an empty string, never a sentinel.
    pub fn orbit_str(&self) -> &str {
        self.orbit.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_fields_polar_orbiter() {
        let map = fields(&[
            ("satellite", "noaa"),
            ("satnumber", "19"),
            ("instrument", "avhrr"),
            ("orbit", "25431"),
        ]);
        let id = SatelliteId::from_fields(&map).unwrap();
        assert_eq!(id.identity(), "noaa19");
        assert_eq!(id.orbit.as_deref(), Some("25431"));
        assert_eq!(id.orbit_str(), "25431");
    }

    #[test]
    fn test_empty_orbit_becomes_none() {
        let map = fields(&[
            ("satellite", "meteosat"),
            ("satnumber", "9"),
            ("instrument", "seviri"),
            ("orbit", ""),
        ]);
        let id = SatelliteId::from_fields(&map).unwrap();
        assert_eq!(id.orbit, None);
        assert_eq!(id.orbit_str(), "");
    }

    #[test]
    fn test_missing_orbit_becomes_none() {
        let map = fields(&[
            ("satellite", "meteosat"),
            ("satnumber", "10"),
            ("instrument", "seviri"),
        ]);
        let id = SatelliteId::from_fields(&map).unwrap();
        assert_eq!(id.orbit, None);
    }

    #[test]
    fn test_missing_identity_field() {
        let map = fields(&[("satellite", "meteosat"), ("orbit", "")]);
        assert_eq!(
            SatelliteId::from_fields(&map).unwrap_err(),
            FieldError::Missing("satnumber")
        );
    }

    #[test]
    fn test_identity_concatenates_name_and_number() {
        let map = fields(&[
            ("satellite", "GOES"),
            ("satnumber", "13"),
            ("instrument", "imager"),
            ("orbit", ""),
        ]);
        let id = SatelliteId::from_fields(&map).unwrap();
        assert_eq!(id.identity(), "GOES13");
    }
}
