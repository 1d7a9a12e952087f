//! Spectral channels of an observing instrument.

/// Closed wavelength interval in micrometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthRange {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive.
    pub max: f64,
}

impl WavelengthRange {
    /// Builds an interval. Bounds are taken as given; callers supply
    /// `min <= max`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether a reference wavelength falls inside the interval,
    /// boundaries included.
    pub fn contains(&self, wavelength: f64) -> bool {
        self.min <= wavelength && wavelength <= self.max
    }
}

/// One spectral band of the observing instrument.
///
/// The loaded flag tracks whether the channel's data is resident in the
/// scene handle that owns this inventory entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Instrument channel name, e.g. `IR_108`.
    pub name: String,
    /// Sensitivity interval.
    pub wavelength: WavelengthRange,
    /// Whether the channel data is resident.
    pub loaded: bool,
}

impl Channel {
    /// Builds an unloaded channel.
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            wavelength: WavelengthRange::new(min, max),
            loaded: false,
        }
    }

    /// Same channel with the loaded flag set.
    pub fn loaded(mut self) -> Self {
        self.loaded = true;
        self
    }
}
