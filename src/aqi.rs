//! PM2.5 concentration to Air Quality Index.
//!
//! The scale is the published EPA PM2.5 breakpoint table: piecewise-linear
//! brackets from concentration ranges onto index ranges, with the index
//! rounded to the nearest integer. Categories and their advisory texts are
//! the EPA's, including the split of Hazardous into 301-400 and 401+
//! bands.

use crate::{require_range, Error};

/// One bracket of the breakpoint table: a concentration range and the
/// index range it maps onto.
struct Breakpoint {
    conc_lo: f64,
    conc_hi: f64,
    index_lo: u16,
    index_hi: u16,
}

impl Breakpoint {
    /// Linear index for a concentration in this bracket.
    fn index_at(&self, pm: f64) -> u16 {
        let slope = f64::from(self.index_hi - self.index_lo) / (self.conc_hi - self.conc_lo);
        let index = slope * (pm - self.conc_lo) + f64::from(self.index_lo);
        // Concentrations past the top bracket extrapolate above 500; the
        // index scale ends there.
        (index.round() as u16).min(500)
    }
}

/// PM2.5 breakpoints, highest first. Brackets are selected by their lower
/// bound scanning downward, so a concentration that two brackets could
/// claim (say 35.5, nominally the top of one and the bottom of the next)
/// always resolves to the higher-index bracket.
#[rustfmt::skip]
const BREAKPOINTS: [Breakpoint; 7] = [
    Breakpoint { conc_lo: 350.5, conc_hi: 500.0, index_lo: 401, index_hi: 500 },
    Breakpoint { conc_lo: 250.5, conc_hi: 350.4, index_lo: 301, index_hi: 400 },
    Breakpoint { conc_lo: 150.5, conc_hi: 250.4, index_lo: 201, index_hi: 300 },
    Breakpoint { conc_lo: 55.5,  conc_hi: 150.4, index_lo: 151, index_hi: 200 },
    Breakpoint { conc_lo: 35.5,  conc_hi: 55.4,  index_lo: 101, index_hi: 150 },
    Breakpoint { conc_lo: 12.1,  conc_hi: 35.4,  index_lo: 51,  index_hi: 100 },
    Breakpoint { conc_lo: 0.0,   conc_hi: 12.0,  index_lo: 0,   index_hi: 50  },
];

/// AQI index for a PM2.5 concentration in µg/m³.
///
/// The concentration must be in [0, 1000]; anything else is
/// [`Error::InvalidInput`]. The index is clamped to the scale's top of
/// 500.
pub fn from_concentration(pm: f64) -> Result<u16, Error> {
    require_range(pm, 0.0, 1000.0, "PM2.5 concentration")?;
    for bracket in &BREAKPOINTS {
        if pm >= bracket.conc_lo {
            return Ok(bracket.index_at(pm));
        }
    }
    // The lowest bracket starts at 0.0, so a validated pm always matched.
    Ok(0)
}

/// The six EPA air quality categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
        })
    }
}

/// Category and advisory text for an AQI index.
///
/// Bands are half-open: 50 is Good, 51 is Moderate. Indexes above 500 can
/// only have come from somewhere other than [`from_concentration`], but
/// the EPA text covers the whole 401-and-up band, so anything through 1000
/// still describes as Hazardous; past that is [`Error::InvalidInput`].
pub fn describe(index: u16) -> Result<(Category, &'static str), Error> {
    if index > 1000 {
        return Err(Error::InvalidInput(format!(
            "AQI index {index} out of range [0, 1000]"
        )));
    }
    Ok(match index {
        0..=50 => (
            Category::Good,
            "0-50: Air quality is considered satisfactory, and air pollution poses little or no risk",
        ),
        51..=100 => (
            Category::Moderate,
            "51-100: Air quality is acceptable; however, for some pollutants there may be a moderate health concern for a very small number of people who are unusually sensitive to air pollution",
        ),
        101..=150 => (
            Category::UnhealthySensitive,
            "101-150: Members of sensitive groups may experience health effects. The general public is not likely to be affected",
        ),
        151..=200 => (
            Category::Unhealthy,
            "151-200: Everyone may begin to experience health effects; members of sensitive groups may experience more serious health effects",
        ),
        201..=300 => (
            Category::VeryUnhealthy,
            "201-300: Health warnings of emergency conditions. The entire population is more likely to be affected",
        ),
        301..=400 => (
            Category::Hazardous,
            "301-400: Health alert: everyone may experience more serious health effects",
        ),
        _ => (
            Category::Hazardous,
            ">401: Health alert: everyone may experience more serious health effects",
        ),
    })
}

/// A resolved AQI: the numeric index with its category and advisory text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AqiResult {
    pub index: u16,
    pub category: Category,
    pub description: &'static str,
}

impl AqiResult {
    /// Run a PM2.5 concentration through the breakpoint table.
    pub fn from_concentration(pm: f64) -> Result<Self, Error> {
        Self::from_index(from_concentration(pm)?)
    }

    /// Attach category and advisory text to an already-computed index.
    pub fn from_index(index: u16) -> Result<Self, Error> {
        let (category, description) = describe(index)?;
        Ok(AqiResult {
            index,
            category,
            description,
        })
    }
}

impl std::fmt::Display for AqiResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.index, self.category)
    }
}
