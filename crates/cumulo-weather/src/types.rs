use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Resolved coordinates plus administrative metadata for a free-text place
/// name. Derived once per weather request, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub admin_district: String,
    /// The postal key truncated at its first `:` separator.
    pub postal_prefix: String,
}

impl GeoLocation {
    /// "City, AdminDistrict" as spoken in the narratives.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.city, self.admin_district)
    }
}

/// One day of the daily-forecast payload. `narrative` and `qpf` live at the
/// entry level; the remaining category fields sit in the day/night parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub fcst_valid_local: DateTime<FixedOffset>,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub qpf: Option<f64>,
    #[serde(default)]
    pub day: Option<DayPart>,
    #[serde(default)]
    pub night: Option<DayPart>,
}

impl ForecastEntry {
    /// Preferred sub-record: daytime when present, otherwise nighttime.
    pub fn part(&self) -> Option<&DayPart> {
        self.day.as_ref().or(self.night.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayPart {
    #[serde(default)]
    pub hi: Option<f64>,
    #[serde(default)]
    pub golf_category: Option<String>,
    #[serde(default)]
    pub thunder_enum_phrase: Option<String>,
    #[serde(default)]
    pub wind_phrase: Option<String>,
}
