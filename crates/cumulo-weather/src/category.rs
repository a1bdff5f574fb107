use crate::error::WeatherError;

/// Closed set of weather categories the formatters can speak about.
/// Dispatch is a match over this enum, so a missing arm is a compile error
/// rather than a runtime miss; keys the intent engine sends that are not in
/// the set still surface as `UnknownCategory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastCategory {
    General,
    Precipitation,
    Thunder,
    Wind,
    Golf,
    Temperature,
    OutsideActivities,
}

impl ForecastCategory {
    pub fn parse(key: &str) -> Result<Self, WeatherError> {
        match key {
            "general" => Ok(Self::General),
            "precipitation" => Ok(Self::Precipitation),
            "thunder" => Ok(Self::Thunder),
            "wind" => Ok(Self::Wind),
            "golf" => Ok(Self::Golf),
            "temperature" => Ok(Self::Temperature),
            "outsideactivities" => Ok(Self::OutsideActivities),
            other => Err(WeatherError::UnknownCategory(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Precipitation => "precipitation",
            Self::Thunder => "thunder",
            Self::Wind => "wind",
            Self::Golf => "golf",
            Self::Temperature => "temperature",
            Self::OutsideActivities => "outsideactivities",
        }
    }
}
