pub mod category;
pub mod client;
pub mod error;
pub mod narrative;
pub mod pipeline;
pub mod types;

pub use category::ForecastCategory;
pub use client::WeatherApi;
pub use error::WeatherError;
pub use pipeline::{forecast_window, DayPeriod, WeatherPipeline};
pub use types::{DayPart, ForecastEntry, GeoLocation};
