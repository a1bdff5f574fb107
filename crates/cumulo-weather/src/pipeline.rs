use chrono::{DateTime, NaiveTime, Utc};
use cumulo_schema::TurnContext;

use crate::category::ForecastCategory;
use crate::client::WeatherApi;
use crate::error::WeatherError;
use crate::narrative;
use crate::types::ForecastEntry;

/// Coarse time-of-day bucket derived from the requested clock time.
/// Informational only: no current formatter branches on it, but it is
/// threaded through so the narratives can use it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
}

impl DayPeriod {
    /// Strictly before noon is morning, before 18:00 afternoon, anything
    /// later has no bucket.
    pub fn classify(time: NaiveTime) -> Option<Self> {
        let noon = NaiveTime::from_hms_opt(12, 0, 0)?;
        let six_pm = NaiveTime::from_hms_opt(18, 0, 0)?;
        if time < noon {
            Some(Self::Morning)
        } else if time < six_pm {
            Some(Self::Afternoon)
        } else {
            None
        }
    }

    /// Parses "HH:MM:SS"; unparseable input yields no bucket.
    pub fn from_clock(raw: &str) -> Option<Self> {
        let time = NaiveTime::parse_from_str(raw, "%H:%M:%S").ok()?;
        Self::classify(time)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
        }
    }
}

/// Maps the day offset of the requested date to a forecast window length.
/// Offsets outside the bucketed range (including 10 and beyond) keep the
/// initial default of 3: the request silently truncates to a window that
/// cannot contain the day, and the formatters answer with their fallback.
pub fn forecast_window(offset_days: i64) -> u8 {
    if offset_days < 3 {
        3
    } else if offset_days < 5 {
        5
    } else if offset_days < 7 {
        7
    } else if offset_days < 10 {
        10
    } else {
        3
    }
}

/// First entry whose local valid date shares the requested calendar day.
pub fn select_day(forecasts: &[ForecastEntry], when: DateTime<Utc>) -> Option<&ForecastEntry> {
    let target = when.date_naive();
    forecasts
        .iter()
        .find(|f| f.fcst_valid_local.date_naive() == target)
}

/// Fills slot defaults in place: category falls back to "general", the date
/// to now, and an activity request overrides the category outright.
fn apply_defaults(ctx: &mut TurnContext) -> DateTime<Utc> {
    if ctx.weather_what.is_none() {
        ctx.weather_what = Some("general".to_string());
    }
    if ctx.weather_activity {
        ctx.weather_what = Some("outsideactivities".to_string());
    }
    *ctx.weather_when.get_or_insert_with(Utc::now)
}

/// Replaces the raw clock time in the context with its bucket label (or
/// clears it) and returns the bucket.
fn classify_time(ctx: &mut TurnContext) -> Option<DayPeriod> {
    let period = ctx.weather_time.as_deref().and_then(DayPeriod::from_clock);
    ctx.weather_time = period.map(|p| p.label().to_string());
    period
}

/// Resolves a weather request carried in a turn context to a single
/// narrative sentence: geocode the place, size and fetch the forecast
/// window, pick the matching day, render the category's sentence.
pub struct WeatherPipeline {
    api: WeatherApi,
}

impl WeatherPipeline {
    pub fn new(api: WeatherApi) -> Self {
        Self { api }
    }

    pub async fn resolve(&self, ctx: &mut TurnContext) -> Result<String, WeatherError> {
        let when = apply_defaults(ctx);
        let period = classify_time(ctx);

        tracing::debug!(
            location = ctx.weather_where.as_deref().unwrap_or_default(),
            what = ctx.weather_what.as_deref().unwrap_or_default(),
            %when,
            time_of_day = ctx.weather_time.as_deref().unwrap_or("none"),
            "resolving weather request"
        );

        let query = ctx.weather_where.clone().unwrap_or_default();
        let geo = self.api.search_location(&query).await?;

        let offset = (when.date_naive() - Utc::now().date_naive()).num_days() + 1;
        let days = forecast_window(offset);
        let forecasts = self
            .api
            .daily_forecast(geo.latitude, geo.longitude, days)
            .await?;
        let entry = select_day(&forecasts, when);

        let what = ctx.weather_what.clone().unwrap_or_default();
        let category = ForecastCategory::parse(&what)?;
        Ok(narrative::render(
            category,
            when,
            period,
            &geo.display_name(),
            entry,
        ))
    }
}
