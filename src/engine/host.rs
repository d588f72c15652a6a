//! Services supplied by the process hosting the engine.
//!
//! Dataset retrieval, geometry lookup and the datetime catalogue live outside
//! this crate. The host implements [`HostServices`] with whatever caching,
//! timeout and retry policy it needs; every call is synchronous from the
//! engine's point of view.

use crate::buffer::TileBuffer;
use crate::error::HostError;
use crate::geometry::Geometry;

use super::temporal::DateTimeCollection;

/// Period on which a datetime window repeats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepeatType {
    #[default]
    None,
    Monthly,
    Yearly,
}

impl RepeatType {
    /// Parse the script code: `""`, `"m"` or `"y"`.
    pub fn from_code(code: &str) -> Result<Self, HostError> {
        match code {
            "" => Ok(Self::None),
            "m" => Ok(Self::Monthly),
            "y" => Ok(Self::Yearly),
            other => Err(HostError::Datetime(format!("unknown repeat type {other:?}"))),
        }
    }
}

/// Query for the datetimes at which a dataset is available.
///
/// The whole window bounds the search; with a repeat type, only datetimes
/// falling in the repeated sub-window (e.g. every June to August) are kept.
/// `repeat_stop_next_year` is how many years the sub-window spills over.
#[derive(Clone, Debug, PartialEq)]
pub struct DatetimeQuery {
    pub dataset: String,
    pub whole_start: u64,
    pub whole_start_inclusive: bool,
    pub whole_stop: u64,
    pub whole_stop_inclusive: bool,
    pub repeat: RepeatType,
    pub repeat_start: u64,
    pub repeat_start_inclusive: bool,
    pub repeat_stop: u64,
    pub repeat_stop_inclusive: bool,
    pub repeat_stop_next_year: u32,
}

impl DatetimeQuery {
    /// Datetimes in `[start, stop)` without a repeating sub-window.
    pub fn new(dataset: impl Into<String>, start: u64, stop: u64) -> Self {
        Self {
            dataset: dataset.into(),
            whole_start: start,
            whole_start_inclusive: true,
            whole_stop: stop,
            whole_stop_inclusive: false,
            repeat: RepeatType::None,
            repeat_start: 0,
            repeat_start_inclusive: false,
            repeat_stop: 0,
            repeat_stop_inclusive: false,
            repeat_stop_next_year: 0,
        }
    }

    pub fn with_stop_inclusive(mut self, inclusive: bool) -> Self {
        self.whole_stop_inclusive = inclusive;
        self
    }

    /// Restrict to `[start, stop]` repeated every `repeat`.
    pub fn with_repeat(
        mut self,
        repeat: RepeatType,
        start: u64,
        stop: u64,
        next_year: u32,
    ) -> Self {
        self.repeat = repeat;
        self.repeat_start = start;
        self.repeat_start_inclusive = true;
        self.repeat_stop = stop;
        self.repeat_stop_inclusive = true;
        self.repeat_stop_next_year = next_year;
        self
    }

    /// Whether `datetime` lies inside the whole window.
    pub fn in_window(&self, datetime: u64) -> bool {
        let after_start = if self.whole_start_inclusive {
            datetime >= self.whole_start
        } else {
            datetime > self.whole_start
        };
        let before_stop = if self.whole_stop_inclusive {
            datetime <= self.whole_stop
        } else {
            datetime < self.whole_stop
        };
        after_start && before_stop
    }
}

/// Calls the engine makes into its host.
pub trait HostServices: Sync {
    /// Tile of `name` at `datetime`, restricted to `band_indices` when given.
    fn fetch_dataset(
        &self,
        name: &str,
        datetime: u64,
        band_indices: Option<&[usize]>,
    ) -> Result<TileBuffer, HostError>;

    /// WKT text registered under `id`.
    fn wkt_by_id(&self, id: &str) -> Result<String, HostError>;

    fn region_of_interest(&self, id: &str) -> Result<Geometry, HostError>;

    fn build_datetimes(&self, query: &DatetimeQuery) -> Result<DateTimeCollection, HostError>;

    fn nearest_datetime_before(&self, name: &str, datetime: u64) -> Result<u64, HostError>;

    fn nearest_datetime_after(&self, name: &str, datetime: u64) -> Result<u64, HostError>;

    /// Forward a script log line to the host.
    fn log(&self, text: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_codes() {
        assert_eq!(RepeatType::from_code(""), Ok(RepeatType::None));
        assert_eq!(RepeatType::from_code("m"), Ok(RepeatType::Monthly));
        assert_eq!(RepeatType::from_code("y"), Ok(RepeatType::Yearly));
        assert!(RepeatType::from_code("w").is_err());
    }

    #[test]
    fn test_window_bounds() {
        let q = DatetimeQuery::new("FY3D/MERSI/L2/NVI/MON", 20200101000000, 20231231000000);
        assert!(q.in_window(20200101000000));
        assert!(!q.in_window(20231231000000));
        assert!(q.with_stop_inclusive(true).in_window(20231231000000));
    }
}
