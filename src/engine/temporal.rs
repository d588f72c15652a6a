//! Datetime and dataset collections.
//!
//! Datetimes are 14-digit `yyyyMMddHHmmss` numbers, e.g. `20240101000000`.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

use super::host::HostServices;
use crate::buffer::{ElementType, TileBuffer};
use crate::composite::{composite, CompositeParams};
use crate::error::TileError;
use crate::tile::TILE_SIZE;

/// `yyyyMMddHHmmss` number of a calendar datetime.
pub fn encode_datetime(dt: &NaiveDateTime) -> u64 {
    let year = u64::from(dt.year().unsigned_abs());
    let date = year * 10_000 + u64::from(dt.month()) * 100 + u64::from(dt.day());
    let time = u64::from(dt.hour()) * 10_000 + u64::from(dt.minute()) * 100;
    date * 1_000_000 + time + u64::from(dt.second())
}

/// Parse a `yyyyMMddHHmmss` number back into a calendar datetime.
pub fn decode_datetime(value: u64) -> Result<NaiveDateTime, TileError> {
    NaiveDateTime::parse_from_str(&format!("{value:014}"), "%Y%m%d%H%M%S")
        .map_err(|e| TileError::InvalidArgument(format!("datetime {value}: {e}")))
}

fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, TileError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        TileError::InvalidArgument(format!("invalid date {year:04}-{month:02}-{day:02}"))
    })
}

/// Midnight of the given day as a `yyyyMMddHHmmss` number.
pub fn datetime(year: i32, month: u32, day: u32) -> Result<u64, TileError> {
    let midnight = calendar_date(year, month, day)?.and_time(NaiveTime::MIN);
    Ok(encode_datetime(&midnight))
}

/// Ordered list of datetimes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateTimeCollection {
    datetimes: Vec<u64>,
}

impl DateTimeCollection {
    pub fn new(datetimes: Vec<u64>) -> Self {
        Self { datetimes }
    }

    /// Daily datetimes from `ndays_before` days before the stop date up to
    /// and including the stop date itself.
    ///
    /// 2021-03-31 with 5 days gives 03-26 through 03-31, six entries.
    pub fn by_stop_date(
        year: i32,
        month: u32,
        day: u32,
        ndays_before: u32,
    ) -> Result<Self, TileError> {
        let stop = calendar_date(year, month, day)?;
        let datetimes = (0..=u64::from(ndays_before))
            .rev()
            .map(|back| {
                stop.checked_sub_days(Days::new(back))
                    .map(|d| encode_datetime(&d.and_time(NaiveTime::MIN)))
                    .ok_or_else(|| TileError::InvalidArgument(format!("{back} days before {stop}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { datetimes })
    }

    pub fn datetimes(&self) -> &[u64] {
        &self.datetimes
    }

    pub fn len(&self) -> usize {
        self.datetimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datetimes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.datetimes.iter().copied()
    }
}

impl From<Vec<u64>> for DateTimeCollection {
    fn from(datetimes: Vec<u64>) -> Self {
        Self::new(datetimes)
    }
}

/// One tile of a [`DatasetCollection`].
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    /// Acquisition datetime; `None` for buffers created locally.
    pub datetime: Option<u64>,
    pub buffer: TileBuffer,
}

/// Tiles of one dataset across several datetimes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetCollection {
    members: Vec<Member>,
}

impl DatasetCollection {
    /// Fetch `name` at every datetime of `datetimes`. Datetimes the host
    /// cannot resolve are skipped.
    pub fn fetch(
        host: &dyn HostServices,
        name: &str,
        datetimes: &DateTimeCollection,
        band_indices: Option<&[usize]>,
    ) -> Self {
        let members = datetimes
            .iter()
            .filter_map(|dt| match host.fetch_dataset(name, dt, band_indices) {
                Ok(buffer) => Some(Member {
                    datetime: Some(dt),
                    buffer,
                }),
                Err(e) => {
                    debug!(dataset = name, datetime = dt, error = %e, "Skipping missing tile");
                    None
                }
            })
            .collect();
        Self { members }
    }

    /// `count` fresh buffers of the given type and band count.
    pub fn create(
        element_type: ElementType,
        band_count: usize,
        count: usize,
        initial_value: Option<f64>,
    ) -> Result<Self, TileError> {
        let template =
            TileBuffer::create(element_type, TILE_SIZE, TILE_SIZE, band_count, initial_value)?;
        let members = (0..count)
            .map(|_| Member {
                datetime: None,
                buffer: template.clone(),
            })
            .collect();
        Ok(Self { members })
    }

    pub fn push(&mut self, datetime: Option<u64>, buffer: TileBuffer) {
        self.members.push(Member { datetime, buffer });
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn get(&self, index: usize) -> Option<&TileBuffer> {
        self.members.get(index).map(|m| &m.buffer)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TileBuffer> {
        self.members.get_mut(index).map(|m| &mut m.buffer)
    }

    /// Apply `mask` to every member in place. Members all share the tile
    /// size, so a mask rejected by the first member leaves the collection
    /// untouched.
    pub fn mask(&mut self, mask: &TileBuffer, fill: f64) -> Result<(), TileError> {
        for member in &mut self.members {
            member.buffer.apply_mask(mask, fill)?;
        }
        Ok(())
    }

    /// Composite all members into one tile.
    pub fn composite(&self, params: &CompositeParams) -> Result<TileBuffer, TileError> {
        let inputs: Vec<&TileBuffer> = self.members.iter().map(|m| &m.buffer).collect();
        composite(&inputs, params)
    }
}
