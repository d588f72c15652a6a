//! Script-facing engine for one tile.
//!
//! [`PixelEngine`] bundles the tile being computed, the host services and a
//! worker pool. Its operations follow the scripting contract: failures are
//! logged and come back as `None`, never as a panic or an error value, so a
//! bad operation costs the script its output for this tile and nothing more.
//! A panic raised by a user callback is caught at the same boundary.

pub mod host;
pub mod options;
pub mod temporal;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::ThreadPool;
use tracing::{debug, info, warn};

pub use host::{DatetimeQuery, HostServices, RepeatType};
pub use options::EngineOptions;
pub use temporal::{DatasetCollection, DateTimeCollection};

use crate::algebra::ValidRange;
use crate::buffer::{ElementType, TileBuffer};
use crate::composite::{composite, CompositeMethod, CompositeParams};
use crate::error::EngineError;
use crate::eval::PixelFunction;
use crate::geometry::Geometry;
use crate::mask::merge_by_geometry;
use crate::tile::Tile;

pub struct PixelEngine<'h> {
    tile: Tile,
    host: &'h dyn HostServices,
    options: EngineOptions,
    pool: ThreadPool,
}

impl<'h> PixelEngine<'h> {
    pub fn new(
        tile: Tile,
        host: &'h dyn HostServices,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let pool = options.build_pool()?;
        Ok(Self {
            tile,
            host,
            options,
            pool,
        })
    }

    pub fn tile(&self) -> &Tile {
        &self.tile
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run `op` on the engine's pool, turning an error or a panic into a
    /// logged `None`.
    fn guard<T, E>(&self, name: &'static str, op: impl FnOnce() -> Result<T, E> + Send) -> Option<T>
    where
        T: Send,
        E: Into<EngineError> + Send,
    {
        let outcome = self
            .pool
            .install(|| panic::catch_unwind(AssertUnwindSafe(op)));
        let e: EngineError = match outcome {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(e)) => e.into(),
            Err(payload) => EngineError::Panic(panic_message(payload.as_ref())),
        };
        warn!(op = name, tile = ?self.tile, error = %e, "Operation failed");
        None
    }

    /// Invoke the script entry point for this tile.
    ///
    /// A panic inside `entry` is caught and logged; the tile then has no
    /// output, same as an entry returning `None`.
    pub fn run<F>(&self, entry: F) -> Option<TileBuffer>
    where
        F: FnOnce(&Self) -> Option<TileBuffer> + Send,
    {
        let outcome = self
            .pool
            .install(|| panic::catch_unwind(AssertUnwindSafe(|| entry(self))));
        match outcome {
            Ok(output) => output,
            Err(payload) => {
                let e = EngineError::Panic(panic_message(payload.as_ref()));
                warn!(tile = ?self.tile, error = %e, "Entry function aborted");
                None
            }
        }
    }

    /// Print `text` to the host log.
    pub fn log(&self, text: &str) {
        info!(target: "script", tile = ?self.tile, "{text}");
        self.host.log(text);
    }

    pub fn new_dataset(
        &self,
        element_type: ElementType,
        width: usize,
        height: usize,
        band_count: usize,
        initial_value: Option<f64>,
    ) -> Option<TileBuffer> {
        self.guard("new_dataset", || {
            TileBuffer::create(element_type, width, height, band_count, initial_value)
        })
    }

    /// This tile of dataset `name` at `datetime`.
    pub fn dataset(
        &self,
        name: &str,
        datetime: u64,
        band_indices: Option<&[usize]>,
    ) -> Option<TileBuffer> {
        debug!(dataset = name, datetime, tile = ?self.tile, "Fetching tile");
        self.guard("dataset", || self.host.fetch_dataset(name, datetime, band_indices))
    }

    /// This tile of dataset `name` at each of `datetimes`; unavailable
    /// datetimes are left out.
    pub fn dataset_collection(
        &self,
        name: &str,
        datetimes: &DateTimeCollection,
        band_indices: Option<&[usize]>,
    ) -> DatasetCollection {
        DatasetCollection::fetch(self.host, name, datetimes, band_indices)
    }

    pub fn new_dataset_collection(
        &self,
        element_type: ElementType,
        band_count: usize,
        count: usize,
        initial_value: Option<f64>,
    ) -> Option<DatasetCollection> {
        self.guard("new_dataset_collection", || {
            DatasetCollection::create(element_type, band_count, count, initial_value)
        })
    }

    /// Concatenate the bands of `buffers` in order. Fails if any input is
    /// missing.
    pub fn stack(&self, buffers: &[Option<&TileBuffer>]) -> Option<TileBuffer> {
        let Some(buffers) = buffers.iter().copied().collect::<Option<Vec<_>>>() else {
            warn!(op = "stack", tile = ?self.tile, "Missing input buffer");
            return None;
        };
        self.guard("stack", || TileBuffer::stack(&buffers))
    }

    /// Composite `buffers` with `method`; see [`composite`].
    pub fn compose(
        &self,
        buffers: &[&TileBuffer],
        method: CompositeMethod,
        valid_min: f64,
        valid_max: f64,
        fill: f64,
        out_type: Option<ElementType>,
    ) -> Option<TileBuffer> {
        let params = CompositeParams {
            method,
            valid: ValidRange::new(valid_min, valid_max),
            fill,
            out_type,
        };
        self.guard("compose", || composite(buffers, &params))
    }

    pub fn compose_collection(
        &self,
        collection: &DatasetCollection,
        params: &CompositeParams,
    ) -> Option<TileBuffer> {
        self.guard("compose_collection", || collection.composite(params))
    }

    pub fn geom_by_wkt(&self, text: &str) -> Option<Geometry> {
        self.guard("geom_by_wkt", || Geometry::from_wkt(text))
    }

    /// Geometry from the WKT the host registered under `id`.
    pub fn geom_by_id(&self, id: &str) -> Option<Geometry> {
        self.guard("geom_by_id", || -> Result<Geometry, EngineError> {
            let text = self.host.wkt_by_id(id)?;
            Ok(Geometry::from_wkt(&text)?)
        })
    }

    /// `geometry` grown by `radius` degrees.
    pub fn geom_buffer(&self, geometry: &Geometry, radius: f64) -> Option<Geometry> {
        self.guard("geom_buffer", || geometry.buffer(radius, self.options.buffer_segments))
    }

    pub fn merge_by_geom(
        &self,
        geometry: &Geometry,
        inside: &TileBuffer,
        outside: &TileBuffer,
    ) -> Option<TileBuffer> {
        self.guard("merge_by_geom", || {
            merge_by_geometry(geometry, &self.tile, inside, outside)
        })
    }

    pub fn clip_by_geometry(
        &self,
        buffer: &TileBuffer,
        geometry: &Geometry,
        fill: f64,
    ) -> Option<TileBuffer> {
        self.guard("clip_by_geometry", || {
            buffer.clip_by_geometry(geometry, &self.tile, fill)
        })
    }

    /// Clip `buffer` to the region of interest `roi_id`.
    pub fn clip3(&self, buffer: &TileBuffer, roi_id: &str, fill: f64) -> Option<TileBuffer> {
        self.guard("clip3", || -> Result<TileBuffer, EngineError> {
            let region = self.host.region_of_interest(roi_id)?;
            buffer.clip_by_geometry(&region, &self.tile, fill)
        })
    }

    #[deprecated(note = "use `clip3`")]
    pub fn clip(&self, buffer: &TileBuffer, roi_id: &str, fill: f64) -> Option<TileBuffer> {
        self.clip3(buffer, roi_id, fill)
    }

    #[deprecated(note = "use `clip3`")]
    pub fn clip2(&self, buffer: &TileBuffer, roi_id: &str, fill: f64) -> Option<TileBuffer> {
        self.clip3(buffer, roi_id, fill)
    }

    pub fn burn(
        &self,
        buffer: &TileBuffer,
        geometry: &Geometry,
        burn_value: f64,
    ) -> Option<TileBuffer> {
        self.guard("burn", || -> Result<TileBuffer, EngineError> {
            Ok(buffer.burn(geometry, &self.tile, burn_value))
        })
    }

    /// Evaluate `f` at every pixel of `buffer`; the output element type comes
    /// from [`EngineOptions::evaluator_output`].
    pub fn for_each_pixel<F>(&self, buffer: &TileBuffer, f: &F) -> Option<TileBuffer>
    where
        F: PixelFunction + ?Sized,
    {
        let out_type = self.options.evaluator_output;
        self.guard("for_each_pixel", || buffer.for_each_pixel(f, out_type))
    }

    /// Midnight of the given day as a `yyyyMMddHHmmss` number.
    pub fn datetime(&self, year: i32, month: u32, day: u32) -> Option<u64> {
        self.guard("datetime", || temporal::datetime(year, month, day))
    }

    pub fn local_datetimes_by_stop_date(
        &self,
        year: i32,
        month: u32,
        day: u32,
        ndays_before: u32,
    ) -> Option<DateTimeCollection> {
        self.guard("local_datetimes_by_stop_date", || {
            DateTimeCollection::by_stop_date(year, month, day, ndays_before)
        })
    }

    pub fn remote_datetimes(&self, query: &DatetimeQuery) -> Option<DateTimeCollection> {
        self.guard("remote_datetimes", || self.host.build_datetimes(query))
    }

    pub fn nearest_datetime_before(&self, name: &str, datetime: u64) -> Option<u64> {
        self.guard("nearest_datetime_before", || {
            self.host.nearest_datetime_before(name, datetime)
        })
    }

    pub fn nearest_datetime_after(&self, name: &str, datetime: u64) -> Option<u64> {
        self.guard("nearest_datetime_after", || {
            self.host.nearest_datetime_after(name, datetime)
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::error::HostError;

    #[derive(Default)]
    struct NullHost {
        lines: Mutex<Vec<String>>,
    }

    impl HostServices for NullHost {
        fn fetch_dataset(
            &self,
            name: &str,
            datetime: u64,
            _: Option<&[usize]>,
        ) -> Result<TileBuffer, HostError> {
            Err(HostError::Dataset {
                name: name.to_string(),
                datetime,
            })
        }

        fn wkt_by_id(&self, id: &str) -> Result<String, HostError> {
            Err(HostError::Geometry(id.to_string()))
        }

        fn region_of_interest(&self, id: &str) -> Result<Geometry, HostError> {
            Err(HostError::Region(id.to_string()))
        }

        fn build_datetimes(&self, query: &DatetimeQuery) -> Result<DateTimeCollection, HostError> {
            Err(HostError::Datetime(query.dataset.clone()))
        }

        fn nearest_datetime_before(&self, _: &str, _: u64) -> Result<u64, HostError> {
            Err(HostError::Datetime("none".into()))
        }

        fn nearest_datetime_after(&self, _: &str, _: u64) -> Result<u64, HostError> {
            Err(HostError::Datetime("none".into()))
        }

        fn log(&self, text: &str) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(text.to_string());
            }
        }
    }

    fn engine(host: &NullHost) -> PixelEngine<'_> {
        let tile = Tile::new(6, 32, 16).unwrap();
        PixelEngine::new(tile, host, EngineOptions::default().with_num_threads(2)).unwrap()
    }

    #[test]
    fn test_failures_are_none() {
        let host = NullHost::default();
        let pe = engine(&host);
        assert!(pe.new_dataset(ElementType::Byte, 128, 256, 1, None).is_none());
        assert!(pe.dataset("GFS/TEMP/5000M", 20240101000000, None).is_none());
        assert!(pe.geom_by_wkt("POINT(1)").is_none());
        assert!(pe.geom_by_id("some/dir/geom.wkt").is_none());
        assert!(pe.datetime(2022, 2, 30).is_none());
    }

    #[test]
    fn test_stack_with_missing_input() {
        let host = NullHost::default();
        let pe = engine(&host);
        let a = pe.new_dataset(ElementType::Byte, 256, 256, 1, Some(1.0)).unwrap();
        let missing = pe.dataset("absent", 1, None);
        assert!(pe.stack(&[Some(&a), missing.as_ref()]).is_none());
        let both = pe.stack(&[Some(&a), Some(&a)]).unwrap();
        assert_eq!(both.band_count(), 2);
    }

    #[test]
    fn test_log_reaches_host() {
        let host = NullHost::default();
        engine(&host).log("Hello world.");
        assert_eq!(*host.lines.lock().unwrap(), vec!["Hello world.".to_string()]);
    }

    #[test]
    fn test_run_catches_panic() {
        let host = NullHost::default();
        let pe = engine(&host);
        assert!(pe.run(|_| panic!("script bug")).is_none());
        let out = pe.run(|pe| pe.new_dataset(ElementType::Int16, 256, 256, 2, Some(-1.0)));
        assert_eq!(out.unwrap().band_count(), 2);
    }

    #[test]
    fn test_dataset_collection_skips_missing() {
        let host = NullHost::default();
        let pe = engine(&host);
        let dts = DateTimeCollection::new(vec![20240101000000, 20240102000000]);
        assert!(pe.dataset_collection("absent", &dts, None).is_empty());
    }

    #[test]
    fn test_for_each_pixel_uses_configured_type() {
        let host = NullHost::default();
        let tile = Tile::new(6, 32, 16).unwrap();
        let opts = EngineOptions::default().with_evaluator_output(ElementType::UInt16);
        let pe = PixelEngine::new(tile, &host, opts).unwrap();
        let src = pe.new_dataset(ElementType::Byte, 256, 256, 1, Some(3.0)).unwrap();
        let out = pe.for_each_pixel(&src, &|b: &[f64], _: usize| b[0] * 1000.0).unwrap();
        assert_eq!(out.element_type(), ElementType::UInt16);
        assert_eq!(out.value(0, 0, 0).unwrap(), 3000.0);
    }

    #[test]
    fn test_panicking_pixel_function_is_none() {
        let host = NullHost::default();
        let pe = engine(&host);
        let src = pe.new_dataset(ElementType::Byte, 256, 256, 1, Some(1.0)).unwrap();
        // Band 1 does not exist on a one-band tile
        let out = pe.for_each_pixel(&src, &|b: &[f64], _: usize| b[1]);
        assert!(out.is_none());
        let out = pe.for_each_pixel(&src, &|b: &[f64], _: usize| b[0]);
        assert!(out.is_some());
    }
}
