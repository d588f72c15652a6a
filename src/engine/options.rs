//! Engine configuration.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::buffer::ElementType;
use crate::error::EngineError;
use crate::geometry::buffer::MIN_SEGMENTS;

/// Vertices of a full circle when buffering geometries.
pub const DEFAULT_BUFFER_SEGMENTS: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    /// Worker threads; `None` lets rayon decide.
    pub num_threads: Option<usize>,
    pub buffer_segments: usize,
    /// Element type produced by `for_each_pixel`.
    pub evaluator_output: ElementType,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            buffer_segments: DEFAULT_BUFFER_SEGMENTS,
            evaluator_output: ElementType::Float64,
        }
    }
}

impl EngineOptions {
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_buffer_segments(mut self, segments: usize) -> Self {
        self.buffer_segments = segments.max(MIN_SEGMENTS);
        self
    }

    pub fn with_evaluator_output(mut self, element_type: ElementType) -> Self {
        self.evaluator_output = element_type;
        self
    }

    /// Build the worker pool described by these options.
    pub fn build_pool(&self) -> Result<ThreadPool, EngineError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("tilecalc-{i}"));
        if let Some(n) = self.num_threads {
            builder = builder.num_threads(n);
        }
        builder
            .build()
            .map_err(|e| EngineError::ThreadPool(e.to_string()))
    }
}
