/// Configuration for in-memory writers.
///
/// # Examples
///
/// ```rust
/// use dualconv::{BinaryWriter, WriterOptions};
///
/// let writer = BinaryWriter::with_options(WriterOptions {
///     initial_capacity: 64,
/// });
/// assert_eq!(writer.count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriterOptions {
    /// Bytes allocated for a fresh buffer.
    ///
    /// The buffer grows by half of its capacity whenever a write does not
    /// fit. Recycling a writer whose buffer outgrew 100 times this size
    /// replaces the buffer with a fresh one of this size.
    ///
    /// # Default
    ///
    /// `1024`
    pub initial_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
        }
    }
}

/// Configuration for readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderOptions {
    /// Deepest nesting a structural skip descends into before failing.
    ///
    /// Skipping unknown values recurses once per nested object or array;
    /// the bound keeps hostile input from exhausting the stack.
    ///
    /// # Default
    ///
    /// `512`
    pub max_depth: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}

/// Configuration for [`Pool`](crate::Pool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolOptions {
    /// Most idle instances kept; releases beyond this drop the instance.
    ///
    /// # Default
    ///
    /// `32`
    pub max_idle: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self { max_idle: 32 }
    }
}

/// Everything a [`BinaryConvert`](crate::BinaryConvert) or
/// [`JsonConvert`](crate::JsonConvert) needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConvertOptions {
    pub writer: WriterOptions,
    pub reader: ReaderOptions,
    pub pool: PoolOptions,
}
