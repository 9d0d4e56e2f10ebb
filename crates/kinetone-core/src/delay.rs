//! Power-of-two circular delay buffer.
//!
//! [`CircularBuffer`] is the storage under every delay-based unit in the workspace:
//! audio delay, modulated delay, comb and all-pass filters, and the phase vocoder's
//! input and output rings.
//!
//! # Addressing
//!
//! The length is rounded up to a power of two so wrapping is a single mask. Reads are
//! made *before* the write for the current sample, so `read(0)` returns the most
//! recently written value and `read(d)` the value written `d` samples before that:
//!
//! ```text
//! index = (write_index - 1 - delay) & wrap_mask
//! ```
//!
//! | Effect | Delay Range |
//! |--------|-------------|
//! | Flanger | 0.1-7.1 ms |
//! | Vibrato | 0-7 ms |
//! | Chorus | 10-40 ms |
//! | Echo / ping-pong | up to the buffer length |

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::error::DspError;
use crate::math::{linear_interpolate, next_power_of_two, split_fraction};

/// Sample types a [`CircularBuffer`] can hold.
pub trait DelaySample: Copy + Default {
    /// Linear interpolation from `y1` (fraction 0) toward `y2` (fraction 1).
    fn lerp(y1: Self, y2: Self, fraction: f64) -> Self;
}

impl DelaySample for f64 {
    #[inline]
    fn lerp(y1: Self, y2: Self, fraction: f64) -> Self {
        linear_interpolate(y1, y2, fraction)
    }
}

impl DelaySample for f32 {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn lerp(y1: Self, y2: Self, fraction: f64) -> Self {
        linear_interpolate(f64::from(y1), f64::from(y2), fraction) as f32
    }
}

/// Circular buffer with integer and fractional reads.
///
/// The buffer is allocated in [`new`](Self::new), [`create`](Self::create) and
/// [`resize`](Self::resize) only; reads and writes never allocate.
///
/// # Example
///
/// ```rust
/// use kinetone_core::CircularBuffer;
///
/// let mut buffer = CircularBuffer::<f64>::new(100).unwrap();
/// assert_eq!(buffer.len(), 128);
///
/// buffer.write(1.0);
/// buffer.write(2.0);
/// assert_eq!(buffer.read(0), 2.0);
/// assert_eq!(buffer.read(1), 1.0);
/// assert_eq!(buffer.read_fractional(0.5), 1.5);
/// ```
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    buffer: Vec<T>,
    write_index: usize,
    wrap_mask: usize,
    interpolate: bool,
}

impl<T: DelaySample> CircularBuffer<T> {
    /// Allocate a zeroed buffer of at least `length` samples.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] when `length` is zero.
    pub fn new(length: usize) -> Result<Self, DspError> {
        let mut buffer = Self {
            buffer: Vec::new(),
            write_index: 0,
            wrap_mask: 0,
            interpolate: true,
        };
        buffer.create(length)?;
        Ok(buffer)
    }

    /// Reallocate to at least `length` samples and zero the contents.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] when `length` is zero; the buffer is unchanged.
    pub fn create(&mut self, length: usize) -> Result<(), DspError> {
        if length == 0 {
            return Err(DspError::InvalidLength {
                what: "delay buffer",
                length,
            });
        }
        self.resize(length);
        Ok(())
    }

    /// Reallocate to at least `max(length, 1)` samples and zero the contents.
    pub fn resize(&mut self, length: usize) {
        let rounded = next_power_of_two(length.max(1));

        #[cfg(feature = "tracing")]
        tracing::debug!(requested = length, allocated = rounded, "delay buffer created");

        self.buffer = vec![T::default(); rounded];
        self.wrap_mask = rounded - 1;
        self.write_index = 0;
    }

    /// Zero the contents without reallocating.
    pub fn flush(&mut self) {
        self.buffer.fill(T::default());
        self.write_index = 0;
    }

    /// Allocated length (a power of two).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false once constructed; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Enable or disable interpolation in [`read_fractional`](Self::read_fractional).
    pub fn set_interpolate(&mut self, interpolate: bool) {
        self.interpolate = interpolate;
    }

    /// Whether fractional reads interpolate.
    pub fn interpolate(&self) -> bool {
        self.interpolate
    }

    /// Write one sample and advance.
    #[inline]
    pub fn write(&mut self, value: T) {
        self.buffer[self.write_index] = value;
        self.write_index = (self.write_index + 1) & self.wrap_mask;
    }

    /// Read the sample written `delay` samples before the most recent write.
    #[inline]
    pub fn read(&self, delay: usize) -> T {
        let index = self.write_index.wrapping_sub(1).wrapping_sub(delay) & self.wrap_mask;
        self.buffer[index]
    }

    /// Read at a fractional delay.
    ///
    /// Interpolates between `read(floor(delay))` and `read(floor(delay) + 1)`. With
    /// interpolation disabled, returns `read(floor(delay))`. Negative delays read 0.
    #[inline]
    pub fn read_fractional(&self, delay: f64) -> T {
        let (whole, fraction) = split_fraction(delay.max(0.0));
        let y1 = self.read(whole);
        if !self.interpolate {
            return y1;
        }
        let y2 = self.read(whole + 1);
        T::lerp(y1, y2, fraction)
    }

    /// Raw access to the sample at an absolute index (masked).
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.buffer[index & self.wrap_mask]
    }

    /// Mutable access to the sample at an absolute index (masked).
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.buffer[index & self.wrap_mask]
    }

    /// Mask that wraps absolute indices.
    pub fn wrap_mask(&self) -> usize {
        self.wrap_mask
    }
}

impl<T: DelaySample> Default for CircularBuffer<T> {
    /// A single zeroed sample; call [`create`](Self::create) before use as a delay.
    fn default() -> Self {
        Self {
            buffer: vec![T::default(); 1],
            write_index: 0,
            wrap_mask: 0,
            interpolate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_rounded_to_power_of_two() {
        assert_eq!(CircularBuffer::<f64>::new(1).unwrap().len(), 1);
        assert_eq!(CircularBuffer::<f64>::new(3).unwrap().len(), 4);
        assert_eq!(CircularBuffer::<f64>::new(2401).unwrap().len(), 4096);
        assert_eq!(CircularBuffer::<f64>::new(4096).unwrap().len(), 4096);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            CircularBuffer::<f64>::new(0),
            Err(DspError::InvalidLength { length: 0, .. })
        ));
    }

    #[test]
    fn test_read_zero_is_last_write() {
        let mut buffer = CircularBuffer::<f64>::new(8).unwrap();
        for i in 0..20 {
            let x = f64::from(i);
            buffer.write(x);
            assert_eq!(buffer.read(0), x);
        }
    }

    #[test]
    fn test_impulse_at_exact_delay() {
        let mut buffer = CircularBuffer::<f64>::new(64).unwrap();
        buffer.write(1.0);
        for _ in 0..10 {
            buffer.write(0.0);
        }
        for d in 0..64 {
            let expected = if d == 10 { 1.0 } else { 0.0 };
            assert_eq!(buffer.read(d), expected, "delay {d}");
        }
    }

    #[test]
    fn test_fractional_read() {
        let mut buffer = CircularBuffer::<f64>::new(16).unwrap();
        buffer.write(4.0);
        buffer.write(2.0);
        assert_eq!(buffer.read_fractional(0.0), 2.0);
        assert_eq!(buffer.read_fractional(0.25), 2.5);
        assert_eq!(buffer.read_fractional(1.0), 4.0);

        buffer.set_interpolate(false);
        assert_eq!(buffer.read_fractional(0.75), 2.0);
    }

    #[test]
    fn test_f32_samples() {
        let mut buffer = CircularBuffer::<f32>::new(4).unwrap();
        buffer.write(1.0);
        buffer.write(3.0);
        assert_eq!(buffer.read_fractional(0.5), 2.0);
    }

    #[test]
    fn test_flush_and_create() {
        let mut buffer = CircularBuffer::<f64>::new(8).unwrap();
        buffer.write(1.0);
        buffer.flush();
        assert_eq!(buffer.len(), 8);
        assert!((0..8).all(|d| buffer.read(d) == 0.0));

        buffer.create(100).unwrap();
        assert_eq!(buffer.len(), 128);
        assert!(buffer.create(0).is_err());
        assert_eq!(buffer.len(), 128);
    }

    #[test]
    fn test_resize_never_empty() {
        let mut buffer = CircularBuffer::<f64>::default();
        assert_eq!(buffer.len(), 1);
        buffer.resize(0);
        assert_eq!(buffer.len(), 1);
        buffer.resize(2401);
        assert_eq!(buffer.len(), 4096);
    }

    #[test]
    fn test_wraps() {
        let mut buffer = CircularBuffer::<f64>::new(4).unwrap();
        for i in 0..10 {
            buffer.write(f64::from(i));
        }
        assert_eq!(buffer.read(0), 9.0);
        assert_eq!(buffer.read(3), 6.0);
        // delay equal to the length wraps back to the newest sample
        assert_eq!(buffer.read(4), 9.0);
    }
}
