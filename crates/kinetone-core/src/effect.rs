//! Core Effect trait and related types.
//!
//! The [`Effect`] trait is the boundary every processing unit in the workspace exposes:
//! single-sample processing, block processing, multichannel frames, sample-rate changes
//! and reset.
//!
//! ## Design Decisions
//!
//! - **Mono first**: `process` is one `f64` in, one `f64` out. Units with genuinely
//!   stereo behaviour (ping-pong delay) override [`Effect::process_frame`].
//!
//! - **Object-safe**: `Box<dyn Effect + Send>` is what presets and the offline engine
//!   build chains from. Generic composition via [`EffectExt::chain`] is available for
//!   static chains.
//!
//! - **No allocations**: every method is callable from a realtime context.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

/// Core trait for all audio effects.
///
/// # Example
///
/// ```rust
/// use kinetone_core::Effect;
///
/// struct Gain {
///     gain: f64,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f64) -> f64 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f64) {}
///
///     fn reset(&mut self) {}
/// }
///
/// let mut gain = Gain { gain: 0.5 };
/// assert_eq!(gain.process(1.0), 0.5);
/// ```
pub trait Effect {
    /// Process a single sample.
    fn process(&mut self, input: f64) -> f64;

    /// Process a block of samples.
    ///
    /// Default implementation calls `process()` for each sample.
    ///
    /// # Panics
    /// Debug builds assert `input.len() == output.len()`.
    fn process_block(&mut self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in place.
    fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Process one multichannel frame.
    ///
    /// Returns `false` when the frame cannot be handled (no input channels, or no output
    /// channels). The default runs channel 0 through [`Effect::process`] and writes the
    /// result to every output channel.
    fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        let Some(&first) = input.first() else {
            return false;
        };
        if output.is_empty() {
            return false;
        }
        let y = self.process(first);
        output.fill(y);
        true
    }

    /// Update the sample rate, recomputing rate-dependent coefficients and buffers.
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Clear internal state (delay lines, filter history) without changing parameters.
    fn reset(&mut self);

    /// Processing latency in samples. Default is 0.
    fn latency_samples(&self) -> usize {
        0
    }
}

/// Extension trait for chaining effects with static dispatch.
pub trait EffectExt: Effect + Sized {
    /// Chain this effect with another; the output of `self` feeds `next`.
    fn chain<E: Effect>(self, next: E) -> Chain<Self, E> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: Effect> EffectExt for T {}

/// Two effects in series, created by [`EffectExt::chain`].
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: Effect, B: Effect> Effect for Chain<A, B> {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let mid = self.first.process(input);
        self.second.process(mid)
    }

    fn process_block(&mut self, input: &[f64], output: &mut [f64]) {
        self.first.process_block(input, output);
        self.second.process_block_inplace(output);
    }

    fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        if !self.first.process_frame(input, output) {
            return false;
        }
        // second stage reads the first stage's output; frames are at most stereo here
        let mut mid = [0.0; 2];
        let channels = output.len().min(mid.len());
        mid[..channels].copy_from_slice(&output[..channels]);
        self.second.process_frame(&mid[..channels], output)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.first.set_sample_rate(sample_rate);
        self.second.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }

    fn latency_samples(&self) -> usize {
        self.first.latency_samples() + self.second.latency_samples()
    }
}

impl<A, B> Chain<A, B> {
    /// The first effect in the chain.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Mutable access to the first effect.
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// The second effect in the chain.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Mutable access to the second effect.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}

/// Boxed effects forward to the effect inside, so a registry-built
/// `Box<dyn EffectWithParams + Send>` can go wherever an [`Effect`] is expected.
impl<E: Effect + ?Sized> Effect for Box<E> {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        (**self).process(input)
    }

    fn process_block(&mut self, input: &[f64], output: &mut [f64]) {
        (**self).process_block(input, output);
    }

    fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        (**self).process_block_inplace(buffer);
    }

    fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        (**self).process_frame(input, output)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        (**self).set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn latency_samples(&self) -> usize {
        (**self).latency_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f64);

    impl Effect for Gain {
        fn process(&mut self, input: f64) -> f64 {
            input * self.0
        }
        fn set_sample_rate(&mut self, _: f64) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn test_chain() {
        let mut chain = Gain(2.0).chain(Gain(3.0));
        assert_eq!(chain.process(1.0), 6.0);
    }

    #[test]
    fn test_chain_block() {
        let mut chain = Gain(2.0).chain(Gain(0.5));
        let input = [1.0, 2.0, 3.0];
        let mut output = [0.0; 3];
        chain.process_block(&input, &mut output);
        assert_eq!(output, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_chain_latency() {
        struct LatentEffect(usize);
        impl Effect for LatentEffect {
            fn process(&mut self, input: f64) -> f64 {
                input
            }
            fn set_sample_rate(&mut self, _: f64) {}
            fn reset(&mut self) {}
            fn latency_samples(&self) -> usize {
                self.0
            }
        }

        let chain = LatentEffect(10).chain(LatentEffect(5));
        assert_eq!(chain.latency_samples(), 15);
    }

    #[test]
    fn test_process_frame_fans_out() {
        let mut gain = Gain(0.5);
        let mut out = [0.0; 2];
        assert!(gain.process_frame(&[1.0, 9.0], &mut out));
        assert_eq!(out, [0.5, 0.5]);
    }

    #[test]
    fn test_process_frame_rejects_empty() {
        let mut gain = Gain(1.0);
        let mut out = [0.0; 2];
        assert!(!gain.process_frame(&[], &mut out));
        assert!(!gain.process_frame(&[1.0], &mut []));
    }

    #[test]
    fn test_chain_frame() {
        let mut chain = Gain(2.0).chain(Gain(3.0));
        let mut out = [0.0; 2];
        assert!(chain.process_frame(&[1.0, 1.0], &mut out));
        assert_eq!(out, [6.0, 6.0]);
    }

    #[test]
    fn test_boxed_effect_forwards() {
        let mut boxed: Box<dyn Effect + Send> = Box::new(Gain(2.0).chain(Gain(2.0)));
        assert_eq!(boxed.process(1.0), 4.0);

        // a box of a box is still an effect
        let mut nested: Box<dyn Effect + Send> = Box::new(boxed);
        let mut out = [0.0; 2];
        assert!(nested.process_frame(&[1.0], &mut out));
        assert_eq!(out, [4.0, 4.0]);
    }
}
