//! Offline effect chain processing.

use kinetone_core::Effect;

use crate::AudioBuffer;

/// Frames per block when rendering.
const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Most channels carried per frame.
const MAX_CHANNELS: usize = 2;

/// How [`ProcessingEngine::render`] walks a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Frames handed to the chain at a time. Zero is treated as one.
    pub block_size: usize,
    /// Flush the chain's latency with silence and drop that many leading frames, so the
    /// output lines up with the input and keeps its length.
    pub compensate_latency: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            compensate_latency: false,
        }
    }
}

/// Processing engine that runs an effect chain.
///
/// Effects are `Send` so an engine can be moved to a worker thread.
pub struct ProcessingEngine {
    effects: Vec<Box<dyn Effect + Send>>,
    sample_rate: f64,
}

impl ProcessingEngine {
    /// Create an empty engine.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            effects: Vec::new(),
            sample_rate,
        }
    }

    /// Get the sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Set the sample rate for all effects.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        for effect in &mut self.effects {
            effect.set_sample_rate(sample_rate);
        }
    }

    /// Append an effect. It is switched to the engine's sample rate.
    pub fn add_effect(&mut self, mut effect: Box<dyn Effect + Send>) {
        effect.set_sample_rate(self.sample_rate);
        self.effects.push(effect);
    }

    /// Clear all effects from the chain.
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Get the number of effects in the chain.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Total latency of the chain in samples.
    pub fn latency_samples(&self) -> usize {
        self.effects.iter().map(|e| e.latency_samples()).sum()
    }

    /// Reset all effects.
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Process a single sample through the chain.
    pub fn process(&mut self, input: f64) -> f64 {
        self.effects
            .iter_mut()
            .fold(input, |sample, effect| effect.process(sample))
    }

    /// Process a block of samples through the chain.
    ///
    /// Output buffer must be at least as large as input.
    pub fn process_block(&mut self, input: &[f64], output: &mut [f64]) {
        debug_assert!(output.len() >= input.len());
        let output = &mut output[..input.len()];

        let Some((first, rest)) = self.effects.split_first_mut() else {
            output.copy_from_slice(input);
            return;
        };

        first.process_block(input, output);
        for effect in rest {
            effect.process_block_inplace(output);
        }
    }

    /// Process a block of samples in-place.
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for effect in &mut self.effects {
            effect.process_block_inplace(buffer);
        }
    }

    /// Process one frame of up to two channels through the chain.
    ///
    /// An effect that reports it cannot handle the frame leaves it unchanged. Channels
    /// beyond the second pass through untouched.
    pub fn process_frame(&mut self, frame: &mut [f64]) {
        let channels = frame.len().min(MAX_CHANNELS);
        if channels == 0 {
            return;
        }
        let mut current = [0.0; MAX_CHANNELS];
        let mut next = [0.0; MAX_CHANNELS];
        current[..channels].copy_from_slice(&frame[..channels]);

        for effect in &mut self.effects {
            if effect.process_frame(&current[..channels], &mut next[..channels]) {
                current[..channels].copy_from_slice(&next[..channels]);
            }
        }
        frame[..channels].copy_from_slice(&current[..channels]);
    }

    /// Process an entire mono signal in blocks of `block_size`.
    pub fn process_file(&mut self, input: &[f64], block_size: usize) -> Vec<f64> {
        let block_size = block_size.max(1);
        let mut output = vec![0.0; input.len()];
        for (in_chunk, out_chunk) in input.chunks(block_size).zip(output.chunks_mut(block_size)) {
            self.process_block(in_chunk, out_chunk);
        }
        output
    }

    /// Render a whole buffer through the chain.
    ///
    /// Mono buffers go through the block path. Stereo buffers go frame by frame so
    /// effects can mix across channels; channels past the second come out silent.
    /// `progress` receives the number of input frames completed after each block.
    pub fn render<F>(
        &mut self,
        input: &AudioBuffer,
        options: &RenderOptions,
        mut progress: F,
    ) -> AudioBuffer
    where
        F: FnMut(usize),
    {
        let block_size = options.block_size.max(1);
        let latency = if options.compensate_latency {
            self.latency_samples()
        } else {
            0
        };
        let num_frames = input.num_frames();
        let num_channels = input.num_channels();

        tracing::debug!(num_frames, num_channels, block_size, latency, "rendering");

        let mut output = AudioBuffer::silence(num_channels, num_frames + latency);
        if num_channels == 1 {
            self.render_mono(input, &mut output, block_size, &mut progress);
        } else {
            self.render_frames(input, &mut output, block_size, &mut progress);
        }

        output.drop_leading(latency);
        output
    }

    fn render_mono<F: FnMut(usize)>(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        block_size: usize,
        progress: &mut F,
    ) {
        let (Some(input), Some(output)) = (input.channel(0), output.channel_mut(0)) else {
            return;
        };
        let num_frames = input.len();

        let (out_main, out_tail) = output.split_at_mut(num_frames);
        let mut done = 0;
        for (in_chunk, out_chunk) in input.chunks(block_size).zip(out_main.chunks_mut(block_size)) {
            self.process_block(in_chunk, out_chunk);
            done += in_chunk.len();
            progress(done);
        }
        // tail is silence in, latency-delayed signal out
        self.process_block_inplace(out_tail);
    }

    fn render_frames<F: FnMut(usize)>(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        block_size: usize,
        progress: &mut F,
    ) {
        let num_frames = input.num_frames();
        let mut frame = [0.0; MAX_CHANNELS];
        let channels = input.num_channels().min(MAX_CHANNELS);

        for index in 0..output.num_frames() {
            if index < num_frames {
                input.read_frame(index, &mut frame[..channels]);
            } else {
                frame = [0.0; MAX_CHANNELS];
            }
            self.process_frame(&mut frame[..channels]);
            output.write_frame(index, &frame[..channels]);

            let done = index + 1;
            if done <= num_frames && (done % block_size == 0 || done == num_frames) {
                progress(done);
            }
        }
    }
}

impl Default for ProcessingEngine {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
