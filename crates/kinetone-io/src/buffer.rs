//! Planar multichannel sample buffers.

/// Planar audio: one `Vec<f64>` per channel, all the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f64>>,
}

impl AudioBuffer {
    /// Single-channel buffer.
    pub fn mono(samples: Vec<f64>) -> Self {
        Self {
            channels: vec![samples],
        }
    }

    /// Two-channel buffer. The longer channel is truncated to the shorter one.
    pub fn stereo(mut left: Vec<f64>, mut right: Vec<f64>) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self {
            channels: vec![left, right],
        }
    }

    /// Silent buffer of `num_channels` × `num_frames`.
    pub fn silence(num_channels: usize, num_frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_frames]; num_channels],
        }
    }

    /// Split interleaved samples into channels. A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f64], num_channels: usize) -> Self {
        if num_channels == 0 {
            return Self::default();
        }
        let num_frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(num_frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self { channels }
    }

    /// Interleave the channels frame by frame.
    pub fn to_interleaved(&self) -> Vec<f64> {
        let num_channels = self.num_channels();
        let mut out = Vec::with_capacity(num_channels * self.num_frames());
        for frame in 0..self.num_frames() {
            out.extend(self.channels.iter().map(|channel| channel[frame]));
        }
        out
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Whether the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    /// Samples of one channel.
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Mutable samples of one channel.
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f64]> {
        self.channels.get_mut(index).map(Vec::as_mut_slice)
    }

    /// Average of all channels.
    pub fn to_mono(&self) -> Vec<f64> {
        let num_channels = self.num_channels();
        if num_channels == 0 {
            return Vec::new();
        }
        let scale = 1.0 / num_channels as f64;
        (0..self.num_frames())
            .map(|frame| self.channels.iter().map(|c| c[frame]).sum::<f64>() * scale)
            .collect()
    }

    /// Copy frame `index` into `out`, one sample per channel.
    pub(crate) fn read_frame(&self, index: usize, out: &mut [f64]) {
        for (slot, channel) in out.iter_mut().zip(&self.channels) {
            *slot = channel[index];
        }
    }

    /// Store `frame` at `index`, one sample per channel.
    pub(crate) fn write_frame(&mut self, index: usize, frame: &[f64]) {
        for (channel, &sample) in self.channels.iter_mut().zip(frame) {
            channel[index] = sample;
        }
    }

    /// Drop the first `count` frames of every channel.
    pub(crate) fn drop_leading(&mut self, count: usize) {
        for channel in &mut self.channels {
            let count = count.min(channel.len());
            channel.drain(..count);
        }
    }
}
