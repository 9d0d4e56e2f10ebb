//! Single biquad filter effect.

use kinetone_core::{
    AudioFilter, BiquadTopology, DEFAULT_Q, Effect, FilterAlgorithm, FilterParameters,
    MAX_FILTER_FREQUENCY, ParamDescriptor, ParamUnit, ParameterInfo,
};

/// Topologies in parameter-index order.
const TOPOLOGIES: [BiquadTopology; 4] = [
    BiquadTopology::Direct,
    BiquadTopology::Canonical,
    BiquadTopology::TransposedDirect,
    BiquadTopology::TransposedCanonical,
];

const PARAMS: [ParamDescriptor; 5] = [
    ParamDescriptor::choice("Algorithm", "algorithm", FilterAlgorithm::ALL.len(), 7),
    ParamDescriptor::frequency("Cutoff", "fc", 20.0, MAX_FILTER_FREQUENCY, 1000.0),
    ParamDescriptor::new("Resonance", "q", ParamUnit::None, 0.1, 20.0, DEFAULT_Q),
    ParamDescriptor::gain_db("Boost/Cut", "boost_cut", -24.0, 24.0, 0.0),
    ParamDescriptor::choice("Topology", "topology", TOPOLOGIES.len(), 0),
];

/// Any of the 29 filter designs as an effect.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Algorithm | 0–28 ([`FilterAlgorithm::ALL`] order) | 7 (`butter_lpf2`) |
/// | 1 | Cutoff | 20–20480 Hz | 1000.0 |
/// | 2 | Resonance | 0.1–20 | 0.707 |
/// | 3 | Boost/Cut | -24–24 dB | 0.0 |
/// | 4 | Topology | 0–3 (direct, canonical, transposed direct, transposed canonical) | 0 |
///
/// # Example
///
/// ```rust
/// use kinetone_core::{Effect, FilterAlgorithm, FilterParameters};
/// use kinetone_effects::Filter;
///
/// let mut filter = Filter::new(48000.0);
/// filter.set_parameters(FilterParameters::new(FilterAlgorithm::ButterHpf2, 120.0));
///
/// let output = filter.process(0.5);
/// assert!(output.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    filter: AudioFilter,
}

impl Filter {
    /// Create a 1 kHz Butterworth low-pass.
    pub fn new(sample_rate: f64) -> Self {
        let mut filter = AudioFilter::new(sample_rate);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::ButterLpf2, 1000.0));
        Self { filter }
    }

    /// Current design parameters.
    pub fn parameters(&self) -> FilterParameters {
        self.filter.parameters()
    }

    /// Apply design parameters, clamping unrealisable values.
    pub fn set_parameters(&mut self, params: FilterParameters) {
        self.filter.set_parameters(params);
    }

    /// The wrapped filter.
    pub fn audio_filter(&self) -> &AudioFilter {
        &self.filter
    }

    fn update(&mut self, f: impl FnOnce(&mut FilterParameters)) {
        let mut params = self.filter.parameters();
        f(&mut params);
        self.filter.set_parameters(params);
    }
}

impl Effect for Filter {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        self.filter.process(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.filter.reset(sample_rate);
    }

    fn reset(&mut self) {
        Effect::reset(&mut self.filter);
    }
}

impl ParameterInfo for Filter {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f64 {
        let params = self.filter.parameters();
        match index {
            0 => params.algorithm.index() as f64,
            1 => params.fc,
            2 => params.q,
            3 => params.boost_cut_db,
            4 => TOPOLOGIES
                .iter()
                .position(|&t| t == self.filter.topology())
                .unwrap_or(0) as f64,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        let Some(desc) = PARAMS.get(index) else {
            return;
        };
        let value = desc.clamp(value);
        match index {
            0 => {
                if let Some(algorithm) = FilterAlgorithm::from_index(value as usize) {
                    self.update(|p| p.algorithm = algorithm);
                }
            }
            1 => self.update(|p| p.fc = value),
            2 => self.update(|p| p.q = value),
            3 => self.update(|p| p.boost_cut_db = value),
            4 => self.filter.set_topology(TOPOLOGIES[value as usize]),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    fn sine_rms(filter: &mut Filter, freq: f64) -> f64 {
        let n = 9600;
        let mut sum = 0.0;
        for i in 0..n {
            let y = filter.process((2.0 * PI * freq * i as f64 / 48000.0).sin());
            if i >= n / 2 {
                sum += y * y;
            }
        }
        (sum / (n / 2) as f64).sqrt()
    }

    #[test]
    fn test_default_is_lowpass() {
        let mut filter = Filter::new(48000.0);
        let low = sine_rms(&mut filter, 100.0);
        filter.reset();
        let high = sine_rms(&mut filter, 10000.0);
        assert!(low > 0.65, "passband rms {low}");
        assert!(high < 0.02, "stopband rms {high}");
    }

    #[test]
    fn test_params_by_name() {
        let mut filter = Filter::new(48000.0);
        let algorithm = filter.find_param_by_name("algorithm").unwrap();
        filter.set_param(algorithm, FilterAlgorithm::HiShelf.index() as f64);
        filter.set_param(filter.find_param_by_name("boost_cut").unwrap(), 6.0);
        filter.set_param(filter.find_param_by_name("fc").unwrap(), 99999.0);

        let params = filter.parameters();
        assert_eq!(params.algorithm, FilterAlgorithm::HiShelf);
        assert_eq!(params.boost_cut_db, 6.0);
        assert_eq!(params.fc, MAX_FILTER_FREQUENCY);
    }

    #[test]
    fn test_topology_param() {
        let mut filter = Filter::new(48000.0);
        filter.set_param(4, 3.0);
        assert_eq!(
            filter.audio_filter().topology(),
            BiquadTopology::TransposedCanonical
        );
        assert_eq!(filter.get_param(4), 3.0);
    }

    #[test]
    fn test_descriptor_defaults_match_state() {
        let filter = Filter::new(48000.0);
        for i in 0..filter.param_count() {
            let desc = filter.param_info(i).unwrap();
            assert!(
                (filter.get_param(i) - desc.default).abs() < 1e-9,
                "{}: {} vs {}",
                desc.name,
                filter.get_param(i),
                desc.default
            );
        }
    }
}
