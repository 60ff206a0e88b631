/// Host texture unit access. Every callback returns one RGBA texel.
///
/// The machine only moves coordinates and results around; filtering and
/// wrapping belong to the host.
pub trait Sampler {
    fn texture1d(&mut self, _bias: f32, _s: f32, _unit: u32) -> [f32; 4] {
        [0.0; 4]
    }

    fn texture2d(&mut self, _bias: f32, _s: f32, _t: f32, _unit: u32) -> [f32; 4] {
        [0.0; 4]
    }

    fn texture3d(&mut self, _bias: f32, _s: f32, _t: f32, _r: f32, _unit: u32) -> [f32; 4] {
        [0.0; 4]
    }

    fn texture_cube(&mut self, _bias: f32, _s: f32, _t: f32, _r: f32, _unit: u32) -> [f32; 4] {
        [0.0; 4]
    }

    fn shadow1d(&mut self, _bias: f32, _s: f32, _t: f32, _r: f32, _unit: u32) -> [f32; 4] {
        [0.0; 4]
    }

    fn shadow2d(&mut self, _bias: f32, _s: f32, _t: f32, _r: f32, _unit: u32) -> [f32; 4] {
        [0.0; 4]
    }
}

/// Samples black everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSampler;

impl Sampler for NullSampler {}
