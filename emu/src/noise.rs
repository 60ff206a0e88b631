//! Lattice gradient noise in one to four dimensions, roughly in `[-1, 1]`.

fn hash(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Gradient component in `[-1, 1]` for lattice point `cell` along `axis`.
fn gradient(cell: &[i32], axis: usize) -> f32 {
    let seed = cell.iter().fold(axis as u32 ^ 0x9e37_79b9, |h, &c| {
        hash(h ^ (c as u32).wrapping_mul(0x85eb_ca6b))
    });
    (seed & 0xffff) as f32 / 32767.5 - 1.0
}

fn noise(p: &[f32]) -> f32 {
    let n = p.len();
    let base: Vec<i32> = p.iter().map(|v| v.floor() as i32).collect();
    let frac: Vec<f32> = p.iter().zip(&base).map(|(v, b)| v - *b as f32).collect();

    let mut sum = 0.0;
    let mut cell = vec![0; n];
    for corner in 0..(1u32 << n) {
        let mut weight = 1.0;
        let mut offset = vec![0.0; n];
        for axis in 0..n {
            let high = corner >> axis & 1 == 1;
            cell[axis] = base[axis] + high as i32;
            offset[axis] = if high { frac[axis] - 1.0 } else { frac[axis] };
            let f = fade(frac[axis]);
            weight *= if high { f } else { 1.0 - f };
        }
        let dot: f32 = offset
            .iter()
            .enumerate()
            .map(|(axis, d)| gradient(&cell, axis) * d)
            .sum();
        sum += weight * dot;
    }
    sum.clamp(-1.0, 1.0)
}

pub fn noise1(x: f32) -> f32 {
    noise(&[x])
}

pub fn noise2(x: f32, y: f32) -> f32 {
    noise(&[x, y])
}

pub fn noise3(x: f32, y: f32, z: f32) -> f32 {
    noise(&[x, y, z])
}

pub fn noise4(x: f32, y: f32, z: f32, w: f32) -> f32 {
    noise(&[x, y, z, w])
}
