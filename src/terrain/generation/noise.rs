// ============================================
// Noise Functions - Шумовые функции для генерации
// ============================================

/// Hash2D с сидом, значение в диапазоне 0.0..1.0
#[inline(always)]
pub fn hash2d(x: i32, y: i32, seed: u32) -> f32 {
    let n = x.wrapping_mul(374761393)
        .wrapping_add(y.wrapping_mul(668265263))
        .wrapping_add((seed as i32).wrapping_mul(1274126177));
    let n = (n ^ (n >> 13)).wrapping_mul(1911520717);
    ((n as u32) as f32) / (u32::MAX as f32)
}

#[inline(always)]
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// 2D Value Noise
#[inline]
pub fn noise2d(x: f32, y: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let xf = smoothstep(x - x.floor());
    let yf = smoothstep(y - y.floor());

    let n00 = hash2d(xi, yi, seed);
    let n10 = hash2d(xi + 1, yi, seed);
    let n01 = hash2d(xi, yi + 1, seed);
    let n11 = hash2d(xi + 1, yi + 1, seed);

    let nx0 = n00 + xf * (n10 - n00);
    let nx1 = n01 + xf * (n11 - n01);

    nx0 + yf * (nx1 - nx0)
}

/// FBM 2D - несколько октав шума, результат 0.0..1.0
#[inline]
pub fn fbm2d(x: f32, y: f32, octaves: u32, seed: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for octave in 0..octaves.max(1) {
        value += amplitude * noise2d(x * frequency, y * frequency, seed.wrapping_add(octave));
        max_value += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    value / max_value
}
