// ============================================
// Thermal Erosion - Осыпание крутых склонов
// ============================================
// Материал переезжает к соседу, если перепад больше talus.
// Дельты копятся в отдельном буфере, поэтому результат не
// зависит от порядка обхода и детерминирован.

use crate::terrain::config::GenerationConfig;

/// Термальная эрозия по heightmap с ореолом
pub struct ThermalErosion {
    delta: Vec<f32>,
}

impl ThermalErosion {
    pub fn new() -> Self {
        Self { delta: Vec::new() }
    }

    /// `stride` - ширина строки, `cell` - шаг сетки в мировых единицах
    pub fn apply(&mut self, heightmap: &mut [f32], stride: usize, cell: f32, params: &GenerationConfig) {
        if params.erosion_iterations == 0 || stride == 0 {
            return;
        }
        let rows = heightmap.len() / stride;
        let threshold = params.talus * cell;
        let rate = params.erosion_rate.clamp(0.0, 0.5);

        self.delta.clear();
        self.delta.resize(heightmap.len(), 0.0);

        for _ in 0..params.erosion_iterations {
            self.delta.fill(0.0);

            for y in 0..rows {
                for x in 0..stride {
                    let idx = y * stride + x;
                    let h = heightmap[idx];

                    let neighbors = [
                        (x + 1 < stride).then(|| idx + 1),
                        (y + 1 < rows).then(|| idx + stride),
                    ];
                    for n in neighbors.into_iter().flatten() {
                        let diff = h - heightmap[n];
                        if diff.abs() <= threshold {
                            continue;
                        }
                        let moved = rate * (diff.abs() - threshold) * 0.5;
                        if diff > 0.0 {
                            self.delta[idx] -= moved;
                            self.delta[n] += moved;
                        } else {
                            self.delta[idx] += moved;
                            self.delta[n] -= moved;
                        }
                    }
                }
            }

            for (h, d) in heightmap.iter_mut().zip(&self.delta) {
                *h += *d;
            }
        }
    }
}

impl Default for ThermalErosion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(iterations: u32) -> GenerationConfig {
        GenerationConfig { erosion_iterations: iterations, talus: 0.5, erosion_rate: 0.25, ..GenerationConfig::default() }
    }

    #[test]
    fn test_spike_is_flattened_and_mass_conserved() {
        let stride = 5;
        let mut heights = vec![0.0f32; 25];
        heights[12] = 10.0;
        let before: f32 = heights.iter().sum();

        ThermalErosion::new().apply(&mut heights, stride, 1.0, &params(10));

        let after: f32 = heights.iter().sum();
        assert!(heights[12] < 10.0);
        assert!(heights[7] > 0.0);
        assert!((before - after).abs() < 1e-3);
    }

    #[test]
    fn test_gentle_slope_is_untouched() {
        let stride = 4;
        let mut heights: Vec<f32> = (0..16).map(|i| (i % stride) as f32 * 0.25).collect();
        let original = heights.clone();
        ThermalErosion::new().apply(&mut heights, stride, 1.0, &params(4));
        assert_eq!(heights, original);
    }

    #[test]
    fn test_zero_iterations_is_noop() {
        let mut heights = vec![0.0, 100.0, 0.0, 0.0];
        ThermalErosion::new().apply(&mut heights, 2, 1.0, &params(0));
        assert_eq!(heights, vec![0.0, 100.0, 0.0, 0.0]);
    }
}
