// ============================================
// Terrain Colors - Цвета по высоте и уклону
// ============================================

use crate::terrain::mesh::VertexColor;

const SAND: VertexColor = VertexColor::new(194, 178, 128);
const GRASS: VertexColor = VertexColor::new(86, 125, 70);
const ROCK: VertexColor = VertexColor::new(112, 108, 100);
const SNOW: VertexColor = VertexColor::new(240, 240, 245);

/// Цвет вершины.
/// `height` - нормализованная высота 0..1, `slope` - 0 (плоско) .. 1 (стена)
#[inline]
pub fn terrain_color(height: f32, slope: f32) -> VertexColor {
    if slope > 0.6 {
        return ROCK;
    }
    match height {
        h if h < 0.15 => SAND,
        h if h < 0.65 => GRASS,
        h if h < 0.85 => ROCK,
        _ => SNOW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_bands() {
        assert_eq!(terrain_color(0.05, 0.0), SAND);
        assert_eq!(terrain_color(0.4, 0.1), GRASS);
        assert_eq!(terrain_color(0.95, 0.0), SNOW);
        assert_eq!(terrain_color(0.4, 0.9), ROCK);
    }
}
