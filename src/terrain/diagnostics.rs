// ============================================
// Diagnostics - Тайминги генерации
// ============================================

use std::fmt;

/// Что измеряем (миллисекунды)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    HeightmapGenerationMs,
    ErosionGenerationMs,
    MeshBuildMs,
    /// Применение меша к тайлу на потоке координатора
    MeshUpdateMs,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::HeightmapGenerationMs => "heightmap",
            Metric::ErosionGenerationMs => "erosion",
            Metric::MeshBuildMs => "mesh build",
            Metric::MeshUpdateMs => "mesh update",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Приёмник диагностики, вызывается только координатором
pub trait DiagnosticsSink {
    fn record(&self, metric: Metric, value: f64);
}

/// Ничего не делает (release)
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    #[inline]
    fn record(&self, _metric: Metric, _value: f64) {}
}

/// Пишет тайминги в log::debug
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn record(&self, metric: Metric, value: f64) {
        log::debug!("LOD 0 {}: {:.3} ms", metric, value);
    }
}
