// ============================================
// Thread-Local Context - Контексты для воркеров
// ============================================
//
// Каждый поток-воркер держит свой буфер эрозии,
// чтобы генератор мог быть общим (&self) без блокировок.

use std::cell::RefCell;
use super::erosion::ThermalErosion;

thread_local! {
    static EROSION_CONTEXT: RefCell<ThermalErosion> = RefCell::new(ThermalErosion::new());
}

/// Выполняет функцию с thread-local буфером эрозии
#[inline]
pub fn with_erosion_context<F, R>(f: F) -> R
where
    F: FnOnce(&mut ThermalErosion) -> R,
{
    EROSION_CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        f(&mut ctx)
    })
}
