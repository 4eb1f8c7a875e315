//! Численные helpers: exponential approach + range mapping
//!
//! Используются reticle model и FOV interpolator. Формулы детерминированы
//! (только f32 арифметика, без time-dependent состояния).

/// Ниже этого квадрата расстояния считаем что цель достигнута
const SMALL_NUMBER: f32 = 1.0e-8;

/// Exponential approach `current → target` со скоростью `speed` за `delta_time`
///
/// - `speed <= 0` → мгновенно возвращает target
/// - шаг = (target − current) × clamp(delta_time × speed, 0, 1)
/// - при `delta_time × speed >= 1` результат РОВНО target (без overshoot)
pub fn interp_to(current: f32, target: f32, delta_time: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }

    let distance = target - current;
    if distance * distance < SMALL_NUMBER {
        return target;
    }

    let alpha = (delta_time * speed).clamp(0.0, 1.0);
    if alpha >= 1.0 {
        return target;
    }

    current + distance * alpha
}

/// Линейно маппит `value` из `input` в `output` с clamp по output диапазону
///
/// Вырожденный input (min == max): 1.0 при value >= max, иначе 0.0
/// (в терминах процента диапазона).
pub fn map_range_clamped(input: (f32, f32), output: (f32, f32), value: f32) -> f32 {
    let (in_min, in_max) = input;
    let (out_min, out_max) = output;

    let divisor = in_max - in_min;
    let pct = if divisor == 0.0 {
        if value >= in_max {
            1.0
        } else {
            0.0
        }
    } else {
        (value - in_min) / divisor
    };

    out_min + (out_max - out_min) * pct.clamp(0.0, 1.0)
}
