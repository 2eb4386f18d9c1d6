use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits. Used for watts
/// and amperes so allocation arithmetic is bit-for-bit reproducible.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in the tick loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Wattage carried by `voltage` volts at `current` amperes, saturating at
/// [`Fixed64::MAX`].
#[inline]
pub fn watts(voltage: u32, current: Fixed64) -> Fixed64 {
    current.saturating_mul(Fixed64::saturating_from_num(voltage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watts_is_volts_times_amps() {
        assert_eq!(watts(128, f64_to_fixed64(5.0)), Fixed64::from_num(640));
        assert_eq!(watts(32, f64_to_fixed64(0.5)), Fixed64::from_num(16));
    }

    #[test]
    fn watts_zero_voltage_is_zero() {
        assert_eq!(watts(0, f64_to_fixed64(100.0)), Fixed64::ZERO);
    }

    #[test]
    fn watts_saturates() {
        assert_eq!(watts(u32::MAX, Fixed64::MAX), Fixed64::MAX);
    }

    #[test]
    fn conversion_round_trip_for_display() {
        assert_eq!(fixed64_to_f64(f64_to_fixed64(12.25)), 12.25);
    }
}
