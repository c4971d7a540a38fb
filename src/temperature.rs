//! Set point reconciliation between the user's unit and the wire format.
//!
//! The device always takes `SetTem` in whole degrees Celsius. When it is
//! displaying Fahrenheit it also needs `TemRec` to know which of the two
//! Fahrenheit integers around that Celsius value was meant.

use std::ops::RangeInclusive;

use crate::command::CommandParams;
use crate::types::TemperatureUnit;

pub const CELSIUS_RANGE: RangeInclusive<i32> = 16..=30;
pub const FAHRENHEIT_RANGE: RangeInclusive<i32> = 61..=86;

/// What goes on the wire for a set point change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetTemperature {
    pub unit: TemperatureUnit,
    pub set_tem: i32,
    pub tem_rec: i32,
}

impl TargetTemperature {
    pub fn to_params(&self) -> CommandParams {
        CommandParams::new()
            .with("TemUn", self.unit.as_wire())
            .with("SetTem", self.set_tem)
            .with("TemRec", self.tem_rec)
    }
}

/// Clamp to the span covering both ranges, 16..=86.
pub fn clamp_requested(value: i32) -> i32 {
    value.clamp(*CELSIUS_RANGE.start(), *FAHRENHEIT_RANGE.end())
}

/// Which unit a (clamped) value plausibly belongs to. Values between the two
/// ranges belong to neither.
pub fn classify(value: i32) -> Option<TemperatureUnit> {
    if CELSIUS_RANGE.contains(&value) {
        Some(TemperatureUnit::Celsius)
    } else if FAHRENHEIT_RANGE.contains(&value) {
        Some(TemperatureUnit::Fahrenheit)
    } else {
        None
    }
}

/// Resolve a requested set point against the unit the device last reported.
///
/// A value that is plausible in one unit selects that unit. A value that is
/// plausible in neither is replaced by a bound of the prior unit: the Celsius
/// maximum or the Fahrenheit minimum. With no prior unit known, Celsius is
/// assumed.
pub fn reconcile(requested: i32, prior: Option<TemperatureUnit>) -> TargetTemperature {
    let clamped = clamp_requested(requested);
    let (unit, value) = match classify(clamped) {
        Some(unit) => (unit, clamped),
        None => {
            let unit = prior.unwrap_or(TemperatureUnit::Celsius);
            let forced = match unit {
                TemperatureUnit::Celsius => *CELSIUS_RANGE.end(),
                TemperatureUnit::Fahrenheit => *FAHRENHEIT_RANGE.start(),
            };
            (unit, forced)
        }
    };

    match unit {
        TemperatureUnit::Celsius => TargetTemperature {
            unit,
            set_tem: value,
            tem_rec: 0,
        },
        TemperatureUnit::Fahrenheit => {
            let (set_tem, tem_rec) = fahrenheit_to_wire(value);
            TargetTemperature {
                unit,
                set_tem,
                tem_rec,
            }
        }
    }
}

/// `SetTem` is the rounded Celsius value; `TemRec` is 1 whenever the exact
/// conversion has a fractional part.
pub fn fahrenheit_to_wire(fahrenheit: i32) -> (i32, i32) {
    let celsius = (f64::from(fahrenheit) - 32.0) * 5.0 / 9.0;
    let set_tem = round_half_up(celsius);
    let tem_rec = i32::from(celsius.fract() > 0.0);
    (set_tem, tem_rec)
}

/// Display value for a wire `SetTem` while the unit is Fahrenheit.
///
/// The `TemRec - 0.5` bias matches the device's own display rounding. It does
/// not invert [`fahrenheit_to_wire`] exactly: 75°F goes out as (24, 1) and
/// comes back as 76°F.
pub fn wire_to_fahrenheit(set_tem: i32, tem_rec: i32) -> i32 {
    round_half_up(f64::from(set_tem) * 9.0 / 5.0 + 32.0 + f64::from(tem_rec) - 0.5)
}

fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TemperatureUnit::{Celsius, Fahrenheit};

    #[test]
    fn fahrenheit_input_switches_unit() {
        let t = reconcile(75, Some(Celsius));
        assert_eq!(
            t,
            TargetTemperature {
                unit: Fahrenheit,
                set_tem: 24,
                tem_rec: 1
            }
        );
    }

    #[test]
    fn celsius_input_wins_over_prior_fahrenheit() {
        for prior in [None, Some(Celsius), Some(Fahrenheit)] {
            let t = reconcile(20, prior);
            assert_eq!(
                t,
                TargetTemperature {
                    unit: Celsius,
                    set_tem: 20,
                    tem_rec: 0
                }
            );
        }
    }

    #[test]
    fn low_values_clamp_to_celsius_min() {
        assert_eq!(clamp_requested(5), 16);
        assert_eq!(reconcile(5, Some(Fahrenheit)).set_tem, 16);
        assert_eq!(reconcile(5, Some(Fahrenheit)).unit, Celsius);
    }

    #[test]
    fn high_values_clamp_to_fahrenheit_max() {
        let t = reconcile(120, Some(Celsius));
        assert_eq!(t.unit, Fahrenheit);
        assert_eq!((t.set_tem, t.tem_rec), (30, 0));
    }

    #[test]
    fn gap_values_force_bound_of_prior_unit() {
        assert_eq!(classify(45), None);
        assert_eq!(
            reconcile(45, Some(Celsius)),
            TargetTemperature {
                unit: Celsius,
                set_tem: 30,
                tem_rec: 0
            }
        );
        // 61°F -> 16.11°C
        assert_eq!(
            reconcile(45, Some(Fahrenheit)),
            TargetTemperature {
                unit: Fahrenheit,
                set_tem: 16,
                tem_rec: 1
            }
        );
        assert_eq!(reconcile(31, None).set_tem, 30);
    }

    #[test]
    fn whole_celsius_conversions_have_no_half_step() {
        assert_eq!(fahrenheit_to_wire(68), (20, 0));
        assert_eq!(fahrenheit_to_wire(77), (25, 0));
        assert_eq!(fahrenheit_to_wire(86), (30, 0));
        assert_eq!(fahrenheit_to_wire(74), (23, 1));
    }

    #[test]
    fn display_conversion_keeps_bias() {
        assert_eq!(wire_to_fahrenheit(24, 1), 76);
        assert_eq!(wire_to_fahrenheit(24, 0), 75);
        assert_eq!(wire_to_fahrenheit(20, 0), 68);
        assert_eq!(wire_to_fahrenheit(30, 0), 86);
    }

    #[test]
    fn to_params_order() {
        let p = reconcile(75, Some(Celsius)).to_params();
        let pairs: Vec<_> = p.iter().collect();
        assert_eq!(pairs, vec![("TemUn", 1), ("SetTem", 24), ("TemRec", 1)]);
    }
}
