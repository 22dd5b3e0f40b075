//! Expression dialects: named numeric-semantics profiles.
//!
//! Historical SPICE variants disagree on the edge cases of `pow`, `pwr`,
//! `sqrt` and `db` for negative or out-of-domain inputs, and on how tightly
//! unary minus binds relative to `**`. The evaluator takes an explicit
//! [`Dialect`] rather than assuming one universal behavior.

/// `pow(base, exp)` behavior for a negative base with a fractional exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PowBehavior {
    /// Return zero.
    ZeroForNegativeBase,
    /// Truncate the exponent to an integer and use integer exponentiation,
    /// keeping the sign of the base: `pow(-2, 1.5)` = `(-2)^1` = `-2`.
    TruncateExponent,
    /// Operate on the absolute value of the base: `pow(-2, 1.5)` =
    /// `2^1.5`.
    AbsoluteBase,
    /// IEEE `powf` semantics (NaN for a negative base and fractional
    /// exponent).
    Ieee,
}

/// `pwr(x, y)` behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PwrBehavior {
    /// `|x|^y`.
    AbsPow,
    /// `sgn(x) * |x|^y`.
    SignedAbsPow,
}

/// `sqrt(x)` behavior for negative input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SqrtBehavior {
    /// Return zero.
    ZeroForNegative,
    /// `sqrt(|x|)`.
    AbsoluteValue,
    /// IEEE semantics (NaN).
    Ieee,
}

/// `db(x)` behavior for non-positive input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DbBehavior {
    /// `20*log10(|x|)`, saturating at -1e30 for zero.
    AbsoluteValue,
    /// Saturate to -1e30 for any non-positive input.
    FloorForNonPositive,
}

/// A named numeric-semantics profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Profile name, for diagnostics.
    pub name: &'static str,
    pub pow: PowBehavior,
    pub pwr: PwrBehavior,
    pub sqrt: SqrtBehavior,
    pub db: DbBehavior,
    /// When set, unary minus binds tighter than `**`: `-2**2` is `(-2)**2`.
    /// Otherwise `-2**2` is `-(2**2)`.
    pub unary_binds_tighter: bool,
}

impl Dialect {
    /// Berkeley SPICE 3 style: IEEE arithmetic, loose unary minus.
    pub fn spice3() -> Self {
        Self {
            name: "spice3",
            pow: PowBehavior::Ieee,
            pwr: PwrBehavior::SignedAbsPow,
            sqrt: SqrtBehavior::Ieee,
            db: DbBehavior::AbsoluteValue,
            unary_binds_tighter: false,
        }
    }

    /// LTspice style: out-of-domain inputs collapse to zero.
    pub fn ltspice() -> Self {
        Self {
            name: "ltspice",
            pow: PowBehavior::ZeroForNegativeBase,
            pwr: PwrBehavior::AbsPow,
            sqrt: SqrtBehavior::ZeroForNegative,
            db: DbBehavior::FloorForNonPositive,
            unary_binds_tighter: false,
        }
    }

    /// PSpice style: truncated integer exponent, tight unary minus.
    pub fn pspice() -> Self {
        Self {
            name: "pspice",
            pow: PowBehavior::TruncateExponent,
            pwr: PwrBehavior::SignedAbsPow,
            sqrt: SqrtBehavior::AbsoluteValue,
            db: DbBehavior::AbsoluteValue,
            unary_binds_tighter: true,
        }
    }

    /// HSPICE style: absolute-value base.
    pub fn hspice() -> Self {
        Self {
            name: "hspice",
            pow: PowBehavior::AbsoluteBase,
            pwr: PwrBehavior::SignedAbsPow,
            sqrt: SqrtBehavior::AbsoluteValue,
            db: DbBehavior::AbsoluteValue,
            unary_binds_tighter: true,
        }
    }

    /// Apply this dialect's `pow` semantics.
    pub fn pow(&self, base: f64, exp: f64) -> f64 {
        if base >= 0.0 || exp.fract() == 0.0 {
            return match self.pow {
                // Integer exponents are exact in every profile
                PowBehavior::TruncateExponent if base < 0.0 => powi_clamped(base, exp.trunc()),
                _ => base.powf(exp),
            };
        }
        match self.pow {
            PowBehavior::ZeroForNegativeBase => 0.0,
            PowBehavior::TruncateExponent => powi_clamped(base, exp.trunc()),
            PowBehavior::AbsoluteBase => base.abs().powf(exp),
            PowBehavior::Ieee => base.powf(exp),
        }
    }

    /// Apply this dialect's `pwr` semantics.
    pub fn pwr(&self, x: f64, y: f64) -> f64 {
        let magnitude = x.abs().powf(y);
        match self.pwr {
            PwrBehavior::AbsPow => magnitude,
            PwrBehavior::SignedAbsPow => magnitude * signum_or_zero(x),
        }
    }

    /// Apply this dialect's `sqrt` semantics.
    pub fn sqrt(&self, x: f64) -> f64 {
        if x >= 0.0 {
            return x.sqrt();
        }
        match self.sqrt {
            SqrtBehavior::ZeroForNegative => 0.0,
            SqrtBehavior::AbsoluteValue => x.abs().sqrt(),
            SqrtBehavior::Ieee => x.sqrt(),
        }
    }

    /// Apply this dialect's `db` semantics.
    pub fn db(&self, x: f64) -> f64 {
        match self.db {
            DbBehavior::AbsoluteValue => {
                if x == 0.0 {
                    -1e30
                } else {
                    20.0 * x.abs().log10()
                }
            }
            DbBehavior::FloorForNonPositive => {
                if x <= 0.0 {
                    -1e30
                } else {
                    20.0 * x.log10()
                }
            }
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::spice3()
    }
}

fn powi_clamped(base: f64, exp: f64) -> f64 {
    let exp = exp.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
    base.powi(exp)
}

fn signum_or_zero(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_dialects_disagree_on_negative_base() {
        assert_eq!(Dialect::ltspice().pow(-2.0, 1.5), 0.0);
        assert_eq!(Dialect::pspice().pow(-2.0, 1.5), -2.0);
        assert!((Dialect::hspice().pow(-2.0, 1.5) - 2.0_f64.powf(1.5)).abs() < 1e-12);
        assert!(Dialect::spice3().pow(-2.0, 1.5).is_nan());
    }

    #[test]
    fn test_pow_integer_exponent_is_exact_everywhere() {
        for dialect in [
            Dialect::spice3(),
            Dialect::ltspice(),
            Dialect::pspice(),
            Dialect::hspice(),
        ] {
            assert_eq!(dialect.pow(-2.0, 3.0), -8.0, "{}", dialect.name);
            assert_eq!(dialect.pow(2.0, 10.0), 1024.0, "{}", dialect.name);
        }
    }

    #[test]
    fn test_sqrt_behaviors() {
        assert_eq!(Dialect::ltspice().sqrt(-4.0), 0.0);
        assert_eq!(Dialect::hspice().sqrt(-4.0), 2.0);
        assert!(Dialect::spice3().sqrt(-4.0).is_nan());
    }

    #[test]
    fn test_pwr_behaviors() {
        assert_eq!(Dialect::ltspice().pwr(-2.0, 2.0), 4.0);
        assert_eq!(Dialect::hspice().pwr(-2.0, 2.0), -4.0);
    }

    #[test]
    fn test_db_floor() {
        assert_eq!(Dialect::ltspice().db(-10.0), -1e30);
        assert!((Dialect::spice3().db(-10.0) - 20.0).abs() < 1e-12);
        assert!((Dialect::spice3().db(10.0) - 20.0).abs() < 1e-12);
    }
}
