//! Built-in function evaluation.
//!
//! Arguments arrive already evaluated; missing arguments default the way
//! the historical implementations do rather than raising. Only `if`, `def`
//! and `flat` live outside this table, as special forms in the evaluator.

use crate::dialect::Dialect;

/// Evaluate a built-in by (uppercase) name. Returns `None` for names that
/// are not built-ins.
pub(crate) fn eval_builtin(dialect: &Dialect, name: &str, args: &[f64]) -> Option<f64> {
    let x = args.first().copied().unwrap_or(0.0);
    let y = args.get(1).copied().unwrap_or(0.0);

    let value = match name {
        // Trigonometric
        "SIN" => x.sin(),
        "COS" => x.cos(),
        "TAN" => x.tan(),
        "ASIN" => x.asin(),
        "ACOS" => x.acos(),
        "ATAN" => x.atan(),
        "ATAN2" => x.atan2(args.get(1).copied().unwrap_or(1.0)),
        "SINH" => x.sinh(),
        "COSH" => x.cosh(),
        "TANH" => x.tanh(),

        // Exponential/logarithmic
        "EXP" => x.exp(),
        "LOG" | "LN" => {
            if x > 0.0 {
                x.ln()
            } else {
                -1e30
            }
        }
        "LOG10" => {
            if x > 0.0 {
                x.log10()
            } else {
                -1e30
            }
        }
        "SQRT" => dialect.sqrt(x),
        "CBRT" => x.cbrt(),
        "POW" => dialect.pow(x, args.get(1).copied().unwrap_or(1.0)),
        "PWR" => dialect.pwr(x, args.get(1).copied().unwrap_or(1.0)),
        "DB" => dialect.db(x),

        // Absolute value and sign
        "ABS" | "FABS" => x.abs(),
        "SGN" | "SIGN" => {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }

        // Rounding family
        "FLOOR" => x.floor(),
        "CEIL" => x.ceil(),
        "ROUND" | "NINT" => x.round(),
        "INT" => x.trunc(),

        // Min/max and limiting
        "MIN" => args.iter().copied().fold(f64::INFINITY, f64::min),
        "MAX" => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "HYPOT" => x.hypot(y),
        "LIMIT" => {
            let lo = args.get(1).copied().unwrap_or(f64::NEG_INFINITY);
            let hi = args.get(2).copied().unwrap_or(f64::INFINITY);
            x.clamp(lo, hi)
        }

        // Step family
        "U" | "STEP" => {
            if x >= 0.0 {
                1.0
            } else {
                0.0
            }
        }
        "URAMP" => {
            if x >= 0.0 {
                x
            } else {
                0.0
            }
        }
        "BUF" => {
            if x > 0.5 {
                1.0
            } else {
                0.0
            }
        }
        "INV" => {
            if x > 0.5 {
                0.0
            } else {
                1.0
            }
        }

        "TABLE" => eval_table(args),
        "POLY" => eval_poly(args),

        _ => return None,
    };
    Some(value)
}

/// `table(x, x1,y1, x2,y2, ...)`: piecewise-linear interpolation over
/// breakpoints with ascending x. Outside the breakpoint range the value
/// clamps to the nearest breakpoint's y; there is no extrapolation.
fn eval_table(args: &[f64]) -> f64 {
    if args.len() < 3 {
        return 0.0;
    }
    let x = args[0];
    let pairs: Vec<(f64, f64)> = args[1..]
        .chunks_exact(2)
        .map(|c| (c[0], c[1]))
        .collect();

    let (first, last) = match (pairs.first(), pairs.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return 0.0,
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }

    for window in pairs.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x >= x0 && x <= x1 {
            if (x1 - x0).abs() < 1e-30 {
                return y0;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    last.1
}

/// `poly(nvars, coeffs..., vars...)`: multivariate polynomial in the
/// classic SPICE graded ordering. The last `nvars` arguments are the
/// variable values; the coefficients walk the constant term, then all
/// first-order terms, then second-order products `v1*v1, v1*v2, ...`, and
/// so on until exhausted.
fn eval_poly(args: &[f64]) -> f64 {
    let n = args.first().copied().unwrap_or(0.0);
    if n < 1.0 || n.fract() != 0.0 {
        return 0.0;
    }
    let n = n as usize;
    if args.len() < 1 + n {
        return 0.0;
    }
    let vars = &args[args.len() - n..];
    let coeffs = &args[1..args.len() - n];
    if coeffs.is_empty() {
        return 0.0;
    }

    let mut total = coeffs[0];
    let mut k = 1;
    let mut degree = 1;
    while k < coeffs.len() {
        let mut indices = vec![0usize; degree];
        loop {
            if k >= coeffs.len() {
                break;
            }
            let term: f64 = indices.iter().map(|&i| vars[i]).product();
            total += coeffs[k] * term;
            k += 1;
            if !next_multiset(&mut indices, n) {
                break;
            }
        }
        degree += 1;
    }
    total
}

/// Advance a non-decreasing index tuple in lexicographic order. Returns
/// false when the last tuple has been produced.
fn next_multiset(indices: &mut [usize], n: usize) -> bool {
    for i in (0..indices.len()).rev() {
        if indices[i] + 1 < n {
            let bumped = indices[i] + 1;
            for slot in indices[i..].iter_mut() {
                *slot = bumped;
            }
            return true;
        }
    }
    false
}
