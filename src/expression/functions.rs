//! Built-in functions callable from expressions

use noise::{Fbm, MultiFractal, NoiseFn, Perlin, RidgedMulti, Worley};

/// Largest argument count of any built-in
pub const MAX_ARITY: usize = 7;

const MAX_OCTAVES: f64 = 30.0;

/// Built-in functions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Cbrt,
    Abs,
    Ceil,
    Floor,
    Rint,
    Round,
    Exp,
    Ln,
    Log10,
    Min,
    Max,
    Clamp,
    Sign,
    Perlin,
    Voronoi,
    RidgedMulti,
}

impl Builtin {
    /// Look up a built-in by its source name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "atan2" => Self::Atan2,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "sqrt" => Self::Sqrt,
            "cbrt" => Self::Cbrt,
            "abs" => Self::Abs,
            "ceil" => Self::Ceil,
            "floor" => Self::Floor,
            "rint" => Self::Rint,
            "round" => Self::Round,
            "exp" => Self::Exp,
            "ln" | "log" => Self::Ln,
            "log10" => Self::Log10,
            "min" => Self::Min,
            "max" => Self::Max,
            "clamp" => Self::Clamp,
            "sign" => Self::Sign,
            "perlin" => Self::Perlin,
            "voronoi" => Self::Voronoi,
            "ridgedmulti" => Self::RidgedMulti,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Atan2 => "atan2",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Sqrt => "sqrt",
            Self::Cbrt => "cbrt",
            Self::Abs => "abs",
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::Rint => "rint",
            Self::Round => "round",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Log10 => "log10",
            Self::Min => "min",
            Self::Max => "max",
            Self::Clamp => "clamp",
            Self::Sign => "sign",
            Self::Perlin => "perlin",
            Self::Voronoi => "voronoi",
            Self::RidgedMulti => "ridgedmulti",
        }
    }

    /// Accepted argument counts (inclusive)
    pub fn arity(self) -> (usize, usize) {
        match self {
            Self::Atan2 => (2, 2),
            Self::Min | Self::Max => (2, 3),
            Self::Clamp => (3, 3),
            Self::Perlin => (7, 7),
            Self::Voronoi => (5, 5),
            Self::RidgedMulti => (6, 6),
            _ => (1, 1),
        }
    }

    /// Human-readable arity for error messages
    pub fn arity_description(self) -> String {
        match self.arity() {
            (lo, hi) if lo == hi => lo.to_string(),
            (lo, hi) => format!("{}..={}", lo, hi),
        }
    }

    /// Evaluate with already-checked arguments. Built-ins never fail; domain
    /// errors yield NaN like the underlying float operations.
    pub fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(0.0);
        match self {
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Atan2 => a.atan2(args[1]),
            Self::Sinh => a.sinh(),
            Self::Cosh => a.cosh(),
            Self::Tanh => a.tanh(),
            Self::Sqrt => a.sqrt(),
            Self::Cbrt => a.cbrt(),
            Self::Abs => a.abs(),
            Self::Ceil => a.ceil(),
            Self::Floor => a.floor(),
            Self::Rint => a.round_ties_even(),
            // Ties toward positive infinity
            Self::Round => (a + 0.5).floor(),
            Self::Exp => a.exp(),
            Self::Ln => a.ln(),
            Self::Log10 => a.log10(),
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Clamp => a.max(args[1]).min(args[2]),
            Self::Sign => {
                if a == 0.0 {
                    0.0
                } else {
                    a.signum()
                }
            }
            Self::Perlin => perlin(
                seed(a),
                [args[1], args[2], args[3]],
                args[4],
                octaves(args[5]),
                args[6],
            ),
            Self::Voronoi => Worley::new(seed(a))
                .set_frequency(args[4])
                .get([args[1], args[2], args[3]]),
            Self::RidgedMulti => RidgedMulti::<Perlin>::new(seed(a))
                .set_frequency(args[4])
                .set_octaves(octaves(args[5]))
                .get([args[1], args[2], args[3]]),
        }
    }
}

fn seed(v: f64) -> u32 {
    v as u32
}

fn octaves(v: f64) -> usize {
    if v.is_nan() {
        return 1;
    }
    v.clamp(1.0, MAX_OCTAVES) as usize
}

fn perlin(seed: u32, point: [f64; 3], frequency: f64, octaves: usize, persistence: f64) -> f64 {
    Fbm::<Perlin>::new(seed)
        .set_frequency(frequency)
        .set_octaves(octaves)
        .set_persistence(persistence)
        .get(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Builtin::from_name("sin"), Some(Builtin::Sin));
        assert_eq!(Builtin::from_name("log"), Some(Builtin::Ln));
        assert_eq!(Builtin::from_name("ridgedmulti"), Some(Builtin::RidgedMulti));
        assert_eq!(Builtin::from_name("noise"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for b in [Builtin::Cbrt, Builtin::Clamp, Builtin::Voronoi, Builtin::Ln] {
            assert_eq!(Builtin::from_name(b.name()), Some(b));
        }
    }

    #[test]
    fn test_arity() {
        assert_eq!(Builtin::Sqrt.arity(), (1, 1));
        assert_eq!(Builtin::Max.arity(), (2, 3));
        assert_eq!(Builtin::Max.arity_description(), "2..=3");
        assert_eq!(Builtin::Perlin.arity_description(), "7");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(Builtin::Round.apply(&[2.5]), 3.0);
        assert_eq!(Builtin::Round.apply(&[-2.5]), -2.0);
        assert_eq!(Builtin::Rint.apply(&[2.5]), 2.0);
        assert_eq!(Builtin::Rint.apply(&[3.5]), 4.0);
    }

    #[test]
    fn test_min_max_clamp_sign() {
        assert_eq!(Builtin::Min.apply(&[3.0, 1.0, 2.0]), 1.0);
        assert_eq!(Builtin::Max.apply(&[3.0, 4.0]), 4.0);
        assert_eq!(Builtin::Clamp.apply(&[5.0, 0.0, 2.0]), 2.0);
        assert_eq!(Builtin::Clamp.apply(&[-1.0, 0.0, 2.0]), 0.0);
        assert_eq!(Builtin::Sign.apply(&[-3.0]), -1.0);
        assert_eq!(Builtin::Sign.apply(&[0.0]), 0.0);
    }

    #[test]
    fn test_noise_deterministic() {
        let args = [7.0, 0.3, 1.7, -2.1, 0.5, 4.0, 0.5];
        let a = Builtin::Perlin.apply(&args);
        let b = Builtin::Perlin.apply(&args);
        assert_eq!(a, b);
        assert!(a.is_finite());

        let v = Builtin::Voronoi.apply(&[1.0, 0.2, 0.4, 0.6, 1.0]);
        assert!(v.is_finite());

        let r = Builtin::RidgedMulti.apply(&[1.0, 0.2, 0.4, 0.6, 1.0, 3.0]);
        assert!(r.is_finite());
    }

    #[test]
    fn test_octaves_clamped() {
        assert_eq!(octaves(0.0), 1);
        assert_eq!(octaves(1000.0), 30);
        assert_eq!(octaves(f64::NAN), 1);
    }
}
