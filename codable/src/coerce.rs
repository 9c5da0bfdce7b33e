/*!
Checked conversion of CBOR numbers into fixed width Rust numbers.

A conversion only succeeds when the target can hold the source value
exactly; otherwise decoding fails with [`Error::Overflow`] rather than
silently truncating or rounding.
*/

use super::*;

pub(crate) trait Number: Copy {
    const NAME: &'static str;

    fn from_unsigned(n: u64) -> Option<Self>;

    /// From the CBOR negative integer `-1 - n`
    fn from_negative(n: u64) -> Option<Self>;

    fn from_float(f: f64) -> Option<Self>;
}

macro_rules! impl_int_number {
    ($($ty:ty),*) => {
        $(
            impl Number for $ty {
                const NAME: &'static str = stringify!($ty);

                fn from_unsigned(n: u64) -> Option<Self> {
                    <$ty>::try_from(n).ok()
                }

                fn from_negative(n: u64) -> Option<Self> {
                    <$ty>::try_from(-1 - n as i128).ok()
                }

                fn from_float(f: f64) -> Option<Self> {
                    if f.fract() == 0.0 {
                        num_traits::FromPrimitive::from_f64(f)
                    } else {
                        None
                    }
                }
            }
        )*
    };
}

impl_int_number!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

macro_rules! impl_float_number {
    ($($ty:ty),*) => {
        $(
            impl Number for $ty {
                const NAME: &'static str = stringify!($ty);

                fn from_unsigned(n: u64) -> Option<Self> {
                    let f = <$ty as num_traits::FromPrimitive>::from_u64(n)?;
                    let back: f64 = num_traits::ToPrimitive::to_f64(&f)?;
                    // Compare in u128, as u64::MAX rounds up to 2^64
                    if back.is_finite() && back as u128 == n as u128 {
                        Some(f)
                    } else {
                        None
                    }
                }

                fn from_negative(n: u64) -> Option<Self> {
                    let v = -1 - n as i128;
                    let f = <$ty as num_traits::FromPrimitive>::from_i128(v)?;
                    let back: f64 = num_traits::ToPrimitive::to_f64(&f)?;
                    if back.is_finite() && back as i128 == v {
                        Some(f)
                    } else {
                        None
                    }
                }

                fn from_float(f: f64) -> Option<Self> {
                    let g = <$ty as num_traits::FromPrimitive>::from_f64(f)?;
                    let back: f64 = num_traits::ToPrimitive::to_f64(&g)?;
                    if back == f || f.is_nan() {
                        Some(g)
                    } else {
                        None
                    }
                }
            }
        )*
    };
}

impl_float_number!(half::f16, f32, f64);

fn overflow<T: Number>(value: impl ToString, path: &[Key]) -> Error {
    Error::Overflow {
        value: value.to_string(),
        target: T::NAME,
        path: path.into(),
    }
}

/// Convert a (possibly tagged) numeric item to `T`
pub(crate) fn unbox_number<T: Number>(value: &Value, path: &[Key]) -> Result<T, Error> {
    match value.untagged() {
        Value::UnsignedInt(n) => T::from_unsigned(*n).ok_or_else(|| overflow::<T>(n, path)),
        Value::NegativeInt(n) => {
            T::from_negative(*n).ok_or_else(|| overflow::<T>(-1 - *n as i128, path))
        }
        Value::Half(f) => T::from_float(f.to_f64()).ok_or_else(|| overflow::<T>(f, path)),
        Value::Float(f) => T::from_float(*f as f64).ok_or_else(|| overflow::<T>(f, path)),
        Value::Double(f) => T::from_float(*f).ok_or_else(|| overflow::<T>(f, path)),
        Value::Null => Err(Error::UnexpectedNull {
            expected: T::NAME,
            path: path.into(),
        }),
        other => Err(Error::TypeMismatch {
            expected: T::NAME,
            found: other.type_name(),
            path: path.into(),
        }),
    }
}

/// Represent a 128-bit integer as a CBOR integer, if it fits in one
pub(crate) fn box_i128(v: i128, target: &'static str, path: &[Key]) -> Result<Value, Error> {
    if let Ok(n) = u64::try_from(v) {
        Ok(Value::UnsignedInt(n))
    } else if let Ok(n) = u64::try_from(-1 - v) {
        Ok(Value::NegativeInt(n))
    } else {
        Err(Error::Overflow {
            value: v.to_string(),
            target,
            path: path.into(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unbox<T: Number>(v: Value) -> Result<T, Error> {
        unbox_number(&v, &[])
    }

    #[test]
    fn narrowing() {
        assert_eq!(unbox::<u8>(Value::from(200u64)).unwrap(), 200);
        assert!(matches!(
            unbox::<u8>(Value::from(300u64)),
            Err(Error::Overflow { target: "u8", .. })
        ));
        assert_eq!(unbox::<i8>(Value::from(-128)).unwrap(), -128);
        assert!(matches!(unbox::<i8>(Value::from(-129)), Err(Error::Overflow { .. })));
        assert!(matches!(unbox::<u32>(Value::from(-1)), Err(Error::Overflow { .. })));
        assert_eq!(unbox::<i128>(Value::NegativeInt(u64::MAX)).unwrap(), -(1i128 << 64));
        assert!(matches!(
            unbox::<i64>(Value::NegativeInt(u64::MAX)),
            Err(Error::Overflow { .. })
        ));
        assert_eq!(unbox::<u64>(Value::UnsignedInt(u64::MAX)).unwrap(), u64::MAX);
    }

    #[test]
    fn floats_to_ints() {
        assert_eq!(unbox::<u8>(Value::Double(3.0)).unwrap(), 3);
        assert_eq!(unbox::<i16>(Value::Half(half::f16::from_f32(-2.0))).unwrap(), -2);
        assert!(matches!(unbox::<u8>(Value::Double(3.5)), Err(Error::Overflow { .. })));
        assert!(matches!(unbox::<u8>(Value::Double(256.0)), Err(Error::Overflow { .. })));
        assert!(matches!(unbox::<u8>(Value::Double(-1.0)), Err(Error::Overflow { .. })));
        assert!(matches!(unbox::<i64>(Value::Double(f64::NAN)), Err(Error::Overflow { .. })));
        assert!(matches!(
            unbox::<i64>(Value::Double(f64::INFINITY)),
            Err(Error::Overflow { .. })
        ));
        assert!(matches!(
            unbox::<i64>(Value::Double(9223372036854775808.0)),
            Err(Error::Overflow { .. })
        ));
    }

    #[test]
    fn ints_to_floats() {
        assert_eq!(unbox::<f64>(Value::from(1u64 << 53)).unwrap(), 9007199254740992.0);
        assert!(matches!(
            unbox::<f64>(Value::from((1u64 << 53) + 1)),
            Err(Error::Overflow { target: "f64", .. })
        ));
        assert!(matches!(
            unbox::<f64>(Value::UnsignedInt(u64::MAX)),
            Err(Error::Overflow { .. })
        ));
        assert_eq!(unbox::<f32>(Value::from(-16777216)).unwrap(), -16777216.0);
        assert!(matches!(
            unbox::<f32>(Value::from(16777217u64)),
            Err(Error::Overflow { .. })
        ));
        assert_eq!(
            unbox::<half::f16>(Value::from(2048u64)).unwrap(),
            half::f16::from_f32(2048.0)
        );
        assert!(matches!(
            unbox::<half::f16>(Value::from(2049u64)),
            Err(Error::Overflow { .. })
        ));
        assert!(matches!(
            unbox::<half::f16>(Value::from(100000u64)),
            Err(Error::Overflow { .. })
        ));
    }

    #[test]
    fn floats_to_floats() {
        assert_eq!(unbox::<f32>(Value::Double(0.5)).unwrap(), 0.5);
        assert!(matches!(unbox::<f32>(Value::Double(1.1)), Err(Error::Overflow { .. })));
        assert!(unbox::<f32>(Value::Double(f64::NAN)).unwrap().is_nan());
        assert_eq!(unbox::<f32>(Value::Double(f64::INFINITY)).unwrap(), f32::INFINITY);
        assert_eq!(unbox::<f64>(Value::Float(1.1)).unwrap(), 1.1f32 as f64);
        assert!(matches!(unbox::<f32>(Value::Double(1e300)), Err(Error::Overflow { .. })));
    }

    #[test]
    fn shape_errors() {
        assert!(matches!(
            unbox::<u8>(Value::Null),
            Err(Error::UnexpectedNull { expected: "u8", .. })
        ));
        assert!(matches!(
            unbox::<u8>(Value::from("1")),
            Err(Error::TypeMismatch { found: "text string", .. })
        ));
        assert_eq!(
            unbox::<u8>(Value::tagged(cbor::Tag(100), Value::from(1u8))).unwrap(),
            1
        );
    }
}
