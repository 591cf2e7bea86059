//! Host number -> native integer conversions.

const TWO_POW_32: f64 = 4_294_967_296.0;

/// ECMAScript `ToUint32`.
pub fn to_uint32(x: f64) -> u32 {
    if !x.is_finite() {
        return 0;
    }
    x.trunc().rem_euclid(TWO_POW_32) as u32
}

/// ECMAScript `ToInt32`.
pub fn to_int32(x: f64) -> i32 {
    to_uint32(x) as i32
}
