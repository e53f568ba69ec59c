use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Element types a [`Tensor`](crate::Tensor) can hold.
///
/// Tabular datasets use `f64`; image batches use `f32`.
pub trait Float:
    Copy
    + Clone
    + Default
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + Sum
    + Serialize
    + for<'de> Deserialize<'de>
    + 'static
{
    const ZERO: Self;

    fn from_f64(v: f64) -> Self;
    fn from_u8(v: u8) -> Self;
    fn max(self, other: Self) -> Self;
    fn min(self, other: Self) -> Self;
}

impl Float for f32 {
    const ZERO: Self = 0.0;

    #[inline] fn from_f64(v: f64) -> Self { v as f32 }
    #[inline] fn from_u8(v: u8) -> Self { v as f32 }
    #[inline] fn max(self, other: Self) -> Self { f32::max(self, other) }
    #[inline] fn min(self, other: Self) -> Self { f32::min(self, other) }
}

impl Float for f64 {
    const ZERO: Self = 0.0;

    #[inline] fn from_f64(v: f64) -> Self { v }
    #[inline] fn from_u8(v: u8) -> Self { v as f64 }
    #[inline] fn max(self, other: Self) -> Self { f64::max(self, other) }
    #[inline] fn min(self, other: Self) -> Self { f64::min(self, other) }
}
