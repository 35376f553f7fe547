// SPDX-License-Identifier: MPL-2.0

//! Integers confined to a closed range `[MIN, MAX]` fixed at compile time.
//!
//! Two ways of getting a value in are offered. [`RangedI8::new`] and the
//! `TryFrom` impls reject out-of-range input, while [`RangedI8::clamped`]
//! and [`RangedI8::saturating_add`] never fail and pin the result to the
//! nearest bound instead.
//!
//! ```
//! use ranged_int::RangedI8;
//!
//! type Prio = RangedI8<-20, 20>;
//!
//! assert_eq!(Prio::clamped(99).get(), 20);
//! assert_eq!(Prio::new(-3).saturating_add(-30).get(), -20);
//! assert!(Prio::try_from(21).is_err());
//! ```

#![no_std]
#![deny(unsafe_code)]

macro_rules! define_ranged_integer {
    ($visibility: vis, $name: ident, $type: ty) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
        $visibility struct $name<const MIN: $type, const MAX: $type>($type);

        impl<const MIN: $type, const MAX: $type> $name<MIN, MAX> {
            $visibility const MIN: $type = MIN as $type;
            $visibility const MAX: $type = MAX as $type;

            /// Creates a value, panicking if `val` is out of range.
            $visibility const fn new(val: $type) -> Self {
                assert!(val >= MIN && val <= MAX);
                Self(val)
            }

            /// Creates a value, pinning `val` to the nearest bound.
            $visibility const fn clamped(val: $type) -> Self {
                if val < MIN {
                    Self(MIN)
                } else if val > MAX {
                    Self(MAX)
                } else {
                    Self(val)
                }
            }

            $visibility const fn get(self) -> $type {
                self.0
            }

            /// Adds `delta`, pinning the sum to the nearest bound.
            $visibility const fn saturating_add(self, delta: $type) -> Self {
                Self::clamped(self.0.saturating_add(delta))
            }

            $visibility const fn is_min(self) -> bool {
                self.0 == MIN
            }
        }

        impl<const MIN: $type, const MAX: $type> From<$name<MIN, MAX>> for $type {
            fn from(value: $name<MIN, MAX>) -> Self {
                value.0
            }
        }

        impl<const MIN: $type, const MAX: $type> TryFrom<$type> for $name<MIN, MAX> {
            type Error = &'static str;

            fn try_from(value: $type) -> Result<Self, Self::Error> {
                if value < Self::MIN || value > Self::MAX {
                    Err("Initialized with out-of-range value.")
                } else {
                    Ok(Self(value))
                }
            }
        }

        impl<const MIN: $type, const MAX: $type> core::fmt::Display for $name<MIN, MAX> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_ranged_integer!(pub, RangedI8, i8);

#[cfg(test)]
mod test {
    use super::*;

    type Prio = RangedI8<-20, 20>;

    #[test]
    fn clamp_to_bounds() {
        assert_eq!(Prio::clamped(i8::MIN).get(), -20);
        assert_eq!(Prio::clamped(-21).get(), -20);
        assert_eq!(Prio::clamped(-20).get(), -20);
        assert_eq!(Prio::clamped(7).get(), 7);
        assert_eq!(Prio::clamped(20).get(), 20);
        assert_eq!(Prio::clamped(i8::MAX).get(), 20);
    }

    #[test]
    fn saturating_add_stops_at_bounds() {
        let p = Prio::new(-19);
        assert_eq!(p.saturating_add(-1).get(), -20);
        assert_eq!(p.saturating_add(-1).saturating_add(-1).get(), -20);
        assert!(p.saturating_add(-5).is_min());
        assert_eq!(Prio::new(18).saturating_add(i8::MAX).get(), 20);
    }

    #[test]
    fn try_from_rejects_out_of_range() {
        assert!(Prio::try_from(21).is_err());
        assert!(Prio::try_from(-21).is_err());
        assert_eq!(Prio::try_from(0).map(Prio::get), Ok(0));
    }

    #[test]
    #[should_panic]
    fn new_panics_out_of_range() {
        let _ = Prio::new(21);
    }

    #[test]
    fn ordering_follows_value() {
        assert!(Prio::new(-5) < Prio::new(0));
        assert!(Prio::clamped(100) > Prio::new(19));
    }
}
