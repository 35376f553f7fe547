// SPDX-License-Identifier: MPL-2.0

use ranged_int::RangedI8;

/// The scheduling priority of a task.
///
/// It is an integer in the range of [-20, 20]. A task with a smaller value
/// is more urgent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Priority(PriorityRange);

pub type PriorityRange = RangedI8<-20, 20>;

impl Priority {
    pub const MOST_URGENT: Self = Self::new(PriorityRange::new(PriorityRange::MIN));
    pub const LEAST_URGENT: Self = Self::new(PriorityRange::new(PriorityRange::MAX));
    pub const DEFAULT: Self = Self::new(PriorityRange::new(0));

    pub const fn new(range: PriorityRange) -> Self {
        Self(range)
    }

    /// Converts any integer to a priority, pinning it to the valid range.
    pub fn clamped(value: i32) -> Self {
        let value = value.clamp(
            i32::from(PriorityRange::MIN),
            i32::from(PriorityRange::MAX),
        );
        // The clamp above keeps `value` within `i8`.
        Self::new(PriorityRange::clamped(value as i8))
    }

    pub const fn get(self) -> i8 {
        self.0.get()
    }

    /// Returns this priority made more urgent by `step`, stopping at
    /// [`Self::MOST_URGENT`].
    pub fn aged(self, step: i8) -> Self {
        Self(self.0.saturating_add(step.saturating_abs().saturating_neg()))
    }

    pub const fn is_most_urgent(self) -> bool {
        self.0.is_min()
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Priority> for i8 {
    fn from(value: Priority) -> Self {
        value.0.into()
    }
}

impl From<Priority> for i32 {
    fn from(value: Priority) -> Self {
        i32::from(value.get())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamp_any_integer() {
        for p in [i32::MIN, -1000, -21, -20, -7, 0, 13, 20, 21, 1000, i32::MAX] {
            assert_eq!(i32::from(Priority::clamped(p)), p.clamp(-20, 20));
        }
    }

    #[test]
    fn aging_moves_toward_most_urgent() {
        assert_eq!(Priority::clamped(5).aged(1).get(), 4);
        assert_eq!(Priority::clamped(5).aged(-1).get(), 4);
        assert_eq!(Priority::clamped(-19).aged(3), Priority::MOST_URGENT);
        assert!(Priority::MOST_URGENT.aged(1).is_most_urgent());
        assert_eq!(Priority::clamped(0).aged(0).get(), 0);
    }

    #[test]
    fn smaller_is_more_urgent() {
        assert!(Priority::MOST_URGENT < Priority::default());
        assert!(Priority::default() < Priority::LEAST_URGENT);
    }
}
