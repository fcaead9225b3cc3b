//! Numerations
//!
//! A [`Numeration`] attaches an integer to objects, e.g. a DFS or
//! topological order computed by a pass. It is recycled the same way as a
//! [`Marker`](crate::core::marker::Marker): the stamp area of every object
//! records the generation the number was set for, so numbers left by a freed
//! numeration read as [`NUMBER_NO_NUM`].

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::core::marker::Generations;

/// The number type of numerations.
pub type GraphNum = u32;

/// The number of an object that is not numbered.
pub const NUMBER_NO_NUM: GraphNum = GraphNum::MAX;

/// Index of a numeration in the stamp area.
pub type NumIndex = u8;

/// The generation value of a numeration.
pub type NumValue = u16;

/// The maximum number of numerations in use at the same time.
pub const MAX_NUMERATIONS: usize = 10;

/// The stamp of an object that is not numbered.
pub const NUM_CLEAN: NumValue = 0;

/// Errors of numerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NumError {
    /// All numeration indices are in use.
    #[error("all {} numerations are in use", MAX_NUMERATIONS)]
    OutOfIndexes,
    /// The number is negative, too large or the reserved [`NUMBER_NO_NUM`].
    #[error("number is out of range")]
    NumberOutOfRange,
}

/// A numeration handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Numeration {
    owner: u32,
    index: NumIndex,
    value: NumValue,
}

impl Numeration {
    /// The index of the numeration.
    pub fn index(self) -> NumIndex { self.index }

    /// The generation value of the numeration.
    pub fn value(self) -> NumValue { self.value }
}

/// The manager of numeration handles, owned by a [`NumHost`].
#[derive(Debug, Clone, Default)]
pub struct NumManager {
    generations: Generations<MAX_NUMERATIONS>,
}

impl NumManager {
    /// Create a manager with no numeration in use.
    pub fn new() -> Self { Self::default() }

    /// Check if the numeration is in use.
    pub fn is_live(&self, num: Numeration) -> bool {
        self.generations
            .is_live(num.owner, num.index as usize, num.value)
    }

    /// Number of numerations in use.
    pub fn num_live(&self) -> usize { self.generations.num_live() }

    #[cfg(test)]
    pub(crate) fn generations_mut(&mut self) -> &mut Generations<MAX_NUMERATIONS> {
        &mut self.generations
    }
}

/// The numeration stamps and numbers of an object.
#[derive(Debug, Clone)]
pub struct Numbered {
    stamps: [NumValue; MAX_NUMERATIONS],
    numbers: [GraphNum; MAX_NUMERATIONS],
}

impl Default for Numbered {
    fn default() -> Self {
        Self {
            stamps: [NUM_CLEAN; MAX_NUMERATIONS],
            numbers: [NUMBER_NO_NUM; MAX_NUMERATIONS],
        }
    }
}

impl Numbered {
    /// Set the number of the object in a numeration.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The number is set.
    /// - `Err(NumError::NumberOutOfRange)`: The value is not a valid
    ///   [`GraphNum`]. The object is left unchanged.
    pub fn set_number<V>(&mut self, num: Numeration, value: V) -> Result<(), NumError>
    where
        V: TryInto<GraphNum>,
    {
        let value = value
            .try_into()
            .map_err(|_| NumError::NumberOutOfRange)?;
        if value == NUMBER_NO_NUM {
            return Err(NumError::NumberOutOfRange);
        }
        self.stamps[num.index as usize] = num.value;
        self.numbers[num.index as usize] = value;
        Ok(())
    }

    /// Get the number of the object, or [`NUMBER_NO_NUM`].
    pub fn number(&self, num: Numeration) -> GraphNum {
        if self.is_numbered(num) {
            self.numbers[num.index as usize]
        } else {
            NUMBER_NO_NUM
        }
    }

    /// Remove the number of the object.
    ///
    /// # Returns
    ///
    /// `true` if the object was numbered before.
    pub fn unnumber(&mut self, num: Numeration) -> bool {
        let numbered = self.is_numbered(num);
        if numbered {
            self.stamps[num.index as usize] = NUM_CLEAN;
            self.numbers[num.index as usize] = NUMBER_NO_NUM;
        }
        numbered
    }

    /// Check if the object has a number in the numeration.
    pub fn is_numbered(&self, num: Numeration) -> bool {
        self.stamps[num.index as usize] == num.value
    }

    /// Scrub the stamps and numbers of the indices that are not in use.
    pub fn clear_unused(&mut self, manager: &NumManager) {
        for index in 0..MAX_NUMERATIONS {
            if !manager.generations.in_use(index) {
                self.stamps[index] = NUM_CLEAN;
                self.numbers[index] = NUMBER_NO_NUM;
            }
        }
    }
}

/// A container that hands out numerations for the objects it owns.
pub trait NumHost {
    /// The numeration manager of the host.
    fn num_manager(&self) -> &NumManager;

    /// The numeration manager of the host, mutably.
    fn num_manager_mut(&mut self) -> &mut NumManager;

    /// Call [`Numbered::clear_unused`] on every object of the host.
    fn clear_nums_in_objects(&mut self);

    /// Grant a new numeration. No object of the host is numbered in it.
    fn new_num(&mut self) -> Result<Numeration, NumError> {
        let Some(index) = self.num_manager().generations.free_index() else {
            warn!(max = MAX_NUMERATIONS, "out of numeration indices");
            return Err(NumError::OutOfIndexes);
        };
        if self.num_manager().generations.exhausted(index) {
            debug!(index, "numeration values exhausted, sweeping objects");
            self.clear_nums_in_objects();
            self.num_manager_mut().generations.restart();
        }
        let generations = &mut self.num_manager_mut().generations;
        let value = generations.grant(index);
        trace!(index, value, "new numeration");
        Ok(Numeration {
            owner: generations.owner(),
            index: index as NumIndex,
            value,
        })
    }

    /// Give a numeration back to the host.
    ///
    /// # Panics
    ///
    /// Panics if the numeration is not in use.
    fn free_num(&mut self, num: Numeration) {
        trace!(index = num.index, value = num.value, "free numeration");
        self.num_manager_mut()
            .generations
            .release(num.owner, num.index as usize, num.value);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Host {
        manager: NumManager,
        objects: Vec<Numbered>,
    }

    impl NumHost for Host {
        fn num_manager(&self) -> &NumManager { &self.manager }

        fn num_manager_mut(&mut self) -> &mut NumManager { &mut self.manager }

        fn clear_nums_in_objects(&mut self) {
            for object in self.objects.iter_mut() {
                object.clear_unused(&self.manager);
            }
        }
    }

    #[test]
    fn test_set_number() {
        let mut host = Host::default();
        host.objects.push(Numbered::default());
        let n = host.new_num().unwrap();
        assert_eq!(host.objects[0].number(n), NUMBER_NO_NUM);
        assert!(!host.objects[0].is_numbered(n));

        host.objects[0].set_number(n, 7u32).unwrap();
        assert_eq!(host.objects[0].number(n), 7);
        assert!(host.objects[0].is_numbered(n));

        host.objects[0].set_number(n, 0).unwrap();
        assert_eq!(host.objects[0].number(n), 0);

        assert!(host.objects[0].unnumber(n));
        assert!(!host.objects[0].unnumber(n));
        assert_eq!(host.objects[0].number(n), NUMBER_NO_NUM);
        host.free_num(n);
    }

    #[test]
    fn test_number_out_of_range() {
        let mut host = Host::default();
        host.objects.push(Numbered::default());
        let n = host.new_num().unwrap();
        host.objects[0].set_number(n, 3).unwrap();

        assert_eq!(
            host.objects[0].set_number(n, -1),
            Err(NumError::NumberOutOfRange)
        );
        assert_eq!(
            host.objects[0].set_number(n, NUMBER_NO_NUM),
            Err(NumError::NumberOutOfRange)
        );
        assert_eq!(
            host.objects[0].set_number(n, u64::MAX),
            Err(NumError::NumberOutOfRange)
        );
        // failed updates keep the old number
        assert_eq!(host.objects[0].number(n), 3);
    }

    #[test]
    fn test_numerations_independent() {
        let mut host = Host::default();
        host.objects.push(Numbered::default());
        let n1 = host.new_num().unwrap();
        let n2 = host.new_num().unwrap();
        host.objects[0].set_number(n1, 1).unwrap();
        host.objects[0].set_number(n2, 2).unwrap();
        assert_eq!(host.objects[0].number(n1), 1);
        assert_eq!(host.objects[0].number(n2), 2);
        host.objects[0].unnumber(n1);
        assert_eq!(host.objects[0].number(n2), 2);
    }

    #[test]
    fn test_reuse_and_exhaustion() {
        let mut host = Host::default();
        host.objects.push(Numbered::default());
        let nums = (0..MAX_NUMERATIONS)
            .map(|_| host.new_num().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(host.new_num(), Err(NumError::OutOfIndexes));

        host.objects[0].set_number(nums[4], 44).unwrap();
        host.free_num(nums[4]);
        let n = host.new_num().unwrap();
        assert_eq!(n.index(), 4);
        assert_eq!(host.objects[0].number(n), NUMBER_NO_NUM);
    }

    #[test]
    fn test_sweep_on_wrap() {
        let mut host = Host::default();
        host.objects.push(Numbered::default());
        host.manager.generations_mut().fast_forward(0, NumValue::MAX - 1);

        let old = host.new_num().unwrap();
        host.objects[0].set_number(old, 9).unwrap();
        host.free_num(old);

        let new = host.new_num().unwrap();
        assert_eq!(new.value(), NUM_CLEAN + 1);
        assert!(!host.objects[0].is_numbered(new));
        assert_eq!(host.objects[0].number(new), NUMBER_NO_NUM);
    }
}
