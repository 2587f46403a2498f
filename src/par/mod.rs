//! Threading backends for the parallel builders.
//!
//! The scheduler is a value owned by whatever runs the build (see
//! [`crate::tlas::Tlas::scheduler`]), so distinct structures can build
//! concurrently with different backends and nothing is process-global.

use std::str::FromStr;

pub mod par_rayon;
pub mod par_sequential;

#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum Scheduler {
    Sequential,
    #[default]
    Rayon,
}

impl FromStr for Scheduler {
    type Err = String;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seq" => Ok(Self::Sequential),
            "rayon" => Ok(Self::Rayon),
            _ => Err(format!("Unknown mode: '{s}', valid modes: 'seq', 'rayon'")),
        }
    }
}

impl Scheduler {
    #[inline(always)]
    pub fn par_map<T, F>(self, data: &mut [T], func: &F)
    where
        T: Send + Sync,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        match self {
            Scheduler::Sequential => par_sequential::par_map(data, func),
            Scheduler::Rayon => par_rayon::par_map(data, func),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn par_map_visits_every_item_once() {
        for scheduler in [Scheduler::Sequential, Scheduler::Rayon] {
            for data_len in 1..24 {
                let mut data = vec![0u32; data_len];
                let func = |index: usize, item: &mut u32| {
                    *item += index as u32 + 1;
                };
                scheduler.par_map(&mut data, &func);
                for (i, item) in data.iter().enumerate() {
                    assert_eq!(*item as usize, i + 1);
                }
            }
        }
    }
}
