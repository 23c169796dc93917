//! Turn order — who speaks next.
//!
//! Built-in policies are a closed enum; anything else plugs in through
//! [`TurnSelector`]. A policy is resolved into a selector when a session
//! starts, so the same environment can run with different policies.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roleplay_core::error::StateError;

/// Chooses the next speaker.
pub trait TurnSelector: Send {
    /// Index into `names` (registration order) of the next speaker.
    ///
    /// `previous` is the index of the last speaker this session, if any.
    /// Out-of-range answers wrap around.
    fn next_speaker(&mut self, names: &[String], previous: Option<usize>) -> usize;
}

/// How speakers are scheduled for one run.
#[derive(Default)]
pub enum TurnOrderPolicy {
    /// Registration order, cycling
    #[default]
    RoundRobin,
    /// Uniform choice that never repeats the previous speaker (unless alone)
    Random { seed: Option<u64> },
    /// Caller-supplied names consumed in order, cycling
    ExplicitSequence(Vec<String>),
    Custom(Box<dyn TurnSelector>),
}

impl std::fmt::Debug for TurnOrderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => f.write_str("RoundRobin"),
            Self::Random { seed } => f.debug_struct("Random").field("seed", seed).finish(),
            Self::ExplicitSequence(names) => {
                f.debug_tuple("ExplicitSequence").field(names).finish()
            }
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl TurnOrderPolicy {
    /// Validate against the registered names and build the selector.
    pub fn into_selector(self, names: &[String]) -> Result<Box<dyn TurnSelector>, StateError> {
        match self {
            Self::RoundRobin => Ok(Box::new(RoundRobin)),
            Self::Random { seed } => Ok(Box::new(RandomNoRepeat::new(seed))),
            Self::ExplicitSequence(sequence) => {
                if sequence.is_empty() {
                    return Err(StateError::EmptySequence);
                }
                let indices = sequence
                    .iter()
                    .map(|wanted| {
                        names
                            .iter()
                            .position(|n| n == wanted)
                            .ok_or_else(|| StateError::UnknownAgent(wanted.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(Sequence { indices, cursor: 0 }))
            }
            Self::Custom(selector) => Ok(selector),
        }
    }
}

struct RoundRobin;

impl TurnSelector for RoundRobin {
    fn next_speaker(&mut self, names: &[String], previous: Option<usize>) -> usize {
        match previous {
            Some(prev) => (prev + 1) % names.len(),
            None => 0,
        }
    }
}

struct RandomNoRepeat {
    rng: StdRng,
}

impl RandomNoRepeat {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self { rng }
    }
}

impl TurnSelector for RandomNoRepeat {
    fn next_speaker(&mut self, names: &[String], previous: Option<usize>) -> usize {
        let n = names.len();
        match previous {
            _ if n <= 1 => 0,
            Some(prev) if prev < n => {
                // draw from the n - 1 others, skipping over `prev`
                let pick = self.rng.random_range(0..n - 1);
                if pick >= prev { pick + 1 } else { pick }
            }
            _ => self.rng.random_range(0..n),
        }
    }
}

struct Sequence {
    indices: Vec<usize>,
    cursor: usize,
}

impl TurnSelector for Sequence {
    fn next_speaker(&mut self, _names: &[String], _previous: Option<usize>) -> usize {
        let index = self.indices[self.cursor % self.indices.len()];
        self.cursor += 1;
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("agent-{i}")).collect()
    }

    fn drive(selector: &mut dyn TurnSelector, names: &[String], turns: usize) -> Vec<usize> {
        let mut previous = None;
        let mut out = Vec::new();
        for _ in 0..turns {
            let next = selector.next_speaker(names, previous) % names.len();
            out.push(next);
            previous = Some(next);
        }
        out
    }

    #[test]
    fn round_robin_cycles_registration_order() {
        let names = names(3);
        let mut selector = TurnOrderPolicy::RoundRobin.into_selector(&names).unwrap();
        assert_eq!(drive(selector.as_mut(), &names, 7), vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn random_never_repeats_with_two_or_more() {
        for n in 2..5 {
            let names = names(n);
            let mut selector = TurnOrderPolicy::Random { seed: Some(7) }
                .into_selector(&names)
                .unwrap();
            let order = drive(selector.as_mut(), &names, 200);
            assert!(order.windows(2).all(|w| w[0] != w[1]));
            assert!(order.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn random_with_one_agent_repeats() {
        let names = names(1);
        let mut selector = TurnOrderPolicy::Random { seed: None }.into_selector(&names).unwrap();
        assert_eq!(drive(selector.as_mut(), &names, 3), vec![0, 0, 0]);
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let names = names(4);
        let mut a = TurnOrderPolicy::Random { seed: Some(42) }.into_selector(&names).unwrap();
        let mut b = TurnOrderPolicy::Random { seed: Some(42) }.into_selector(&names).unwrap();
        assert_eq!(drive(a.as_mut(), &names, 30), drive(b.as_mut(), &names, 30));
    }

    #[test]
    fn random_reaches_every_agent() {
        let names = names(3);
        let mut selector = TurnOrderPolicy::Random { seed: Some(1) }.into_selector(&names).unwrap();
        let order = drive(selector.as_mut(), &names, 60);
        for i in 0..3 {
            assert!(order.contains(&i));
        }
    }

    #[test]
    fn explicit_sequence_cycles() {
        let names = names(3);
        let policy = TurnOrderPolicy::ExplicitSequence(vec!["agent-2".into(), "agent-0".into()]);
        let mut selector = policy.into_selector(&names).unwrap();
        assert_eq!(drive(selector.as_mut(), &names, 5), vec![2, 0, 2, 0, 2]);
    }

    #[test]
    fn explicit_sequence_is_validated() {
        let names = names(2);
        assert!(matches!(
            TurnOrderPolicy::ExplicitSequence(vec![]).into_selector(&names),
            Err(StateError::EmptySequence)
        ));
        assert!(matches!(
            TurnOrderPolicy::ExplicitSequence(vec!["ghost".into()]).into_selector(&names),
            Err(StateError::UnknownAgent(name)) if name == "ghost"
        ));
    }

    #[test]
    fn custom_selector_is_used() {
        struct AlwaysLast;
        impl TurnSelector for AlwaysLast {
            fn next_speaker(&mut self, names: &[String], _previous: Option<usize>) -> usize {
                names.len() - 1
            }
        }

        let names = names(3);
        let mut selector = TurnOrderPolicy::Custom(Box::new(AlwaysLast))
            .into_selector(&names)
            .unwrap();
        assert_eq!(drive(selector.as_mut(), &names, 2), vec![2, 2]);
    }
}
