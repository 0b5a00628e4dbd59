use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::Serialize;

use crate::board::State;

/// Lower bound on the number of moves left to reach the goal.
///
/// The solver only returns optimal paths when the estimate never exceeds
/// the true remaining distance.
pub trait Heuristic {
    fn estimate(&self, state: &State) -> u32;
}

impl<F> Heuristic for F
where
    F: Fn(&State) -> u32,
{
    fn estimate(&self, state: &State) -> u32 {
        self(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinHeuristic {
    /// Misplaced tile count.
    Hamming,
    /// Summed grid distance of every tile to its goal cell.
    Manhattan,
}

impl BuiltinHeuristic {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinHeuristic::Hamming => "hamming",
            BuiltinHeuristic::Manhattan => "manhattan",
        }
    }
}

impl Heuristic for BuiltinHeuristic {
    fn estimate(&self, state: &State) -> u32 {
        match self {
            BuiltinHeuristic::Hamming => state.hamming_cost(),
            BuiltinHeuristic::Manhattan => state.manhattan_cost(),
        }
    }
}

impl Display for BuiltinHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown heuristic `{0}`, expected `hamming` or `manhattan`")]
pub struct UnknownHeuristic(String);

impl FromStr for BuiltinHeuristic {
    type Err = UnknownHeuristic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hamming" => Ok(BuiltinHeuristic::Hamming),
            "manhattan" => Ok(BuiltinHeuristic::Manhattan),
            _ => Err(UnknownHeuristic(s.to_string())),
        }
    }
}

/// Which heuristics a run should compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicChoice {
    Single(BuiltinHeuristic),
    Both,
}

impl HeuristicChoice {
    #[auto_enums::auto_enum(Iterator)]
    pub fn heuristics(self) -> impl Iterator<Item = BuiltinHeuristic> {
        match self {
            HeuristicChoice::Single(h) => std::iter::once(h),
            HeuristicChoice::Both => {
                [BuiltinHeuristic::Manhattan, BuiltinHeuristic::Hamming].into_iter()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use super::*;
    use crate::board::parse_board;

    #[test]
    fn builtins_delegate_to_state() {
        let s = parse_board("8 1 2\n_ 4 3\n7 6 5").unwrap();
        assert_eq!(BuiltinHeuristic::Hamming.estimate(&s), s.hamming_cost());
        assert_eq!(BuiltinHeuristic::Manhattan.estimate(&s), s.manhattan_cost());
    }

    #[test]
    fn closures_are_heuristics() {
        let s = parse_board("_ 1\n2 3").unwrap();
        let zero = |_: &State| 0u32;
        assert_eq!(zero.estimate(&s), 0);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Manhattan".parse(), Ok(BuiltinHeuristic::Manhattan));
        assert_eq!("hamming".parse(), Ok(BuiltinHeuristic::Hamming));
        assert!("euclid".parse::<BuiltinHeuristic>().is_err());
        assert_eq!(BuiltinHeuristic::Hamming.to_string(), "hamming");
    }

    #[test]
    fn choice_order() {
        assert_eq!(
            HeuristicChoice::Both.heuristics().collect_vec(),
            vec![BuiltinHeuristic::Manhattan, BuiltinHeuristic::Hamming]
        );
        assert_eq!(
            HeuristicChoice::Single(BuiltinHeuristic::Hamming)
                .heuristics()
                .collect_vec(),
            vec![BuiltinHeuristic::Hamming]
        );
    }
}
