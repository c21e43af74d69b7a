//! Search relevance weights.
//!
//! Scores are additive integers. Object matches get a bonus depending on
//! the object's priority; page matches take the best score over the terms
//! they matched.

use serde::{Deserialize, Serialize};

/// Ranking weights for the object and term passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scorer {
    /// Query equals the full object name or its last component.
    pub obj_name_match: i32,
    /// Query is contained in the last component of the object name.
    pub obj_partial_match: i32,
    /// Bonus for priority 0 objects.
    pub obj_prio_important: i32,
    /// Bonus for priority 1 objects.
    pub obj_prio_default: i32,
    /// Bonus for priority 2 objects.
    pub obj_prio_unimportant: i32,
    /// Bonus for any other priority.
    pub obj_prio_other: i32,
    /// Exact title term match.
    pub title: i32,
    /// Partial title term match.
    pub partial_title: i32,
    /// Exact body term match.
    pub term: i32,
    /// Partial body term match.
    pub partial_term: i32,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            obj_name_match: 11,
            obj_partial_match: 6,
            obj_prio_important: 15,
            obj_prio_default: 5,
            obj_prio_unimportant: -5,
            obj_prio_other: 0,
            title: 15,
            partial_title: 7,
            term: 5,
            partial_term: 2,
        }
    }
}

impl Scorer {
    pub const fn priority_bonus(&self, priority: i32) -> i32 {
        match priority {
            0 => self.obj_prio_important,
            1 => self.obj_prio_default,
            2 => self.obj_prio_unimportant,
            _ => self.obj_prio_other,
        }
    }

    /// Score an object name against a single lowercased object term.
    ///
    /// Returns `None` when the term does not occur in the name at all.
    pub fn object_name_score(&self, fullname_lower: &str, term: &str) -> Option<i32> {
        if !fullname_lower.contains(term) {
            return None;
        }
        let last = fullname_lower.rsplit('.').next().unwrap_or(fullname_lower);
        if fullname_lower == term || last == term {
            Some(self.obj_name_match)
        } else if last.contains(term) {
            Some(self.obj_partial_match)
        } else {
            Some(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("ccc.calcfunctions.eq_coc", "eq_coc", Some(11))]
    #[case("ccc.calcfunctions.eq_coc", "ccc.calcfunctions.eq_coc", Some(11))]
    #[case("ccc.calcfunctions.eq_coc_inventory", "eq_coc", Some(6))]
    #[case("ccc.calcfunctions.eq_coc", "calcfunctions", Some(0))]
    #[case("ccc.calcfunctions.eq_coc", "wavg", None)]
    fn test_object_name_score(
        #[case] fullname: &str,
        #[case] term: &str,
        #[case] expected: Option<i32>,
    ) {
        check!(Scorer::default().object_name_score(fullname, term) == expected);
    }

    #[rstest]
    #[case(0, 15)]
    #[case(1, 5)]
    #[case(2, -5)]
    #[case(7, 0)]
    fn test_priority_bonus(#[case] priority: i32, #[case] expected: i32) {
        check!(Scorer::default().priority_bonus(priority) == expected);
    }

    #[test]
    fn test_partial_weights_from_toml() {
        let scorer: Scorer = toml::from_str("title = 20\nterm = 3").unwrap();
        check!(scorer.title == 20);
        check!(scorer.term == 3);
        check!(scorer.obj_name_match == 11);
    }
}
