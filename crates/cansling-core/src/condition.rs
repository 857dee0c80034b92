//! Level goal predicates.
//!
//! Conditions are plain data evaluated against a snapshot of the live cans.
//! Evaluation has no side effects and may run any number of times per tick.

use serde::{Deserialize, Serialize};

use crate::physics::ObjectTransform;

/// A boolean predicate over the heights of the live cans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Every can is below `threshold`. Holds for an empty set.
    AllBelowHeight { threshold: f32 },
    /// At most `max_count` cans are below `threshold`.
    CountBelowHeight { threshold: f32, max_count: usize },
    /// The highest can reaches at least `threshold`. Fails for an empty set.
    MaxHeightAtLeast { threshold: f32 },
    /// At least `min_count` cans are above `threshold`.
    CountAboveHeight { threshold: f32, min_count: usize },
}

impl Condition {
    /// Evaluates the predicate against the live cans.
    pub fn evaluate(&self, objects: &[ObjectTransform]) -> bool {
        let mut heights = objects.iter().map(|o| o.position[1]);
        match *self {
            Self::AllBelowHeight { threshold } => heights.all(|y| y < threshold),
            Self::CountBelowHeight {
                threshold,
                max_count,
            } => heights.filter(|&y| y < threshold).count() <= max_count,
            Self::MaxHeightAtLeast { threshold } => heights
                .reduce(f32::max)
                .is_some_and(|max| max >= threshold),
            Self::CountAboveHeight {
                threshold,
                min_count,
            } => heights.filter(|&y| y > threshold).count() >= min_count,
        }
    }

    /// Human-readable label for the predicate.
    pub fn describe(&self) -> String {
        match *self {
            Self::AllBelowHeight { threshold } => format!("All cans below height {threshold:.0}"),
            Self::CountBelowHeight {
                threshold,
                max_count,
            } => format!("At most {max_count} cans below height {threshold:.0}"),
            Self::MaxHeightAtLeast { threshold } => {
                format!("Stack a can to height {threshold:.0}")
            }
            Self::CountAboveHeight {
                threshold,
                min_count,
            } => format!("At least {min_count} cans above height {threshold:.0}"),
        }
    }

    /// Height threshold used by the predicate.
    pub fn threshold(&self) -> f32 {
        match *self {
            Self::AllBelowHeight { threshold }
            | Self::CountBelowHeight { threshold, .. }
            | Self::MaxHeightAtLeast { threshold }
            | Self::CountAboveHeight { threshold, .. } => threshold,
        }
    }
}

/// A condition's label paired with its current result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionStatus {
    pub label: String,
    pub satisfied: bool,
}

/// Evaluates `condition` against the live cans.
pub fn evaluate(condition: &Condition, objects: &[ObjectTransform]) -> bool {
    condition.evaluate(objects)
}

/// Evaluates a condition list in order.
pub fn evaluate_all(conditions: &[Condition], objects: &[ObjectTransform]) -> Vec<ConditionStatus> {
    conditions
        .iter()
        .map(|condition| ConditionStatus {
            label: condition.describe(),
            satisfied: condition.evaluate(objects),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_heights(heights: &[f32]) -> Vec<ObjectTransform> {
        heights
            .iter()
            .map(|&y| ObjectTransform {
                position: [500.0, y],
                rotation: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_all_below_height() {
        let condition = Condition::AllBelowHeight { threshold: 100.0 };
        assert!(condition.evaluate(&at_heights(&[10.0, 50.0, 99.0])));
        assert!(!condition.evaluate(&at_heights(&[10.0, 100.0])));
        assert!(condition.evaluate(&[]));
    }

    #[test]
    fn test_count_below_height() {
        let condition = Condition::CountBelowHeight {
            threshold: 100.0,
            max_count: 2,
        };
        assert!(condition.evaluate(&at_heights(&[10.0, 50.0, 200.0])));
        assert!(!condition.evaluate(&at_heights(&[10.0, 50.0, 60.0])));
    }

    #[test]
    fn test_max_height_at_least() {
        let condition = Condition::MaxHeightAtLeast { threshold: 300.0 };
        assert!(condition.evaluate(&at_heights(&[10.0, 300.0])));
        assert!(!condition.evaluate(&at_heights(&[10.0, 299.0])));
        assert!(!condition.evaluate(&[]));
    }

    #[test]
    fn test_count_above_height() {
        let condition = Condition::CountAboveHeight {
            threshold: 100.0,
            min_count: 2,
        };
        assert!(condition.evaluate(&at_heights(&[150.0, 200.0, 10.0])));
        assert!(!condition.evaluate(&at_heights(&[150.0, 100.0])));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let objects = at_heights(&[40.0, 80.0]);
        let condition = Condition::AllBelowHeight { threshold: 60.0 };
        let first = evaluate(&condition, &objects);
        for _ in 0..5 {
            assert_eq!(evaluate(&condition, &objects), first);
        }
    }

    #[test]
    fn test_evaluate_all_keeps_order_and_labels() {
        let conditions = vec![
            Condition::MaxHeightAtLeast { threshold: 250.0 },
            Condition::AllBelowHeight { threshold: 60.0 },
        ];
        let statuses = evaluate_all(&conditions, &at_heights(&[300.0]));
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].label, "Stack a can to height 250");
        assert!(statuses[0].satisfied);
        assert!(!statuses[1].satisfied);
    }

    #[test]
    fn test_tagged_json() {
        let condition: Condition =
            serde_json::from_str(r#"{ "kind": "count_below_height", "threshold": 80, "max_count": 3 }"#)
                .unwrap();
        assert_eq!(
            condition,
            Condition::CountBelowHeight {
                threshold: 80.0,
                max_count: 3
            }
        );
    }
}
