//! Default catalog of workout plans.
//!
//! Plans are static; a session copies the descriptive fields of the chosen
//! plan into its log as a [`WorkoutPlanSnapshot`].

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Ordered list of workout plans
#[derive(Clone, Debug)]
pub struct Catalog {
    pub plans: Vec<WorkoutPlan>,
}

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Look up a plan in the default catalog by id
pub fn find_plan(id: &str) -> Option<&'static WorkoutPlan> {
    default_catalog().plans.iter().find(|p| p.id == id)
}

fn plan(
    id: &str,
    title: &str,
    description: &str,
    difficulty: &str,
    duration: &str,
    color: &str,
    exercises: &[&str],
) -> WorkoutPlan {
    WorkoutPlan {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        difficulty: difficulty.into(),
        duration: duration.into(),
        color: color.into(),
        exercises: exercises.iter().map(|e| e.to_string()).collect(),
    }
}

/// Builds the default catalog in display order
pub fn build_default_catalog() -> Catalog {
    Catalog {
        plans: vec![
            plan(
                "beginner_full_body",
                "Beginner Full Body",
                "Perfect for those just starting their fitness journey",
                "Beginner",
                "30 minutes",
                "purple",
                &[
                    "Push-ups (3 sets)",
                    "Squats (3 sets)",
                    "Plank (30 sec)",
                    "Lunges (2 sets)",
                ],
            ),
            plan(
                "cardio_blast",
                "Cardio Blast",
                "High-intensity cardio workout to boost your heart rate",
                "Intermediate",
                "45 minutes",
                "pink",
                &[
                    "Jumping Jacks (5 sets)",
                    "Burpees (3 sets)",
                    "Mountain Climbers (3 sets)",
                    "High Knees (3 sets)",
                ],
            ),
            plan(
                "strength_builder",
                "Strength Builder",
                "Build muscle and increase strength with this plan",
                "Advanced",
                "60 minutes",
                "blue",
                &[
                    "Deadlifts (4 sets)",
                    "Bench Press (4 sets)",
                    "Pull-ups (3 sets)",
                    "Leg Press (4 sets)",
                ],
            ),
        ],
    }
}

impl Catalog {
    /// Validate plan ids and contents, returning every problem found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for plan in &self.plans {
            if !seen.insert(plan.id.as_str()) {
                errors.push(format!("Duplicate plan id: {}", plan.id));
            }
            if plan.title.trim().is_empty() {
                errors.push(format!("Plan {} has an empty title", plan.id));
            }
            if plan.exercises.is_empty() {
                errors.push(format!("Plan {} has no exercises", plan.id));
            }
        }

        errors
    }
}

impl WorkoutPlan {
    /// Copy the descriptive fields captured into a log at session start
    pub fn snapshot(&self) -> WorkoutPlanSnapshot {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        WorkoutPlanSnapshot {
            title: self.title.clone(),
            description: non_empty(&self.description),
            difficulty: non_empty(&self.difficulty),
            duration_label: non_empty(&self.duration),
            color: non_empty(&self.color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_catalog_order_is_stable() {
        let ids: Vec<_> = default_catalog().plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["beginner_full_body", "cardio_blast", "strength_builder"]);
    }

    #[test]
    fn test_find_plan() {
        let plan = find_plan("cardio_blast").unwrap();
        assert_eq!(plan.exercises.len(), 4);
        assert!(find_plan("yoga").is_none());
    }

    #[test]
    fn test_snapshot_copies_descriptive_fields() {
        let snapshot = find_plan("strength_builder").unwrap().snapshot();
        assert_eq!(snapshot.title, "Strength Builder");
        assert_eq!(snapshot.difficulty.as_deref(), Some("Advanced"));
        assert_eq!(snapshot.duration_label.as_deref(), Some("60 minutes"));
        assert_eq!(snapshot.color.as_deref(), Some("blue"));
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut catalog = build_default_catalog();
        catalog.plans.push(catalog.plans[0].clone());
        catalog.plans[1].exercises.clear();

        let errors = catalog.validate();
        assert_eq!(errors.len(), 2);
    }
}
