//! Static achievement configuration
//!
//! The achievement table is consumed once at startup and never changes at
//! runtime. Titles and descriptions are display-only pass-through.

use super::achievements::{AchievementDef, DependencyRule};

/// Group names of every visitable area, used by the meta rule below
const AREA_GROUPS: [&str; 10] = [
    "projectsEnter",
    "labEnter",
    "careerEnter",
    "socialEnter",
    "cookieEnter",
    "bowlingEnter",
    "circuitEnter",
    "toiletEnter",
    "altarEnter",
    "behindTheSceneEnter",
];

/// The full achievement table, one row per tier
pub fn default_achievements() -> Vec<AchievementDef> {
    vec![
        AchievementDef::new(
            "introLeave",
            "I'm going on an adventure!",
            "Get out of the landing area.",
            1,
        ),
        AchievementDef::new("projectsEnter", "Projects", "Visit the Projects area.", 1),
        AchievementDef::new("labEnter", "Lab", "Visit the Lab area.", 1),
        AchievementDef::new("careerEnter", "Career", "Visit the Career area.", 1),
        AchievementDef::new("socialEnter", "Social", "Visit the Social area.", 1),
        AchievementDef::new("cookieEnter", "Cookie", "Visit the Cookie area.", 1),
        AchievementDef::new("bowlingEnter", "Bowling", "Visit the Bowling area.", 1),
        AchievementDef::new("circuitEnter", "Circuit", "Visit the Circuit area.", 1),
        AchievementDef::new("toiletEnter", "Toilet", "Visit the Toilet area.", 1),
        AchievementDef::new("altarEnter", "Altar", "Visit the Altar area.", 1),
        AchievementDef::new(
            "behindTheSceneEnter",
            "Behind The Scene",
            "Visit the Behind The Scene area.",
            1,
        ),
        AchievementDef::new("allEnter", "Traveler", "Visit all areas.", 1),
        AchievementDef::new("cookie", "Wake & bake", "Accept 1 cookies.", 1),
        AchievementDef::new("cookie", "Making some dough", "Accept 10 cookies.", 10),
        AchievementDef::new("cookie", "So baked right now", "Accept 100 cookies.", 100),
        AchievementDef::new("cookie", "Cookie Clicker", "Accept 1000 cookies.", 1000),
        AchievementDef::new("sea", "Under the sea", "Go make friend with the fishes.", 1),
        AchievementDef::new("upsideDown", "Turtle", "Get upside down.", 1),
        AchievementDef::new(
            "backWheel",
            "Look mom! No hand!",
            "Do a back wheel for 5s.",
            1,
        ),
        AchievementDef::new(
            "frontFlip",
            "Teeth first",
            "Do a front flip and land on your 4 wheels.",
            1,
        ),
        AchievementDef::new(
            "backFlip",
            "Flip of faith",
            "Do a back flip and land on your 4 wheels.",
            1,
        ),
        AchievementDef::new("suspensions", "Lowrider", "Use the vehicle suspensions.", 4),
        AchievementDef::new(
            "explosiveCrates",
            "Great Explosion Murder God Dynamight",
            "Blow up every explosive crate.",
            20,
        )
        .unique(),
    ]
}

/// Default meta-achievement rules: visiting every area credits `allEnter`
pub fn default_dependencies() -> Vec<DependencyRule> {
    vec![DependencyRule {
        target_group: "allEnter".to_string(),
        requires: AREA_GROUPS
            .iter()
            .map(|group| (group.to_string(), 0))
            .collect(),
    }]
}
