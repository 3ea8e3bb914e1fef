//! Structural and semantic validation of tournament configs.
//!
//! Validation never stops at the first problem: operators reviewing a migration
//! need every violation, so each check appends to the report and moves on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use super::models::{
    Band, Division, GenderPolicy, LeaderboardStage, Meta, ParticipantType, RoundRobinStage, Stage,
    SwissStage, Tiebreaker, TournamentConfig,
};

/// Outcome of validating a config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Errors joined for single-line reporting
    pub fn joined(&self) -> String {
        self.errors.join(", ")
    }
}

/// Validate a typed config against the semantic invariants
pub fn validate(config: &TournamentConfig) -> ValidationReport {
    let mut errors = Vec::new();

    check_meta(&config.meta, &mut errors);

    if config.divisions.is_empty() {
        errors.push("divisions: at least one division is required".to_string());
    }
    for (i, division) in config.divisions.iter().enumerate() {
        check_division(&format!("divisions[{i}]"), division, &mut errors);
    }

    if config.stages.is_empty() {
        errors.push("stages: at least one stage is required".to_string());
    }
    for (i, stage) in config.stages.iter().enumerate() {
        check_stage(&format!("stages[{i}]"), stage, &mut errors);
    }

    for (i, window) in config.scheduling.time_windows.iter().enumerate() {
        if window.start >= window.end {
            errors.push(format!("scheduling.timeWindows[{i}]: start must be before end"));
        }
    }

    ValidationReport::from_errors(errors)
}

/// Validate an untyped JSON config: shape first, then semantics
pub fn validate_value(value: &Value) -> ValidationReport {
    let errors = check_structure(value);
    if !errors.is_empty() {
        return ValidationReport::from_errors(errors);
    }

    match serde_json::from_value::<TournamentConfig>(value.clone()) {
        Ok(config) => validate(&config),
        Err(e) => ValidationReport::from_errors(vec![format!("config: {e}")]),
    }
}

/// Shape checks on raw JSON: required sections, recognized enum values and
/// engine-specific required fields.
pub fn check_structure(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(root) = value.as_object() else {
        return vec!["config: must be an object".to_string()];
    };

    match root.get("meta").and_then(Value::as_object) {
        None => errors.push("meta: section is required".to_string()),
        Some(meta) => {
            if !meta.get("name").is_some_and(Value::is_string) {
                errors.push("meta.name: required string".to_string());
            }
            check_enum_field(
                "meta.participantType",
                meta.get("participantType"),
                &ParticipantType::ALL,
                &mut errors,
            );
            if !meta.get("participantCount").is_some_and(Value::is_u64) {
                errors.push("meta.participantCount: required non-negative integer".to_string());
            }
        }
    }

    match root.get("divisions").and_then(Value::as_array) {
        None => errors.push("divisions: section is required".to_string()),
        Some(divisions) if divisions.is_empty() => {
            errors.push("divisions: at least one division is required".to_string())
        }
        Some(divisions) => {
            for (i, division) in divisions.iter().enumerate() {
                let path = format!("divisions[{i}]");
                if !division.get("name").is_some_and(Value::is_string) {
                    errors.push(format!("{path}.name: required string"));
                }
                check_enum_field(
                    &format!("{path}.genderPolicy"),
                    division.get("genderPolicy"),
                    &GenderPolicy::ALL,
                    &mut errors,
                );
            }
        }
    }

    match root.get("stages").and_then(Value::as_array) {
        None => errors.push("stages: section is required".to_string()),
        Some(stages) if stages.is_empty() => {
            errors.push("stages: at least one stage is required".to_string())
        }
        Some(stages) => {
            for (i, stage) in stages.iter().enumerate() {
                check_stage_structure(&format!("stages[{i}]"), stage, &mut errors);
            }
        }
    }

    if !root
        .get("seeding")
        .and_then(|s| s.get("method"))
        .is_some_and(Value::is_string)
    {
        errors.push("seeding.method: required string".to_string());
    }

    errors
}

fn check_enum_field(path: &str, value: Option<&Value>, allowed: &[&str], errors: &mut Vec<String>) {
    match value.and_then(Value::as_str) {
        None => errors.push(format!("{path}: required")),
        Some(s) if !allowed.contains(&s) => errors.push(format!(
            "{path}: unrecognized value '{s}' (expected one of {})",
            allowed.join(", ")
        )),
        Some(_) => {}
    }
}

fn require_number(path: &str, stage: &Value, field: &str, errors: &mut Vec<String>) {
    if !stage.get(field).is_some_and(Value::is_number) {
        errors.push(format!("{path}.{field}: required number"));
    }
}

fn check_stage_structure(path: &str, stage: &Value, errors: &mut Vec<String>) {
    let engine = stage.get("engine").and_then(Value::as_str);
    check_enum_field(
        &format!("{path}.engine"),
        stage.get("engine"),
        &Stage::ENGINES,
        errors,
    );

    match engine {
        Some("single") => require_number(path, stage, "size", errors),
        Some("double") => {
            require_number(path, stage, "size", errors);
            check_enum_field(
                &format!("{path}.finals"),
                stage.get("finals"),
                &["single", "if_necessary"],
                errors,
            );
        }
        Some("round_robin") => {
            require_number(path, stage, "groups", errors);
            require_number(path, stage, "groupSize", errors);
            match stage.get("points") {
                Some(points) => {
                    for field in ["win", "draw", "loss"] {
                        if !points.get(field).is_some_and(Value::is_number) {
                            errors.push(format!("{path}.points.{field}: required number"));
                        }
                    }
                }
                None => errors.push(format!("{path}.points: required")),
            }
        }
        Some("swiss") => {
            require_number(path, stage, "rounds", errors);
            check_enum_field(
                &format!("{path}.pairing"),
                stage.get("pairing"),
                &["seed", "adjacent"],
                errors,
            );
        }
        Some("leaderboard") => match stage.get("events").and_then(Value::as_array) {
            None => errors.push(format!("{path}.events: required")),
            Some(events) if events.is_empty() => {
                errors.push(format!("{path}.events: at least one event is required"))
            }
            Some(events) => {
                for (j, event) in events.iter().enumerate() {
                    check_enum_field(
                        &format!("{path}.events[{j}].measureType"),
                        event.get("measureType"),
                        &["time", "score"],
                        errors,
                    );
                    if !event.get("unit").is_some_and(Value::is_string) {
                        errors.push(format!("{path}.events[{j}].unit: required string"));
                    }
                }
            }
        },
        _ => {}
    }
}

fn check_meta(meta: &Meta, errors: &mut Vec<String>) {
    if meta.name.trim().is_empty() {
        errors.push("meta.name: must not be empty".to_string());
    }
    if meta.participant_count < 2 {
        errors.push("meta.participantCount: must be at least 2".to_string());
    }
    match (meta.participant_type, meta.team_size) {
        (ParticipantType::Team, None) => {
            errors.push("meta.teamSize: required for team competitions".to_string())
        }
        (ParticipantType::Team, Some(size)) if size < 2 => {
            errors.push("meta.teamSize: team competitions need at least 2 per team".to_string())
        }
        (ParticipantType::Individual, Some(size)) if size > 1 => errors.push(
            "meta.teamSize: individual competitions cannot have a team size above 1".to_string(),
        ),
        _ => {}
    }
}

fn check_band(path: &str, band: &Band, errors: &mut Vec<String>) {
    if let (Some(min), Some(max)) = (band.min, band.max)
        && min > max
    {
        errors.push(format!("{path}: min {min} exceeds max {max}"));
    }
}

fn check_division(path: &str, division: &Division, errors: &mut Vec<String>) {
    if division.name.trim().is_empty() {
        errors.push(format!("{path}.name: must not be empty"));
    }
    if let Some(band) = &division.eligibility.age_band {
        check_band(&format!("{path}.eligibility.ageBand"), band, errors);
    }
    if let Some(band) = &division.eligibility.grade_band {
        check_band(&format!("{path}.eligibility.gradeBand"), band, errors);
    }
}

fn check_tiebreakers(path: &str, tiebreakers: &[Tiebreaker], errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for tb in tiebreakers {
        if !seen.insert(tb) {
            errors.push(format!("{path}.tiebreakers: duplicate entry {tb:?}"));
        }
    }
}

fn check_round_robin(path: &str, stage: &RoundRobinStage, errors: &mut Vec<String>) {
    if stage.groups < 1 {
        errors.push(format!("{path}.groups: must be at least 1"));
    }
    if stage.group_size < 2 {
        errors.push(format!("{path}.groupSize: must be at least 2"));
    }
    let points = stage.points;
    if points.win <= points.loss {
        errors.push(format!("{path}.points: win must be worth more than loss"));
    }
    if points.draw < points.loss || points.draw > points.win {
        errors.push(format!("{path}.points: draw must lie between loss and win"));
    }
    check_tiebreakers(path, &stage.tiebreakers, errors);
}

fn check_swiss(path: &str, stage: &SwissStage, errors: &mut Vec<String>) {
    if stage.rounds < 1 {
        errors.push(format!("{path}.rounds: must be at least 1"));
    }
    check_tiebreakers(path, &stage.tiebreakers, errors);
}

fn check_leaderboard(path: &str, stage: &LeaderboardStage, errors: &mut Vec<String>) {
    if stage.events.is_empty() {
        errors.push(format!("{path}.events: at least one event is required"));
    }
    for (j, event) in stage.events.iter().enumerate() {
        if event.unit.trim().is_empty() {
            errors.push(format!("{path}.events[{j}].unit: must not be empty"));
        }
        if event.max_participants == Some(0) {
            errors.push(format!("{path}.events[{j}].maxParticipants: must be at least 1"));
        }
    }
}

fn check_stage(path: &str, stage: &Stage, errors: &mut Vec<String>) {
    match stage {
        Stage::Single(s) => {
            if s.size < 2 {
                errors.push(format!("{path}.size: must be at least 2"));
            }
        }
        Stage::Double(d) => {
            if d.size < 2 {
                errors.push(format!("{path}.size: must be at least 2"));
            }
            if d.min_games_guaranteed == Some(0) {
                errors.push(format!("{path}.minGamesGuaranteed: must be at least 1"));
            }
        }
        Stage::RoundRobin(rr) => check_round_robin(path, rr, errors),
        Stage::Swiss(sw) => check_swiss(path, sw, errors),
        Stage::Leaderboard(lb) => check_leaderboard(path, lb, errors),
    }
}
