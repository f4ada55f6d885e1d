use kinema_core::{Result, UnitType};
use serde::{Deserialize, Serialize};

/// Which derived state [`Actor::post_create_init`](crate::Actor::post_create_init) builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostCreateOptions {
    /// Remap skinning influences that reference bones disabled in a LOD.
    pub make_geom_lods_compatible: bool,
    /// Fit per-node OBBs from the LOD 0 bind pose.
    pub generate_obbs: bool,
    /// Rescale the actor into [`ActorSettings::unit_type`].
    pub convert_unit_type: bool,
}

impl Default for PostCreateOptions {
    fn default() -> Self {
        Self {
            make_geom_lods_compatible: true,
            generate_obbs: true,
            convert_unit_type: true,
        }
    }
}

/// Per-actor build configuration.
///
/// # Example
///
/// ```rust,ignore
/// let settings = ActorSettings::from_json(r#"{ "unit_type": "centimeters" }"#)?;
/// assert_eq!(settings.mirror_epsilon, kinema_core::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSettings {
    /// Unit type the actor is converted to when it finishes loading.
    pub unit_type: UnitType,
    /// Distance tolerance for mirror axis detection and geometric matching.
    pub mirror_epsilon: f32,
    pub post_create: PostCreateOptions,
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self {
            unit_type: UnitType::Meters,
            mirror_epsilon: kinema_core::EPSILON,
            post_create: PostCreateOptions::default(),
        }
    }
}

impl ActorSettings {
    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let settings =
            ActorSettings::from_json(r#"{ "unit_type": "centimeters", "post_create": { "generate_obbs": false } }"#)
                .unwrap();
        assert_eq!(settings.unit_type, UnitType::Centimeters);
        assert!(!settings.post_create.generate_obbs);
        assert!(settings.post_create.make_geom_lods_compatible);
        assert!((settings.mirror_epsilon - kinema_core::EPSILON).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ActorSettings::from_json("{ unit_type: ").is_err());
    }
}
