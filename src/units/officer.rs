use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::error::UnitError;
use crate::id::UnitId;
use crate::model::effect::{Effect, SoundCue};
use crate::model::permission::Permission;
use crate::model::unit::CharacterInfo;
use crate::model::unit_type::UnitClass;
use crate::model::world::World;
use crate::rules::Rules;

/// Roll a new officer identity from the configured name pools.
pub fn generate_character(rules: &Rules, rng: &mut dyn RngCore, fallback_name: &str) -> CharacterInfo {
    let Some(pool) = rules.name_pools.choose(rng) else {
        return CharacterInfo {
            name: fallback_name.to_string(),
            ethnicity: "unknown".to_string(),
            masculine: true,
            voice_set: "default".to_string(),
        };
    };
    let masculine = rng.random_bool(0.5);
    let (first_names, voices) = if masculine {
        (&pool.masculine_names, &pool.masculine_voices)
    } else {
        (&pool.feminine_names, &pool.feminine_voices)
    };
    let first = first_names.choose(rng).map_or("", String::as_str);
    let surname = pool.surnames.choose(rng).map_or("", String::as_str);
    let name = format!("{first} {surname}").trim().to_string();
    CharacterInfo {
        name: if name.is_empty() {
            fallback_name.to_string()
        } else {
            name
        },
        ethnicity: pool.ethnicity.clone(),
        masculine,
        voice_set: voices
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| "default".to_string()),
    }
}

impl World {
    /// Make an officer a veteran. Returns false if it already was one.
    pub fn promote_officer(&mut self, officer: UnitId) -> bool {
        if self
            .expect_unit(officer, "promote_officer")
            .get_permission(Permission::Veteran)
        {
            return false;
        }
        self.set_permission(officer, Permission::Veteran, Some(true), false, true);
        let unit = self.expect_unit_mut(officer, "promote_officer");
        unit.name = format!("veteran {}", unit.name);
        tracing::info!(officer = %officer, "officer promoted");
        true
    }

    /// Promote an officer or a group.
    pub fn promote(&mut self, id: UnitId) -> Result<bool, UnitError> {
        match self.get(id)?.class() {
            UnitClass::Group => self.promote_group(id),
            UnitClass::Officer => {
                let promoted = self.promote_officer(id);
                if promoted {
                    self.emit(Effect::Sound {
                        cue: SoundCue::Promotion,
                    });
                }
                Ok(promoted)
            }
            actual => Err(UnitError::WrongClass {
                id,
                expected: UnitClass::Officer,
                actual,
            }),
        }
    }

    /// A fresh officer takes over under the same identity. Veteran status,
    /// its name prefix and supply statuses are lost.
    pub fn replace_officer(&mut self, officer: UnitId) {
        let unit = self.expect_unit_mut(officer, "replace_officer");
        unit.name = unit.default_name.clone();
        let character = unit
            .kind
            .as_officer()
            .map_or_else(String::new, |o| o.character.name.clone());
        for status in [Permission::Veteran, Permission::Starvation, Permission::Dehydration] {
            self.set_permission(officer, status, None, false, true);
        }
        tracing::info!(officer = %officer, "officer replaced");
        self.notify(format!("{character} has been replaced after attrition."));
    }
}
