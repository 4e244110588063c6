//! Registry - the fixed, ordered set of actors
//!
//! Exactly one actor per pathology, always in this order:
//! WuKong, TangSeng, ZhuBaJie, ShaHeShang.
//! Membership and order cannot change after construction.

use crate::actor::{Actor, ShaHeShang, TangSeng, WuKong, ZhuBaJie};
use crate::diagnostics::Diagnostics;

/// Names in invocation order
pub const ACTOR_NAMES: [&str; 4] = [WuKong::NAME, TangSeng::NAME, ZhuBaJie::NAME, ShaHeShang::NAME];

pub struct Registry {
    actors: Vec<Box<dyn Actor>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("actors", &self.names()).finish()
    }
}

impl Registry {
    /// The production registry, every actor at full strength
    pub fn standard(diagnostics: &Diagnostics) -> Self {
        Self::from_actors(
            WuKong::new(),
            TangSeng::new(diagnostics),
            ZhuBaJie::new(diagnostics),
            ShaHeShang::new(),
        )
    }

    /// Registry from explicitly built actors. Taking one argument per variant
    /// keeps "one of each, fixed order" a property of the type.
    pub fn from_actors(
        wu_kong: WuKong,
        tang_seng: TangSeng,
        zhu_ba_jie: ZhuBaJie,
        sha_he_shang: ShaHeShang,
    ) -> Self {
        Self {
            actors: vec![
                Box::new(wu_kong),
                Box::new(tang_seng),
                Box::new(zhu_ba_jie),
                Box::new(sha_he_shang),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actors.iter().map(|a| a.name()).collect()
    }

    /// One lifecycle cycle: every actor's `live`, in order, on this thread
    pub fn live_all(&mut self) {
        for actor in self.actors.iter_mut() {
            actor.live();
        }
    }
}
