//! The achievement catalog: definitions, chains, and hidden predicates.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

use crate::error::{ReputationError, Result};

use super::hidden::{self, HiddenPredicate, HiddenRegistry};
use super::stats::*;
use super::types::*;

/// Immutable set of achievement definitions shared by every user.
#[derive(Debug, Clone, Default)]
pub struct AchievementCatalog {
    definitions: BTreeMap<AchievementId, AchievementDefinition>,
    chains: BTreeMap<ChainId, AchievementChain>,
    hidden: HiddenRegistry,
}

impl AchievementCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &AchievementId) -> Option<&AchievementDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &AchievementId) -> bool {
        self.definitions.contains_key(id)
    }

    /// Every definition, chain levels included, in id order.
    pub fn definitions(&self) -> impl Iterator<Item = &AchievementDefinition> {
        self.definitions.values()
    }

    /// Definitions that do not belong to a chain.
    pub fn standalone(&self) -> impl Iterator<Item = &AchievementDefinition> {
        self.definitions.values().filter(|d| d.chain_id.is_none())
    }

    pub fn chains(&self) -> impl Iterator<Item = &AchievementChain> {
        self.chains.values()
    }

    pub fn chain(&self, id: &ChainId) -> Option<&AchievementChain> {
        self.chains.get(id)
    }

    pub fn predicate(&self, id: &AchievementId) -> Option<HiddenPredicate> {
        self.hidden.get(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    definitions: Vec<AchievementDefinition>,
    chains: Vec<AchievementChain>,
    hidden: HiddenRegistry,
}

impl CatalogBuilder {
    pub fn achievement(mut self, definition: AchievementDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn hidden(mut self, definition: AchievementDefinition, predicate: HiddenPredicate) -> Self {
        self.hidden.register(definition.id.clone(), predicate);
        self.definitions.push(definition);
        self
    }

    pub fn chain(mut self, chain: AchievementChain) -> Self {
        self.chains.push(chain);
        self
    }

    /// Validate and freeze the catalog.
    ///
    /// Structural problems (duplicate ids, broken chains, hidden entries
    /// without a predicate) are errors. Dependencies on ids that do not
    /// exist are only logged; they block the dependent achievement at
    /// evaluation time.
    pub fn build(self) -> Result<AchievementCatalog> {
        let mut definitions = BTreeMap::new();
        let mut chains = BTreeMap::new();

        for def in self.definitions {
            if def.chain_id.is_some() {
                return Err(ReputationError::InvalidConfig(format!(
                    "achievement {} names a chain but was added outside one",
                    def.id
                )));
            }
            if def.is_hidden && !self.hidden.contains(&def.id) {
                return Err(ReputationError::InvalidConfig(format!(
                    "hidden achievement {} has no predicate",
                    def.id
                )));
            }
            insert_unique(&mut definitions, def)?;
        }

        for chain in self.chains {
            if chain.achievements.is_empty() || chain.total_levels as usize != chain.achievements.len() {
                return Err(ReputationError::InvalidConfig(format!(
                    "chain {} declares {} levels but has {} achievements",
                    chain.id,
                    chain.total_levels,
                    chain.achievements.len()
                )));
            }
            for (i, def) in chain.achievements.iter().enumerate() {
                let expected = i as u32 + 1;
                if def.chain_id.as_ref() != Some(&chain.id) || def.level != Some(expected) {
                    return Err(ReputationError::InvalidConfig(format!(
                        "achievement {} is not level {} of chain {}",
                        def.id, expected, chain.id
                    )));
                }
                if def.is_hidden {
                    return Err(ReputationError::InvalidConfig(format!(
                        "chain level {} cannot be hidden",
                        def.id
                    )));
                }
                insert_unique(&mut definitions, def.clone())?;
            }
            if chains.contains_key(&chain.id) {
                return Err(ReputationError::InvalidConfig(format!(
                    "duplicate chain {}",
                    chain.id
                )));
            }
            chains.insert(chain.id.clone(), chain);
        }

        let known: BTreeSet<&AchievementId> = definitions.keys().collect();
        for def in definitions.values() {
            for dep in &def.requirements.dependencies {
                if !known.contains(dep) {
                    log::warn!("achievement {} depends on unknown achievement {}", def.id, dep);
                }
            }
        }

        Ok(AchievementCatalog {
            definitions,
            chains,
            hidden: self.hidden,
        })
    }
}

fn insert_unique(
    definitions: &mut BTreeMap<AchievementId, AchievementDefinition>,
    def: AchievementDefinition,
) -> Result<()> {
    if definitions.contains_key(&def.id) {
        return Err(ReputationError::InvalidConfig(format!(
            "duplicate achievement {}",
            def.id
        )));
    }
    definitions.insert(def.id.clone(), def);
    Ok(())
}

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

static DEFAULT_CATALOG: LazyLock<Arc<AchievementCatalog>> = LazyLock::new(|| {
    let catalog = builtin().unwrap_or_else(|e| {
        log::error!("built-in achievement catalog is invalid: {e}");
        AchievementCatalog::empty()
    });
    Arc::new(catalog)
});

/// The community's standard catalog, built once per process.
pub fn default_catalog() -> Arc<AchievementCatalog> {
    Arc::clone(&DEFAULT_CATALOG)
}

fn builtin() -> Result<AchievementCatalog> {
    use AchievementCategory::*;
    use AchievementDefinition as Def;

    AchievementCatalog::builder()
        // Standalone
        .achievement(
            Def::standard("first_answer", "First Fetch", "Post your first answer", Community, Rarity::Common, 10)
                .requires(ANSWERS_POSTED, 1u32),
        )
        .achievement(
            Def::standard("first_question", "Curious Pup", "Ask your first question", Community, Rarity::Common, 5)
                .requires(QUESTIONS_ASKED, 1u32),
        )
        .achievement(
            Def::standard("profile_complete", "Good Boy Profile", "Fill in your profile and your dog's", Community, Rarity::Common, 10)
                .requires(PROFILE_COMPLETE, true),
        )
        .achievement(
            Def::standard("helpful_neighbor", "Helpful Neighbor", "Receive 50 upvotes on your answers", Engagement, Rarity::Uncommon, 50)
                .requires(UPVOTES_RECEIVED, 50u32)
                .depends_on("first_answer")
                .badge("helpful_neighbor"),
        )
        .achievement(
            Def::standard("best_in_show", "Best in Show", "Have 10 answers chosen as best", Expertise, Rarity::Rare, 100)
                .requires(BEST_ANSWERS, 10u32)
                .depends_on("first_answer")
                .badge("best_in_show"),
        )
        .achievement(
            Def::standard("quality_craftsman", "Quality Craftsman", "Write 5 outstanding answers with a strong average", Expertise, Rarity::Epic, 150)
                .requires(OUTSTANDING_ANSWERS, 5u32)
                .requires(AVERAGE_ANSWER_QUALITY, 0.75)
                .perk("answer_highlight"),
        )
        .achievement(
            Def::standard("verified_expert", "Verified Expert", "Be verified as a canine professional", Expertise, Rarity::Rare, 100)
                .requires(IS_VERIFIED_EXPERT, true)
                .badge("verified_expert")
                .unlocks("expert_answers_panel"),
        )
        .achievement(
            Def::standard("well_rounded_pack", "Well-Rounded Pack", "Attend a walk, a training class, and a meetup", Events, Rarity::Uncommon, 40)
                .requires(EVENT_TYPES_ATTENDED, ["group_walk", "training_class", "meetup"]),
        )
        .achievement(
            Def::standard("referral_leader", "Referral Leader", "Bring 5 new members into the pack", Community, Rarity::Rare, 75)
                .requires(REFERRALS_COMPLETED, 5u32)
                .perk("partner_discounts"),
        )
        .achievement(
            Def::standard("achievement_hunter", "Achievement Hunter", "Unlock 10 achievements", Exploration, Rarity::Epic, 100)
                .requires(ACHIEVEMENTS_UNLOCKED, 10u32),
        )
        .achievement(
            Def::collaborative("pack_leader", "Pack Leader", "Organize 3 group events", Community, Rarity::Rare, 120)
                .requires(GROUP_EVENTS_ORGANIZED, 3u32)
                .depends_on("well_rounded_pack")
                .unlocks("event_hosting"),
        )
        // Hidden
        .hidden(
            Def::hidden("night_howler", "Night Howler", "Active after midnight seven nights in a row", Engagement, Rarity::Rare, 50,
                "Some dogs do their best work under the moon."),
            hidden::night_howler,
        )
        .hidden(
            Def::hidden("festival_hound", "Festival Hound", "Attend three different dog festivals", Events, Rarity::Epic, 80,
                "Every festival has its own smells."),
            hidden::festival_hound,
        )
        .hidden(
            Def::hidden("pack_mentor", "Mentor of the Pack", "Help five members reach a milestone", Mentorship, Rarity::Epic, 100,
                "Lifting others up lifts you too."),
            hidden::pack_mentor,
        )
        .hidden(
            Def::hidden("first_to_the_bowl", "First to the Bowl", "Be first to respond to ten new questions", Engagement, Rarity::Uncommon, 40,
                "Speed counts when someone needs help."),
            hidden::first_to_the_bowl,
        )
        .hidden(
            Def::hidden("weekend_wanderer", "Weekend Wanderer", "Stay active four weekends in a row", Exploration, Rarity::Uncommon, 40,
                "Saturdays are for adventures."),
            hidden::weekend_wanderer,
        )
        .hidden(
            Def::hidden("dog_oracle", "Dog Oracle", "Make ten predictions with 80% accuracy", Expertise, Rarity::Legendary, 250,
                "Some members just know how things will turn out."),
            hidden::dog_oracle,
        )
        // Chains
        .chain(AchievementChain::new(
            "helpful_paw",
            "Helpful Paw",
            vec![
                Def::chain_level("helpful_paw", 1, "helpful_paw_1", "Helpful Paw I", "Post 5 answers", Community, Rarity::Common, 15)
                    .requires(ANSWERS_POSTED, 5u32),
                Def::chain_level("helpful_paw", 2, "helpful_paw_2", "Helpful Paw II", "Post 25 answers", Community, Rarity::Uncommon, 40)
                    .requires(ANSWERS_POSTED, 25u32),
                Def::chain_level("helpful_paw", 3, "helpful_paw_3", "Helpful Paw III", "Post 75 answers", Community, Rarity::Rare, 90)
                    .requires(ANSWERS_POSTED, 75u32),
                Def::chain_level("helpful_paw", 4, "helpful_paw_4", "Helpful Paw IV", "Post 150 answers", Community, Rarity::Epic, 180)
                    .requires(ANSWERS_POSTED, 150u32)
                    .badge("golden_paw"),
                Def::chain_level("helpful_paw", 5, "helpful_paw_5", "Helpful Paw V", "Post 300 answers", Community, Rarity::Legendary, 400)
                    .requires(ANSWERS_POSTED, 300u32)
                    .unlocks("community_moderation"),
            ],
        ))
        .chain(AchievementChain::new(
            "event_explorer",
            "Event Explorer",
            vec![
                Def::chain_level("event_explorer", 1, "event_explorer_1", "Event Explorer I", "Attend your first event", Events, Rarity::Common, 15)
                    .requires(EVENTS_ATTENDED, 1u32),
                Def::chain_level("event_explorer", 2, "event_explorer_2", "Event Explorer II", "Attend 5 events", Events, Rarity::Uncommon, 50)
                    .requires(EVENTS_ATTENDED, 5u32),
                Def::chain_level("event_explorer", 3, "event_explorer_3", "Event Explorer III", "Attend 15 events", Events, Rarity::Rare, 120)
                    .requires(EVENTS_ATTENDED, 15u32)
                    .perk("event_early_access"),
            ],
        ))
        .chain(AchievementChain::new(
            "streak_keeper",
            "Streak Keeper",
            vec![
                Def::chain_level("streak_keeper", 1, "streak_keeper_1", "Streak Keeper I", "Keep a 3-day streak", Engagement, Rarity::Common, 10)
                    .requires(STREAK_DAYS, 3u32),
                Def::chain_level("streak_keeper", 2, "streak_keeper_2", "Streak Keeper II", "Keep a 7-day streak", Engagement, Rarity::Uncommon, 30)
                    .requires(STREAK_DAYS, 7u32),
                Def::chain_level("streak_keeper", 3, "streak_keeper_3", "Streak Keeper III", "Keep a 30-day streak", Engagement, Rarity::Rare, 100)
                    .requires(STREAK_DAYS, 30u32),
                Def::chain_level("streak_keeper", 4, "streak_keeper_4", "Streak Keeper IV", "Keep a 100-day streak", Engagement, Rarity::Legendary, 300)
                    .requires(STREAK_DAYS, 100u32),
            ],
        ))
        .build()
}
