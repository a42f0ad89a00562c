use serde::{Deserialize, Serialize};

/// Enemy archetypes. Each maps onto exactly one behavior variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    Kamikaze,
    Runner,
    Slasher,
    Lancer,
    Scarecrow,
}

/// Decision logic families shared by the archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorKind {
    DirectPursuit,
    GridPathfinding,
    SnapPursuit,
    StationaryMelee,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Kamikaze,
        Archetype::Runner,
        Archetype::Slasher,
        Archetype::Lancer,
        Archetype::Scarecrow,
    ];

    pub fn behavior(self) -> BehaviorKind {
        match self {
            Archetype::Kamikaze => BehaviorKind::DirectPursuit,
            Archetype::Runner => BehaviorKind::GridPathfinding,
            Archetype::Slasher => BehaviorKind::SnapPursuit,
            Archetype::Lancer | Archetype::Scarecrow => BehaviorKind::StationaryMelee,
        }
    }

    /// Digit used for this archetype's spawn marker in ASCII grids.
    pub fn marker_char(self) -> char {
        match self {
            Archetype::Kamikaze => '1',
            Archetype::Runner => '2',
            Archetype::Slasher => '3',
            Archetype::Lancer => '4',
            Archetype::Scarecrow => '5',
        }
    }

    pub fn from_marker_char(ch: char) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.marker_char() == ch)
    }
}

/// Weighted set of archetypes active on a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeSet {
    pub entries: Vec<(Archetype, u32)>,
}

impl ArchetypeSet {
    /// Every listed archetype with equal weight.
    pub fn uniform(archetypes: &[Archetype]) -> Self {
        Self {
            entries: archetypes.iter().map(|&a| (a, 1)).collect(),
        }
    }

    pub fn single(archetype: Archetype) -> Self {
        Self::uniform(&[archetype])
    }

    /// True when no archetype can ever be drawn.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|&(_, w)| w == 0)
    }

    pub fn weights(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|&(_, w)| w)
    }

    pub fn archetype_at(&self, index: usize) -> Archetype {
        self.entries[index].0
    }

    pub fn contains(&self, archetype: Archetype) -> bool {
        self.entries.iter().any(|&(a, w)| a == archetype && w > 0)
    }
}

/// What the generator should populate a level with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPlan {
    pub archetypes: ArchetypeSet,
    pub enemy_count_min: u32,
    pub enemy_count_max: u32,
}

/// Hard cap on enemies per level.
pub const MAX_ENEMIES: u32 = 13;

impl LevelPlan {
    /// Plan for the given level index. Later levels unlock more archetypes,
    /// weight them more heavily, and raise the enemy count.
    pub fn for_level(index: u32) -> Self {
        let unlocked = (index as usize).saturating_add(1).min(Archetype::ALL.len());
        // Unlock order differs from the marker order: runners need a
        // pathfinding-friendly layout and arrive third.
        let order = [
            Archetype::Kamikaze,
            Archetype::Slasher,
            Archetype::Runner,
            Archetype::Lancer,
            Archetype::Scarecrow,
        ];
        let entries = order[..unlocked]
            .iter()
            .enumerate()
            .map(|(i, &a)| (a, 1 + i as u32 * index.min(4)))
            .collect();
        Self {
            archetypes: ArchetypeSet { entries },
            enemy_count_min: index.saturating_add(5).min(MAX_ENEMIES),
            enemy_count_max: index.saturating_mul(2).saturating_add(7).min(MAX_ENEMIES),
        }
    }

    /// Plan with a fixed enemy count drawn from a single archetype.
    pub fn only(archetype: Archetype, count: u32) -> Self {
        Self {
            archetypes: ArchetypeSet::single(archetype),
            enemy_count_min: count,
            enemy_count_max: count,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.archetypes.is_empty() && self.enemy_count_min <= self.enemy_count_max
    }
}

impl Default for LevelPlan {
    fn default() -> Self {
        Self::for_level(0)
    }
}
