//! Accessory checklist issued with (and returned for) a rental

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One accessory that can be issued alongside a piece of equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Accessory {
    Charger,
    PowerBank,
    Headset,
    Antenna,
    Clip,
}

impl Accessory {
    /// Canonical order used for listings and reports
    pub const ALL: [Accessory; 5] = [
        Accessory::Charger,
        Accessory::PowerBank,
        Accessory::Headset,
        Accessory::Antenna,
        Accessory::Clip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Accessory::Charger => "charger",
            Accessory::PowerBank => "power_bank",
            Accessory::Headset => "headset",
            Accessory::Antenna => "antenna",
            Accessory::Clip => "clip",
        }
    }
}

impl std::fmt::Display for Accessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Five independent accessory flags.
///
/// A rental carries two of these: the set issued at checkout and the set
/// returned so far. Missing fields deserialize as `false`, so a client may
/// send only the accessories it is confirming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AccessorySet {
    pub charger: bool,
    #[serde(alias = "powerBank")]
    pub power_bank: bool,
    pub headset: bool,
    pub antenna: bool,
    pub clip: bool,
}

impl AccessorySet {
    pub fn get(&self, accessory: Accessory) -> bool {
        match accessory {
            Accessory::Charger => self.charger,
            Accessory::PowerBank => self.power_bank,
            Accessory::Headset => self.headset,
            Accessory::Antenna => self.antenna,
            Accessory::Clip => self.clip,
        }
    }

    pub fn set(&mut self, accessory: Accessory, value: bool) {
        match accessory {
            Accessory::Charger => self.charger = value,
            Accessory::PowerBank => self.power_bank = value,
            Accessory::Headset => self.headset = value,
            Accessory::Antenna => self.antenna = value,
            Accessory::Clip => self.clip = value,
        }
    }

    /// Build a set from the listed accessories
    pub fn of(accessories: &[Accessory]) -> Self {
        let mut set = Self::default();
        for a in accessories {
            set.set(*a, true);
        }
        set
    }

    /// Accessories flagged in this set, in canonical order
    pub fn items(&self) -> impl Iterator<Item = Accessory> + '_ {
        Accessory::ALL.into_iter().filter(move |a| self.get(*a))
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }

    pub fn union(&self, other: &AccessorySet) -> AccessorySet {
        AccessorySet {
            charger: self.charger || other.charger,
            power_bank: self.power_bank || other.power_bank,
            headset: self.headset || other.headset,
            antenna: self.antenna || other.antenna,
            clip: self.clip || other.clip,
        }
    }

    /// Drop every flag that was not issued
    pub fn restricted_to(&self, issued: &AccessorySet) -> AccessorySet {
        AccessorySet {
            charger: self.charger && issued.charger,
            power_bank: self.power_bank && issued.power_bank,
            headset: self.headset && issued.headset,
            antenna: self.antenna && issued.antenna,
            clip: self.clip && issued.clip,
        }
    }
}

/// True when every issued accessory came back.
///
/// Flags not issued are ignored whatever their returned value; an empty
/// issued set is always complete.
pub fn is_return_complete(issued: &AccessorySet, returned: &AccessorySet) -> bool {
    issued.items().all(|a| returned.get(a))
}

/// Issued accessories still missing from `returned`
pub fn missing(issued: &AccessorySet, returned: &AccessorySet) -> Vec<Accessory> {
    issued.items().filter(|a| !returned.get(*a)).collect()
}
