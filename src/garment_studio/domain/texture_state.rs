use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::design_side::DesignSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone)]
pub struct TextureSlot<T> {
    pub status: LoadStatus,
    pub resource: Option<T>,
    pub generation: u64,
    pub error: Option<String>,
}

impl<T> Default for TextureSlot<T> {
    fn default() -> Self {
        Self {
            status: LoadStatus::Idle,
            resource: None,
            generation: 0,
            error: None,
        }
    }
}

/// Handed out when a load starts; only the ticket of the latest load for a
/// side may complete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub side: DesignSide,
    pub generation: u64,
}

#[derive(Debug)]
pub enum Completion<T> {
    /// The load was applied; carries the resource it replaced, if any.
    Applied { released: Option<T> },
    /// A newer load or a clear superseded this ticket; the result was dropped.
    Stale,
}

impl<T> Completion<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Applied { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub status: LoadStatus,
    pub error: Option<String>,
}

/// Per-side load state of the design textures.
#[derive(Debug)]
pub struct TextureSlots<T> {
    slots: BTreeMap<DesignSide, TextureSlot<T>>,
    next_generation: u64,
}

impl<T> Default for TextureSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TextureSlots<T> {
    pub fn new() -> Self {
        let slots = DesignSide::ALL
            .iter()
            .map(|side| (*side, TextureSlot::default()))
            .collect();
        Self {
            slots,
            next_generation: 1,
        }
    }

    fn slot_mut(&mut self, side: DesignSide) -> &mut TextureSlot<T> {
        self.slots.entry(side).or_default()
    }

    fn bump(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    pub fn begin(&mut self, side: DesignSide) -> LoadTicket {
        let generation = self.bump();
        let slot = self.slot_mut(side);
        slot.status = LoadStatus::Loading;
        slot.generation = generation;
        slot.error = None;
        LoadTicket { side, generation }
    }

    pub fn complete(&mut self, ticket: LoadTicket, result: Result<T, String>) -> Completion<T> {
        let slot = self.slot_mut(ticket.side);
        if slot.generation != ticket.generation || slot.status != LoadStatus::Loading {
            return Completion::Stale;
        }
        match result {
            Ok(resource) => {
                slot.status = LoadStatus::Loaded;
                slot.error = None;
                Completion::Applied {
                    released: slot.resource.replace(resource),
                }
            }
            Err(message) => {
                slot.status = LoadStatus::Error;
                slot.error = Some(message);
                Completion::Applied {
                    released: slot.resource.take(),
                }
            }
        }
    }

    /// Back to idle. Any load still in flight for this side is discarded when it lands.
    pub fn clear(&mut self, side: DesignSide) -> Option<T> {
        let generation = self.bump();
        let slot = self.slot_mut(side);
        slot.status = LoadStatus::Idle;
        slot.generation = generation;
        slot.error = None;
        slot.resource.take()
    }

    pub fn status(&self, side: DesignSide) -> LoadStatus {
        self.slots
            .get(&side)
            .map(|s| s.status)
            .unwrap_or(LoadStatus::Idle)
    }

    pub fn resource(&self, side: DesignSide) -> Option<&T> {
        self.slots.get(&side).and_then(|s| s.resource.as_ref())
    }

    pub fn slot_status(&self, side: DesignSide) -> SlotStatus {
        match self.slots.get(&side) {
            Some(slot) => SlotStatus {
                status: slot.status,
                error: slot.error.clone(),
            },
            None => SlotStatus {
                status: LoadStatus::Idle,
                error: None,
            },
        }
    }

    pub fn snapshot(&self) -> BTreeMap<DesignSide, SlotStatus> {
        DesignSide::ALL
            .iter()
            .map(|side| (*side, self.slot_status(*side)))
            .collect()
    }
}
