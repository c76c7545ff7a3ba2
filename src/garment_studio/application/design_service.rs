use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::ApplicationError;
use crate::domain::design_side::DesignSide;
use crate::domain::image::{Sampler, Texture};
use crate::domain::placement::{scale_to_percent, rotation_to_degrees, DesignPlacement, PlacementSliders};
use crate::domain::texture_state::{Completion, LoadStatus, LoadTicket, SlotStatus, TextureSlots};
use crate::infrastructure::compositor::encode_png;
use crate::infrastructure::external_image_fetcher::truncate_for_log;
use crate::infrastructure::texture_loader::DefaultTextureLoader;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignState {
    pub status: LoadStatus,
    pub error: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sampler: Option<Sampler>,
    pub placement: DesignPlacement,
    pub sliders: PlacementSliders,
    pub scale_percent: f32,
    pub rotation_degrees: i32,
}

/// Completes a started load exactly once. Dropped before `finish` (the
/// request went away mid-load), it marks the load as cancelled so the side
/// never stays in `loading`.
struct PendingLoad<'a> {
    slots: &'a Mutex<TextureSlots<Texture>>,
    ticket: Option<LoadTicket>,
}

impl PendingLoad<'_> {
    fn finish(mut self, loaded: Result<Texture, String>) -> Option<Completion<Texture>> {
        let ticket = self.ticket.take()?;
        let mut slots = self.slots.lock().ok()?;
        Some(slots.complete(ticket, loaded))
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        if let Ok(mut slots) = self.slots.lock() {
            if slots.complete(ticket, Err("load cancelled".to_string())).is_applied() {
                warn!(side = %ticket.side, generation = ticket.generation, "design load cancelled");
            }
        }
    }
}

/// Front/back designs of the shirt being customized: their texture load
/// state and where each one is placed.
pub struct DesignService {
    loader: Arc<DefaultTextureLoader>,
    slots: Mutex<TextureSlots<Texture>>,
    placements: Mutex<BTreeMap<DesignSide, DesignPlacement>>,
}

impl DesignService {
    pub fn new(loader: Arc<DefaultTextureLoader>) -> Self {
        let placements = DesignSide::ALL
            .iter()
            .map(|side| (*side, DesignPlacement::default()))
            .collect();
        Self {
            loader,
            slots: Mutex::new(TextureSlots::new()),
            placements: Mutex::new(placements),
        }
    }

    fn slots(&self) -> Result<MutexGuard<'_, TextureSlots<Texture>>, ApplicationError> {
        self.slots
            .lock()
            .map_err(|_| ApplicationError::from(anyhow::anyhow!("texture state lock poisoned")))
    }

    fn placements(&self) -> Result<MutexGuard<'_, BTreeMap<DesignSide, DesignPlacement>>, ApplicationError> {
        self.placements
            .lock()
            .map_err(|_| ApplicationError::from(anyhow::anyhow!("placement state lock poisoned")))
    }

    /// Replaces the design of one side. A missing or blank source clears it.
    pub async fn set_design(
        &self,
        side: DesignSide,
        source: Option<String>,
    ) -> Result<SlotStatus, ApplicationError> {
        let source = match source {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                let mut slots = self.slots()?;
                if slots.clear(side).is_some() {
                    debug!(%side, "released design texture");
                }
                info!(%side, "design cleared");
                return Ok(slots.slot_status(side));
            }
        };

        let ticket = self.slots()?.begin(side);
        let pending = PendingLoad {
            slots: &self.slots,
            ticket: Some(ticket),
        };
        info!(%side, generation = ticket.generation, source = truncate_for_log(&source), "loading design");

        let loaded = self.loader.load(&source).await.map_err(|e| {
            warn!(%side, error = %e, "design texture failed to load");
            e.to_string()
        });

        match pending.finish(loaded) {
            Some(Completion::Applied { released }) => {
                if released.is_some() {
                    debug!(%side, "released previous design texture");
                }
            }
            Some(Completion::Stale) => {
                debug!(%side, generation = ticket.generation, "discarding superseded design load");
            }
            None => {
                return Err(ApplicationError::from(anyhow::anyhow!("texture state lock poisoned")));
            }
        }
        Ok(self.slots()?.slot_status(side))
    }

    pub fn texture_png(&self, side: DesignSide) -> Result<Vec<u8>, ApplicationError> {
        let slots = self.slots()?;
        let texture = slots
            .resource(side)
            .ok_or_else(|| ApplicationError::NotFound(format!("{} design texture", side)))?;
        Ok(encode_png(&texture.image)?)
    }

    pub fn placement(&self, side: DesignSide) -> Result<DesignPlacement, ApplicationError> {
        Ok(self.placements()?.get(&side).copied().unwrap_or_default())
    }

    pub fn set_placement_from_sliders(
        &self,
        side: DesignSide,
        sliders: PlacementSliders,
    ) -> Result<DesignPlacement, ApplicationError> {
        let placement = DesignPlacement::from(sliders);
        self.placements()?.insert(side, placement);
        debug!(%side, ?placement, "placement changed");
        Ok(placement)
    }

    pub fn reset_placement(&self, side: DesignSide) -> Result<DesignPlacement, ApplicationError> {
        let placement = DesignPlacement::default();
        self.placements()?.insert(side, placement);
        debug!(%side, "placement reset");
        Ok(placement)
    }

    pub fn state(&self, side: DesignSide) -> Result<DesignState, ApplicationError> {
        let placement = self.placement(side)?;
        let slots = self.slots()?;
        let slot = slots.slot_status(side);
        let texture = slots.resource(side);
        Ok(DesignState {
            status: slot.status,
            error: slot.error,
            width: texture.map(|t| t.image.width()),
            height: texture.map(|t| t.image.height()),
            sampler: texture.map(|t| t.sampler),
            placement,
            sliders: PlacementSliders::from(placement),
            scale_percent: scale_to_percent(placement.scale),
            rotation_degrees: rotation_to_degrees(placement.rotation),
        })
    }

    pub fn states(&self) -> Result<BTreeMap<DesignSide, DesignState>, ApplicationError> {
        DesignSide::ALL
            .iter()
            .map(|side| -> Result<_, ApplicationError> { Ok((*side, self.state(*side)?)) })
            .collect()
    }
}
