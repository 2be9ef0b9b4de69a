//! Material selection state machine.
//!
//! `Idle -> FetchInFlight -> Idle`. A fetch cycle covers two tracks (prices and
//! vendors); the cycle ends only when both have resolved. While a cycle is in
//! flight the selection control and the fetch trigger are disabled, so a second
//! cycle can never overlap the first.

use crate::domain::Material;
use crate::error::ValidationError;

pub const PLACEHOLDER_LABEL: &str = "-- Select a material --";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// `None` for the placeholder.
    pub material_id: Option<String>,
    pub label: String,
}

impl SelectOption {
    fn placeholder() -> Self {
        Self {
            material_id: None,
            label: PLACEHOLDER_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Prices,
    Vendors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    InFlight {
        cycle: u64,
        material_id: String,
        prices_pending: bool,
        vendors_pending: bool,
    },
}

/// A fetch cycle the orchestrator should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub cycle: u64,
    pub material_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The control is disabled (a cycle is in flight) or the index is out of range.
    Suppressed,
    /// The placeholder was chosen; nothing to fetch.
    Cleared,
    Fetch(FetchRequest),
}

#[derive(Debug)]
pub struct SelectionController {
    options: Vec<SelectOption>,
    selected: Option<String>,
    phase: FetchPhase,
    last_cycle: u64,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            options: vec![SelectOption::placeholder()],
            selected: None,
            phase: FetchPhase::Idle,
            last_cycle: 0,
        }
    }

    /// Repopulate the options: the placeholder followed by one entry per material.
    ///
    /// A selection that no longer exists in the list is cleared.
    pub fn set_materials(&mut self, materials: &[Material]) {
        self.options = std::iter::once(SelectOption::placeholder())
            .chain(materials.iter().map(|m| SelectOption {
                material_id: Some(m.id.clone()),
                label: if m.name == m.id {
                    m.name.clone()
                } else {
                    format!("{} ({})", m.name, m.id)
                },
            }))
            .collect();

        if let Some(id) = &self.selected {
            if !materials.iter().any(|m| &m.id == id) {
                self.selected = None;
            }
        }
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Index into `options()` of the current selection (0 = placeholder).
    pub fn selected_index(&self) -> usize {
        self.selected
            .as_ref()
            .and_then(|id| {
                self.options
                    .iter()
                    .position(|o| o.material_id.as_ref() == Some(id))
            })
            .unwrap_or(0)
    }

    pub fn phase(&self) -> &FetchPhase {
        &self.phase
    }

    pub fn fetch_in_flight(&self) -> bool {
        matches!(self.phase, FetchPhase::InFlight { .. })
    }

    /// Whether the selection control accepts changes.
    pub fn control_enabled(&self) -> bool {
        !self.fetch_in_flight()
    }

    /// Whether the manual fetch trigger is usable.
    pub fn trigger_enabled(&self) -> bool {
        !self.fetch_in_flight() && self.selected.is_some()
    }

    /// Selection-changed event.
    pub fn select(&mut self, index: usize) -> SelectionOutcome {
        if !self.control_enabled() {
            return SelectionOutcome::Suppressed;
        }
        let Some(option) = self.options.get(index) else {
            return SelectionOutcome::Suppressed;
        };

        match option.material_id.clone() {
            None => {
                self.selected = None;
                SelectionOutcome::Cleared
            }
            Some(id) => {
                self.selected = Some(id.clone());
                SelectionOutcome::Fetch(self.begin(id))
            }
        }
    }

    /// Fetch-triggered event: re-run the cycle for the current selection.
    ///
    /// `Ok(None)` when a cycle is already in flight.
    pub fn trigger(&mut self) -> Result<Option<FetchRequest>, ValidationError> {
        if self.fetch_in_flight() {
            return Ok(None);
        }
        let id = self
            .selected
            .clone()
            .ok_or(ValidationError::NoMaterialSelected)?;
        Ok(Some(self.begin(id)))
    }

    fn begin(&mut self, material_id: String) -> FetchRequest {
        self.last_cycle += 1;
        self.phase = FetchPhase::InFlight {
            cycle: self.last_cycle,
            material_id: material_id.clone(),
            prices_pending: true,
            vendors_pending: true,
        };
        FetchRequest {
            cycle: self.last_cycle,
            material_id,
        }
    }

    /// Mark one track of `cycle` as resolved (success or error).
    ///
    /// Returns `false` for a cycle that is not the current one; such results
    /// must not be rendered. The phase returns to `Idle` once both tracks of the
    /// current cycle have resolved.
    pub fn resolve(&mut self, cycle: u64, track: Track) -> bool {
        let FetchPhase::InFlight {
            cycle: current,
            prices_pending,
            vendors_pending,
            ..
        } = &mut self.phase
        else {
            return false;
        };
        if *current != cycle {
            return false;
        }

        match track {
            Track::Prices => *prices_pending = false,
            Track::Vendors => *vendors_pending = false,
        }
        if !*prices_pending && !*vendors_pending {
            self.phase = FetchPhase::Idle;
        }
        true
    }
}
