//! Region → System → Format selection and question counts.

use serde::Serialize;

use crate::content::ContentStore;
use crate::model::{Enumerated, Format, Region, Scope, System};

/// Which selection view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Region,
    System,
    Format,
}

/// The choices made so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub region: Option<Scope<Region>>,
    pub system: Option<Scope<System>>,
}

/// Walks the user through the selection steps.
#[derive(Debug, Clone)]
pub struct Navigator {
    step: Step,
    selection: Selection,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            step: Step::Region,
            selection: Selection::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Record the region and move on to system selection.
    pub fn select_region(&mut self, region: Scope<Region>) -> Step {
        self.selection.region = Some(region);
        self.selection.system = None;
        self.step = Step::System;
        self.step
    }

    /// Record the system and move on to format selection.
    pub fn select_system(&mut self, system: Scope<System>) -> Step {
        if self.selection.region.is_none() {
            tracing::debug!("system selected before region; staying on region step");
            return self.step;
        }
        self.selection.system = Some(system);
        self.step = Step::Format;
        self.step
    }

    /// Pop one step. Returns `None` when backing out of the region view.
    pub fn back(&mut self) -> Option<Step> {
        match self.step {
            Step::Format => {
                self.selection.system = None;
                self.step = Step::System;
                Some(self.step)
            }
            Step::System => {
                self.selection.region = None;
                self.step = Step::Region;
                Some(self.step)
            }
            Step::Region => {
                self.reset();
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.step = Step::Region;
        self.selection = Selection::default();
    }
}

/// Count questions over the `Combined` expansion; `format = None` counts every format.
pub fn question_count(
    store: &ContentStore,
    region: Scope<Region>,
    system: Scope<System>,
    format: Option<Format>,
) -> usize {
    region
        .expand()
        .into_iter()
        .flat_map(|r| system.expand().into_iter().map(move |s| (r, s)))
        .filter_map(|(r, s)| store.section(r, s))
        .map(|section| section.count(format))
        .sum()
}

/// Total questions reachable from a region choice, across every system and format.
pub fn total_for_region(store: &ContentStore, region: Scope<Region>) -> usize {
    match region {
        Scope::Combined => Region::ALL
            .iter()
            .map(|r| question_count(store, Scope::Only(*r), Scope::Combined, None))
            .sum(),
        only => question_count(store, only, Scope::Combined, None),
    }
}

/// One selectable card in a selection view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionOption<T> {
    pub choice: T,
    pub label: String,
    pub count: usize,
    /// `false` when there is nothing to quiz on.
    pub enabled: bool,
}

impl<T> SelectionOption<T> {
    fn new(choice: T, label: impl Into<String>, count: usize) -> Self {
        Self {
            choice,
            label: label.into(),
            count,
            enabled: count > 0,
        }
    }
}

/// Region cards, followed by the combined card.
pub fn region_options(store: &ContentStore) -> Vec<SelectionOption<Scope<Region>>> {
    let mut options: Vec<_> = Region::ALL
        .iter()
        .map(|r| {
            SelectionOption::new(
                Scope::Only(*r),
                r.as_str(),
                total_for_region(store, Scope::Only(*r)),
            )
        })
        .collect();
    options.push(SelectionOption::new(
        Scope::Combined,
        "COMBINED REGIONS",
        total_for_region(store, Scope::Combined),
    ));
    options
}

/// System cards for the chosen region, followed by the combined card.
pub fn system_options(
    store: &ContentStore,
    region: Scope<Region>,
) -> Vec<SelectionOption<Scope<System>>> {
    let mut options: Vec<_> = System::ALL
        .iter()
        .map(|s| {
            SelectionOption::new(
                Scope::Only(*s),
                s.as_str(),
                question_count(store, region, Scope::Only(*s), None),
            )
        })
        .collect();
    options.push(SelectionOption::new(
        Scope::Combined,
        "COMBINED SYSTEMS",
        question_count(store, region, Scope::Combined, None),
    ));
    options
}

pub fn format_options(
    store: &ContentStore,
    region: Scope<Region>,
    system: Scope<System>,
) -> Vec<SelectionOption<Format>> {
    Format::ALL
        .iter()
        .map(|f| SelectionOption::new(*f, f.label(), question_count(store, region, system, Some(*f))))
        .collect()
}
