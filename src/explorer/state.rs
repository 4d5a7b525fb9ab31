//! Cascading selection state
//!
//! Every user action is an `Event`. `ExplorerState::apply` returns the next
//! state; a change at one stage empties every stage after it along with the
//! results and the zipcode panels.

use super::query::{BusinessRow, Catalog, CategoryCount, SearchFilter, ZipSummary};
use crate::error::Result;

pub const INCOMPLETE_SEARCH: &str = "Please select a state, city and zipcode before searching";

/// How far down the cascade the user has selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    NoSelection,
    StateChosen,
    CityChosen,
    ZipChosen,
    CategoryChosen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SelectState(String),
    SelectCity(String),
    SelectZip(String),
    SelectCategory(String),
    /// Re-read all selections and list businesses
    Search,
    /// Drop every selection; state options stay
    Clear,
}

/// One single-select list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    pub options: Vec<String>,
    pub selected: Option<String>,
}

impl Selector {
    fn with_options(options: Vec<String>) -> Self {
        Self {
            options,
            selected: None,
        }
    }

    fn reset(&mut self) {
        self.options.clear();
        self.selected = None;
    }

    fn offers(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerState {
    pub states: Selector,
    pub cities: Selector,
    pub zipcodes: Selector,
    pub categories: Selector,
    pub results: Vec<BusinessRow>,
    pub zip_summary: Option<ZipSummary>,
    pub top_categories: Vec<CategoryCount>,
    /// User-facing message from the last event
    pub notice: Option<String>,
    pub top_category_threshold: u32,
}

impl ExplorerState {
    /// Initial state with the state list populated
    pub fn new(catalog: &impl Catalog, top_category_threshold: u32) -> Result<Self> {
        Ok(Self {
            states: Selector::with_options(catalog.states()?),
            cities: Selector::default(),
            zipcodes: Selector::default(),
            categories: Selector::default(),
            results: Vec::new(),
            zip_summary: None,
            top_categories: Vec::new(),
            notice: None,
            top_category_threshold,
        })
    }

    pub fn stage(&self) -> Stage {
        match (
            &self.states.selected,
            &self.cities.selected,
            &self.zipcodes.selected,
            &self.categories.selected,
        ) {
            (None, ..) => Stage::NoSelection,
            (Some(_), None, ..) => Stage::StateChosen,
            (Some(_), Some(_), None, _) => Stage::CityChosen,
            (Some(_), Some(_), Some(_), None) => Stage::ZipChosen,
            (Some(_), Some(_), Some(_), Some(_)) => Stage::CategoryChosen,
        }
    }

    /// State, city and zipcode, when all three are selected
    pub fn filter(&self) -> Option<SearchFilter> {
        Some(SearchFilter {
            state: self.states.selected.clone()?,
            city: self.cities.selected.clone()?,
            zipcode: self.zipcodes.selected.clone()?,
            category: self.categories.selected.clone(),
        })
    }

    /// Compute the state that follows `event`. Selecting a value the list
    /// does not offer leaves the state unchanged.
    pub fn apply(&self, event: Event, catalog: &impl Catalog) -> Result<Self> {
        let mut next = self.clone();
        next.notice = None;

        match event {
            Event::SelectState(state) => {
                if !next.states.offers(&state) {
                    return Ok(next);
                }
                next.clear_below_state();
                next.cities.options = catalog.cities(&state)?;
                next.states.selected = Some(state);
            }

            Event::SelectCity(city) => {
                let Some(state) = next.states.selected.clone() else {
                    return Ok(next);
                };
                if !next.cities.offers(&city) {
                    return Ok(next);
                }
                next.clear_below_city();
                next.zipcodes.options = catalog.zipcodes(&state, &city)?;
                next.cities.selected = Some(city);
            }

            Event::SelectZip(zipcode) => {
                let (Some(state), Some(city)) =
                    (next.states.selected.clone(), next.cities.selected.clone())
                else {
                    return Ok(next);
                };
                if !next.zipcodes.offers(&zipcode) {
                    return Ok(next);
                }
                next.clear_below_zip();
                next.categories.options = catalog.categories(&state, &city, &zipcode)?;
                next.zip_summary = Some(catalog.zip_summary(&zipcode)?);
                next.top_categories =
                    catalog.top_categories(&zipcode, next.top_category_threshold)?;
                next.zipcodes.selected = Some(zipcode);
            }

            Event::SelectCategory(category) => {
                if next.zipcodes.selected.is_none() || !next.categories.offers(&category) {
                    return Ok(next);
                }
                next.results.clear();
                next.categories.selected = Some(category);
                if let Some(filter) = next.filter() {
                    next.results = catalog.businesses(&filter)?;
                }
            }

            Event::Search => match next.filter() {
                Some(filter) => next.results = catalog.businesses(&filter)?,
                None => next.notice = Some(INCOMPLETE_SEARCH.to_string()),
            },

            Event::Clear => {
                next.states.selected = None;
                next.clear_below_state();
            }
        }

        Ok(next)
    }

    fn clear_below_state(&mut self) {
        self.cities.reset();
        self.clear_below_city();
    }

    fn clear_below_city(&mut self) {
        self.zipcodes.reset();
        self.clear_below_zip();
    }

    fn clear_below_zip(&mut self) {
        self.categories.reset();
        self.results.clear();
        self.zip_summary = None;
        self.top_categories.clear();
    }
}
