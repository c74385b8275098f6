use crate::aggregate::AggregationService;
use crate::domain::Totals;

/// Observable state of the query boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No country chosen; the query is undefined and yields no output.
    Idle,
    Country(String),
    CountryState(String, String),
}

/// The reactive boundary between user selections and the aggregation
/// service. Owns the "state choices depend on the chosen country"
/// invariant; every transition into a selected state issues exactly one
/// totals query whose result replaces the previous display.
pub struct QueryController {
    service: AggregationService,
    selection: Selection,
    state_options: Vec<String>,
    totals: Option<Totals>,
}

impl QueryController {
    pub fn new(service: AggregationService) -> Self {
        Self {
            service,
            selection: Selection::Idle,
            state_options: Vec::new(),
            totals: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn country(&self) -> Option<&str> {
        match &self.selection {
            Selection::Idle => None,
            Selection::Country(country) | Selection::CountryState(country, _) => Some(country),
        }
    }

    /// Valid states for the current country, as repopulated by the last
    /// `select_country`.
    pub fn state_options(&self) -> &[String] {
        &self.state_options
    }

    /// Currently displayed totals; `None` while idle (output suspended).
    pub fn totals(&self) -> Option<Totals> {
        self.totals
    }

    pub fn service(&self) -> &AggregationService {
        &self.service
    }

    /// Move to `CountrySelected`: repopulate the state options, drop any
    /// previously selected state, and query the country-level totals.
    pub fn select_country(&mut self, country: &str) {
        self.state_options = self
            .service
            .dataset()
            .regions()
            .states_for(country)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.totals = Some(self.service.totals(country, None));
        self.selection = Selection::Country(country.to_string());
    }

    /// Narrow (or widen, with `None`) the current country's query. Ignored
    /// while idle; the state selector has no options to pick from then.
    pub fn select_state(&mut self, state: Option<&str>) {
        let Some(country) = self.country().map(str::to_string) else {
            return;
        };
        match state {
            Some(state) => {
                self.totals = Some(self.service.totals(&country, Some(state)));
                self.selection = Selection::CountryState(country, state.to_string());
            }
            None => {
                self.totals = Some(self.service.totals(&country, None));
                self.selection = Selection::Country(country);
            }
        }
    }

    /// Back to `Idle`: no query issued, output suspended.
    pub fn clear_country(&mut self) {
        self.selection = Selection::Idle;
        self.state_options.clear();
        self.totals = None;
    }
}
