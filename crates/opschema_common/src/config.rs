#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpecialCaseMode {
    Enabled,
    Disabled, // Answer every query from the static annotations alone.
}

impl Default for SpecialCaseMode {
    fn default() -> Self {
        SpecialCaseMode::Enabled
    }
}

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub special_cases: SpecialCaseMode,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            special_cases: SpecialCaseMode::default(),
        }
    }
}
