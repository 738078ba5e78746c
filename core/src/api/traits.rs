use super::types::{Decision, LineRange, MrContext};

/// A pure, stateless function claiming responsibility for lines within a
/// section and returning a verdict over them.
///
/// Implementations must never mutate shared state and must be safe to
/// reconstruct fresh for every merge request (the registry hands out a new
/// boxed instance per evaluation via its factory, so `set_mr_context` never
/// leaks state across MRs).
pub trait Rule: Send + Sync {
    /// Stable rule identifier, matched against `SectionDefinition.ruleConfigs`.
    fn name(&self) -> &'static str;
    /// Short human-readable description, used by the reporter and registry listing.
    fn description(&self) -> &'static str;

    /// The lines within `content` this rule claims responsibility for. An
    /// empty result means the rule does not apply to this file. A rule that
    /// participates only through the enclosing section's range may return
    /// the sentinel `[{1,1}]`.
    fn covered_lines(&self, file_path: &str, content: &str) -> Vec<LineRange>;

    /// Deterministic verdict over `line_ranges` within `content`.
    fn validate_lines(&self, file_path: &str, content: &str, line_ranges: &[LineRange]) -> Decision;

    /// Optional hook for rules whose verdict depends on MR-wide data (e.g.
    /// whether the file being checked is new). Default is a no-op for rules
    /// that only need the file content passed to them directly.
    fn set_mr_context(&mut self, _ctx: &MrContext) {}
}

/// Produces a fresh, stateless `Rule` instance on demand.
pub type RuleFactory = Box<dyn Fn() -> Box<dyn Rule> + Send + Sync>;

/// Renders a `RuleEvaluation` for human or machine consumption. Pure: never
/// calls out to a forge client, and must be byte-identical for identical
/// inputs to support snapshot testing.
pub trait Reporter {
    fn report(&self, evaluation: &super::types::RuleEvaluation) -> String;
}
