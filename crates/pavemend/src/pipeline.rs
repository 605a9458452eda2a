//! Import pipeline facade: parse, validate, suggest, resolve, apply.
//!
//! Each stage consumes the previous stage's output and refuses to run out
//! of order. Callers who want the stages a la carte can use the free
//! functions (`parse`, `validate`, `suggest_fixes`, `apply_fixes`) directly;
//! the pipeline exists so the common path is one object and five calls.

use crate::apply::{apply_fixes, CleanedDataset};
use crate::error::{PavemendError, Result};
use crate::input::{parse, SurveyTable};
use crate::schema::{ProfileKind, SchemaProfile, SchemaRegistry};
use crate::session::ReconciliationSession;
use crate::suggest::{suggest_fixes, SuggestionSet};
use crate::validation::{validate, ValidationReport};

/// Where an import attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing imported yet.
    Idle,
    /// Raw text parsed into a table.
    Parsed,
    /// Validation found no defects; ready to apply as-is.
    Valid,
    /// Validation found defects; suggestions come next.
    Invalid,
    /// Suggestions computed and a session seeded from them.
    Suggested,
    /// Every blocker cleared; ready to apply.
    Resolved,
    /// Cleaned dataset produced.
    Applied,
}

impl PipelineState {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Parsed => "parsed",
            PipelineState::Valid => "valid",
            PipelineState::Invalid => "invalid",
            PipelineState::Suggested => "suggested",
            PipelineState::Resolved => "resolved",
            PipelineState::Applied => "applied",
        }
    }
}

/// One import attempt against one schema profile.
#[derive(Debug, Clone)]
pub struct ImportPipeline {
    profile: &'static SchemaProfile,
    current_year: i32,
    state: PipelineState,
    table: Option<SurveyTable>,
    report: Option<ValidationReport>,
    suggestions: Option<SuggestionSet>,
    session: ReconciliationSession,
    dataset: Option<CleanedDataset>,
}

impl ImportPipeline {
    /// Start an attempt for a known profile.
    ///
    /// `current_year` is injected by the caller so year bounds are stable
    /// for the whole attempt regardless of when each stage runs.
    pub fn new(kind: ProfileKind, current_year: i32) -> Self {
        Self {
            profile: SchemaRegistry::get(kind),
            current_year,
            state: PipelineState::Idle,
            table: None,
            report: None,
            suggestions: None,
            session: ReconciliationSession::new(),
            dataset: None,
        }
    }

    /// Start an attempt for a profile named at runtime.
    pub fn for_profile(name: &str, current_year: i32) -> Result<Self> {
        Ok(Self::new(name.parse()?, current_year))
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn profile(&self) -> &'static SchemaProfile {
        self.profile
    }

    /// Parse raw delimited text. First stage; valid only from `Idle`.
    pub fn parse_text(&mut self, text: &str) -> Result<&SurveyTable> {
        self.expect_state(PipelineState::Idle, "idle")?;
        let table = parse(text)?;
        self.table = Some(table);
        self.state = PipelineState::Parsed;
        Ok(self.table.as_ref().ok_or_else(Self::missing_table)?)
    }

    /// Run every detector. Moves to `Valid` or `Invalid`.
    pub fn validate(&mut self) -> Result<&ValidationReport> {
        self.expect_state(PipelineState::Parsed, "parsed")?;
        let table = self.table.as_ref().ok_or_else(Self::missing_table)?;
        let report = validate(table, self.profile, self.current_year);
        self.state = if report.is_clean() {
            PipelineState::Valid
        } else {
            PipelineState::Invalid
        };
        self.report = Some(report);
        Ok(self.report.as_ref().ok_or_else(Self::missing_table)?)
    }

    /// Compute suggestions for a defective table and seed the session from
    /// them. Valid only from `Invalid`.
    pub fn suggest(&mut self) -> Result<&SuggestionSet> {
        self.expect_state(PipelineState::Invalid, "invalid")?;
        let table = self.table.as_ref().ok_or_else(Self::missing_table)?;
        let report = self.report.as_ref().ok_or_else(Self::missing_table)?;
        let set = suggest_fixes(report, table, self.profile, self.current_year);
        self.session = ReconciliationSession::from_suggestions(&set);
        self.suggestions = Some(set);
        self.state = PipelineState::Suggested;
        Ok(self.suggestions.as_ref().ok_or_else(Self::missing_table)?)
    }

    /// Mutable access to the decision state, for overrides, drops, duplicate
    /// choices, and value fixes. Valid from `Suggested` on.
    pub fn session_mut(&mut self) -> Result<&mut ReconciliationSession> {
        match self.state {
            PipelineState::Suggested | PipelineState::Resolved => {
                // Edits can invalidate a prior resolution; re-check on resolve.
                self.state = PipelineState::Suggested;
                Ok(&mut self.session)
            }
            _ => Err(self.wrong_state("suggested")),
        }
    }

    /// Everything still blocking the apply step.
    pub fn readiness(&self) -> Result<Vec<String>> {
        let table = self.table.as_ref().ok_or_else(|| self.wrong_state("suggested"))?;
        let report = self.report.as_ref().ok_or_else(|| self.wrong_state("suggested"))?;
        Ok(self
            .session
            .readiness(table, report, self.profile, self.current_year))
    }

    /// Confirm every blocker is cleared. Moves `Suggested` to `Resolved`;
    /// fails with the blocker list otherwise.
    pub fn resolve(&mut self) -> Result<()> {
        self.expect_state(PipelineState::Suggested, "suggested")?;
        let blockers = self.readiness()?;
        if !blockers.is_empty() {
            return Err(PavemendError::NotReady { blockers });
        }
        self.state = PipelineState::Resolved;
        Ok(())
    }

    /// Produce the cleaned dataset. Valid from `Resolved`, or directly from
    /// `Valid` (a clean table still gets canonical renaming and ordering).
    pub fn apply(&mut self) -> Result<&CleanedDataset> {
        match self.state {
            PipelineState::Valid | PipelineState::Resolved => {}
            _ => return Err(self.wrong_state("valid or resolved")),
        }
        let table = self.table.as_ref().ok_or_else(Self::missing_table)?;
        let report = self.report.as_ref().ok_or_else(Self::missing_table)?;
        let dataset = apply_fixes(
            table,
            report,
            &self.session,
            self.profile,
            self.current_year,
        )?;
        self.dataset = Some(dataset);
        self.state = PipelineState::Applied;
        Ok(self.dataset.as_ref().ok_or_else(Self::missing_table)?)
    }

    pub fn table(&self) -> Option<&SurveyTable> {
        self.table.as_ref()
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    pub fn suggestions(&self) -> Option<&SuggestionSet> {
        self.suggestions.as_ref()
    }

    pub fn dataset(&self) -> Option<&CleanedDataset> {
        self.dataset.as_ref()
    }

    fn expect_state(&self, state: PipelineState, expected: &'static str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.wrong_state(expected))
        }
    }

    fn wrong_state(&self, expected: &'static str) -> PavemendError {
        PavemendError::InvalidState {
            expected,
            found: self.state.label(),
        }
    }

    fn missing_table() -> PavemendError {
        PavemendError::InvalidState {
            expected: "parsed",
            found: "idle",
        }
    }
}
