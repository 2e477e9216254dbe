use std::fmt;

use crate::dom::dom_model::{Document, NodeId};

/// Answer to "save this form's data?" when a submit is intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Save,
    Ignore,
    /// Never ask again on this site.
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePrompt {
    Named(String),
    Cancelled,
}

/// One line in the "which form?" chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSummary {
    /// 1-based position on the page.
    pub index: usize,
    pub id: Option<String>,
    /// Last path segment of the form's `action`, leading slash included.
    pub action: Option<String>,
}

impl FormSummary {
    pub fn describe(doc: &Document, forms: &[NodeId]) -> Vec<FormSummary> {
        forms
            .iter()
            .enumerate()
            .map(|(i, &form)| FormSummary {
                index: i + 1,
                id: doc.non_empty_attr(form, "id").map(str::to_string),
                action: doc.non_empty_attr(form, "action").map(|action| {
                    match action.rfind('/') {
                        Some(pos) => action[pos..].to_string(),
                        None => action.to_string(),
                    }
                }),
            })
            .collect()
    }
}

impl fmt::Display for FormSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Form {}", self.index)?;
        if let Some(id) = &self.id {
            write!(f, " #{}", id)?;
        }
        if let Some(action) = &self.action {
            write!(f, " (action: {})", action)?;
        }
        Ok(())
    }
}

/// User-facing side of saving. The host shell owns presentation and makes
/// sure only one dialog is open at a time.
pub trait SaveDialog {
    fn confirm_save(&mut self) -> ConfirmOutcome;

    fn prompt_name(&mut self) -> NamePrompt;

    /// Pick one of several forms; `None` dismisses. Returns a 0-based index.
    fn choose_form(&mut self, forms: &[FormSummary]) -> Option<usize>;

    /// The page had nothing worth saving.
    fn nothing_to_save(&mut self) {}
}
