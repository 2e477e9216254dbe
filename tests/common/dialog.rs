use std::collections::VecDeque;

use form_snapshot::workflow::dialog::{ConfirmOutcome, FormSummary, NamePrompt, SaveDialog};

/// Dialog that replays queued answers and records what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    pub confirms: VecDeque<ConfirmOutcome>,
    pub names: VecDeque<NamePrompt>,
    pub form_choice: Option<usize>,

    pub confirm_calls: u32,
    pub name_calls: u32,
    pub offered_forms: Vec<FormSummary>,
    pub nothing_to_save_calls: u32,
}

impl ScriptedDialog {
    pub fn naming(name: &str) -> Self {
        ScriptedDialog {
            names: VecDeque::from([NamePrompt::Named(name.to_string())]),
            ..Default::default()
        }
    }

    pub fn confirming(outcome: ConfirmOutcome, name: &str) -> Self {
        ScriptedDialog {
            confirms: VecDeque::from([outcome]),
            ..Self::naming(name)
        }
    }

    pub fn choosing(form: usize, name: &str) -> Self {
        ScriptedDialog {
            form_choice: Some(form),
            ..Self::naming(name)
        }
    }
}

impl SaveDialog for ScriptedDialog {
    fn confirm_save(&mut self) -> ConfirmOutcome {
        self.confirm_calls += 1;
        self.confirms.pop_front().unwrap_or(ConfirmOutcome::Ignore)
    }

    fn prompt_name(&mut self) -> NamePrompt {
        self.name_calls += 1;
        self.names.pop_front().unwrap_or(NamePrompt::Cancelled)
    }

    fn choose_form(&mut self, forms: &[FormSummary]) -> Option<usize> {
        self.offered_forms = forms.to_vec();
        self.form_choice
    }

    fn nothing_to_save(&mut self) {
        self.nothing_to_save_calls += 1;
    }
}
