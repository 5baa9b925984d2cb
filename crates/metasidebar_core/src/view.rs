//! Derived, stateless view model for the sidebar.

use crate::models::{MetadataEditor, MetadataTemplate};
use crate::store::EditorListState;
use serde::Serialize;

/// One entry of the add-template control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateOption<'a> {
    pub template: &'a MetadataTemplate,
    /// The template is already attached to the file.
    pub in_use: bool,
}

/// Add-template control, shown only to users who can edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplatePicker<'a> {
    pub options: Vec<TemplateOption<'a>>,
}

impl<'a> TemplatePicker<'a> {
    /// Templates that can still be attached.
    pub fn available(&self) -> Vec<&'a MetadataTemplate> {
        self.options
            .iter()
            .filter(|option| !option.in_use)
            .map(|option| option.template)
            .collect()
    }
}

/// What the sidebar displays for a given state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SidebarView<'a> {
    /// Initial list has not completed.
    Loading,
    /// Any request failed; shown exclusively.
    Error,
    /// No metadata attached yet.
    Empty {
        add_control: Option<TemplatePicker<'a>>,
        busy: bool,
    },
    /// Attached editors in display order.
    Editors {
        editors: &'a [MetadataEditor],
        read_only: bool,
        add_control: Option<TemplatePicker<'a>>,
        busy: bool,
    },
}

impl<'a> SidebarView<'a> {
    pub fn add_control(&self) -> Option<&TemplatePicker<'a>> {
        match self {
            Self::Empty { add_control, .. } | Self::Editors { add_control, .. } => {
                add_control.as_ref()
            }
            Self::Loading | Self::Error => None,
        }
    }

    /// Whether a mutation is in flight over loaded content.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Empty { busy, .. } | Self::Editors { busy, .. } => *busy,
            Self::Loading | Self::Error => false,
        }
    }
}

/// Project a state snapshot and the edit permission into a view.
pub fn project(state: &EditorListState, can_edit: bool) -> SidebarView<'_> {
    if state.has_error {
        return SidebarView::Error;
    }
    let (Some(editors), Some(templates)) = (state.editors.as_deref(), state.templates.as_deref())
    else {
        return SidebarView::Loading;
    };

    let add_control = if can_edit {
        template_picker(editors, templates)
    } else {
        None
    };
    let busy = state.is_loading;

    if editors.is_empty() {
        SidebarView::Empty { add_control, busy }
    } else {
        SidebarView::Editors {
            editors,
            read_only: !can_edit,
            add_control,
            busy,
        }
    }
}

fn template_picker<'a>(
    editors: &'a [MetadataEditor],
    templates: &'a [MetadataTemplate],
) -> Option<TemplatePicker<'a>> {
    let options: Vec<TemplateOption<'a>> = templates
        .iter()
        .filter(|template| !template.hidden)
        .map(|template| TemplateOption {
            template,
            in_use: editors
                .iter()
                .any(|editor| editor.instance.is_instance_of(template)),
        })
        .collect();
    (!options.is_empty()).then_some(TemplatePicker { options })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{editor, state_with, template};

    #[test]
    fn uninitialized_state_shows_loading() {
        let state = EditorListState::default().set_loading(true);
        assert_eq!(project(&state, true), SidebarView::Loading);
    }

    #[test]
    fn error_is_exclusive_even_with_editors_loaded() {
        let state = state_with(&["1"]).set_loading(true).set_error(true);
        assert_eq!(project(&state, true), SidebarView::Error);

        let failed_list = EditorListState::default().set_error(true);
        let view = project(&failed_list, true);
        assert_eq!(view, SidebarView::Error);
        assert!(view.add_control().is_none());
        assert!(!view.is_busy());
    }

    #[test]
    fn empty_editors_with_templates_shows_empty_state_with_add() {
        let state = EditorListState::default().initialize(Vec::new(), vec![template("t1")]);
        let view = project(&state, true);
        match &view {
            SidebarView::Empty { add_control, busy } => {
                assert!(!busy);
                let picker = add_control.as_ref().expect("add control");
                let keys: Vec<&str> = picker
                    .available()
                    .into_iter()
                    .map(|template| template.template_key.as_str())
                    .collect();
                assert_eq!(keys, vec!["t1"]);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn add_control_requires_edit_permission_and_templates() {
        let state = EditorListState::default().initialize(Vec::new(), vec![template("t1")]);
        assert!(project(&state, false).add_control().is_none());

        let no_templates = EditorListState::default().initialize(vec![editor("1")], Vec::new());
        assert!(project(&no_templates, true).add_control().is_none());

        let mut hidden = template("secret");
        hidden.hidden = true;
        let only_hidden = EditorListState::default().initialize(Vec::new(), vec![hidden]);
        assert!(project(&only_hidden, true).add_control().is_none());
    }

    #[test]
    fn populated_view_lists_editors_and_marks_used_templates() {
        let mut state = state_with(&["1", "2"]);
        state.templates = Some(vec![template("t1"), template("t2")]);
        let view = project(&state, true);
        match &view {
            SidebarView::Editors {
                editors,
                read_only,
                add_control,
                busy,
            } => {
                let ids: Vec<&str> = editors.iter().map(MetadataEditor::id).collect();
                assert_eq!(ids, vec!["1", "2"]);
                assert!(!read_only);
                assert!(!busy);
                let picker = add_control.as_ref().expect("add control");
                let in_use: Vec<(&str, bool)> = picker
                    .options
                    .iter()
                    .map(|option| (option.template.template_key.as_str(), option.in_use))
                    .collect();
                assert_eq!(in_use, vec![("t1", true), ("t2", false)]);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn read_only_users_see_editors_without_add_control() {
        let loaded = state_with(&["1"]);
        let view = project(&loaded, false);
        match view {
            SidebarView::Editors {
                read_only,
                add_control,
                ..
            } => {
                assert!(read_only);
                assert!(add_control.is_none());
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn in_flight_mutation_marks_loaded_view_busy() {
        let state = state_with(&["1"]).set_loading(true);
        assert!(project(&state, true).is_busy());
    }

    #[test]
    fn view_serializes_with_kind_tag() {
        let state = EditorListState::default().initialize(Vec::new(), Vec::new());
        let value = serde_json::to_value(project(&state, true)).expect("serialize");
        assert_eq!(value["kind"], "empty");
        assert_eq!(value["add_control"], serde_json::Value::Null);
    }
}
