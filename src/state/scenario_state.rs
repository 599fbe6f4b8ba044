//! Scenario State
//!
//! Lifecycle of named scenarios over the live settings: first-render
//! selection, save-as, activate, delete, reload, import/export, and the
//! modified flag.
//!
//! ```text
//! UI command ─► ScenarioController::dispatch ─► repository / bridge ─► AppEvent ─► UI
//! ```
//!
//! The controller is constructed once at startup and handed to the UI layer.
//! It owns its listener handles so re-rendered containers can reattach.

use crate::constants::DEFAULT_SCENARIO_NAME;
use crate::domain::inheritance::{ResolvedField, resolve_field, resolve_fields};
use crate::domain::scenario::{SettingKind, validate_import};
use crate::error::{Error, Result};
use crate::eventing::AppEvent;
use crate::helpers::{export_file_name, file_extension, normalize_scenario_name, scenario_name_from_file};
use crate::services::{ActiveSettingsBridge, ConfigurationRepository};
use crate::state::change_tracker::{ChangeTracker, ListenerHandle, TrackedControl};
use crate::storage::SharedStore;
use crossbeam_channel::{Receiver, Sender};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// What to do when a save or import targets an existing name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Stop and ask the user first
    #[default]
    Ask,
    /// Replace without asking (the user already confirmed)
    Overwrite,
}

/// Result of first-render selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A previously active scenario is still present
    Restored { name: String },
    /// No active scenario was set; one was picked
    Selected { name: String },
    /// No scenarios exist
    Empty,
}

/// Result of a save-as request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { name: String, replaced: bool },
    ConfirmOverwrite { name: String },
}

/// Result of an import request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { name: String, replaced: bool },
    ConfirmOverwrite { name: String },
}

/// A scenario rendered as a downloadable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedScenario {
    pub file_name: String,
    pub contents: String,
}

/// Affordance offered when reloading the active scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadPrompt {
    /// No unsaved changes: a plain "load" action
    Load { name: String },
    /// Unsaved changes: discard-and-load, save-then-load, or cancel
    UnsavedChanges { name: String },
}

/// User's answer to a reload prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadChoice {
    DiscardAndLoad,
    SaveThenLoad,
    Cancel,
}

/// Closed set of user actions handled by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioCommand {
    SaveAs {
        name: String,
        policy: OverwritePolicy,
    },
    Activate {
        name: String,
    },
    Delete {
        name: String,
    },
    Reload {
        choice: ReloadChoice,
    },
    ResetOverride {
        field: String,
        kind: SettingKind,
    },
    Import {
        file_name: String,
        contents: String,
        policy: OverwritePolicy,
    },
    Export {
        name: String,
    },
    ControlChanged {
        handle: ListenerHandle,
        control: TrackedControl,
    },
}

/// What a dispatched command produced
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Completed,
    /// Nothing happened (stale listener, cancelled reload, flag already set)
    Ignored,
    /// Re-dispatch with `OverwritePolicy::Overwrite` to proceed
    ConfirmOverwrite { name: String },
    Exported(ExportedScenario),
    Row(ResolvedField),
    Failed { message: String },
}

/// Scenario lifecycle controller
pub struct ScenarioController {
    repository: ConfigurationRepository,
    bridge: ActiveSettingsBridge,
    tracker: ChangeTracker,
    events: Sender<AppEvent>,
}

impl ScenarioController {
    /// Create a controller over `store`, sending events to `events`
    pub fn new(store: SharedStore, events: Sender<AppEvent>) -> Self {
        Self {
            repository: ConfigurationRepository::new(store.clone()),
            bridge: ActiveSettingsBridge::new(store),
            tracker: ChangeTracker::new(),
            events,
        }
    }

    /// Create a controller with its own event channel
    pub fn with_channel(store: SharedStore) -> (Self, Receiver<AppEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(store, tx), rx)
    }

    fn emit(&self, event: AppEvent) {
        let _ = self.events.send(event);
    }

    fn emit_list_changed(&self) {
        self.emit(AppEvent::ScenariosChanged {
            names: self.repository.names(),
            active: self.bridge.active_name(),
        });
    }

    // ==================== Getters ====================

    pub fn repository(&self) -> &ConfigurationRepository {
        &self.repository
    }

    pub fn bridge(&self) -> &ActiveSettingsBridge {
        &self.bridge
    }

    pub fn names(&self) -> Vec<String> {
        self.repository.names()
    }

    pub fn active_name(&self) -> Option<String> {
        self.bridge.active_name()
    }

    pub fn is_modified(&self) -> bool {
        self.bridge.is_modified()
    }

    // ==================== Listeners ====================

    /// Attach (or reattach after re-render) change tracking to a container
    pub fn attach_change_tracking(&mut self, container: &str) -> ListenerHandle {
        self.tracker.attach(container)
    }

    pub fn detach_change_tracking(&mut self, handle: &ListenerHandle) -> bool {
        self.tracker.detach(handle)
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Drop every listener handle
    pub fn shutdown(&mut self) {
        self.tracker.detach_all();
        debug!("Scenario controller listeners detached");
    }

    // ==================== Lifecycle ====================

    /// First-render selection of the active scenario
    ///
    /// An active name that no longer exists is dropped before selecting.
    pub fn initialize(&mut self) -> Result<InitOutcome> {
        if let Some(active) = self.bridge.active_name() {
            if self.repository.contains(&active) {
                debug!(scenario = %active, "Keeping active scenario");
                self.emit_list_changed();
                return Ok(InitOutcome::Restored { name: active });
            }
            warn!(scenario = %active, "Active scenario no longer exists");
            self.bridge.clear_active_name()?;
        }

        let names = self.repository.names();
        let pick = if names.iter().any(|n| n == DEFAULT_SCENARIO_NAME) {
            Some(DEFAULT_SCENARIO_NAME.to_string())
        } else {
            names.first().cloned()
        };

        let outcome = match pick {
            Some(name) => {
                self.bridge.set_active_name(&name)?;
                self.bridge.set_modified(false)?;
                info!(scenario = %name, "Selected initial scenario");
                InitOutcome::Selected { name }
            }
            None => {
                self.bridge.clear_modified()?;
                debug!("No saved scenarios");
                InitOutcome::Empty
            }
        };

        self.emit_list_changed();
        Ok(outcome)
    }

    /// Mark the live settings as diverged from the active scenario
    ///
    /// No-op without an active scenario or when already marked; returns whether
    /// the flag flipped.
    pub fn mark_modified(&mut self) -> Result<bool> {
        if self.bridge.active_name().is_none() || self.bridge.is_modified() {
            return Ok(false);
        }
        self.bridge.set_modified(true)?;
        self.emit(AppEvent::ModifiedChanged { modified: true });
        Ok(true)
    }

    /// A tracked control changed inside an attached container
    pub fn on_control_changed(&mut self, handle: &ListenerHandle, control: TrackedControl) -> Result<bool> {
        if !self.tracker.is_live(handle) {
            debug!(container = handle.container(), ?control, "Ignoring change from stale listener");
            return Ok(false);
        }
        self.mark_modified()
    }

    /// Save the live settings under `name`
    pub fn save_current_as(&mut self, name: &str, policy: OverwritePolicy) -> Result<SaveOutcome> {
        let name = normalize_scenario_name(name).ok_or(Error::InvalidName)?;
        let exists = self.repository.contains(name);

        if exists && policy == OverwritePolicy::Ask {
            return Ok(SaveOutcome::ConfirmOverwrite {
                name: name.to_string(),
            });
        }

        let snapshot = self.bridge.read_live_settings();
        let name = self.repository.put(name, &snapshot)?;
        self.bridge.set_active_name(&name)?;
        self.bridge.set_modified(false)?;

        self.emit(AppEvent::ModifiedChanged { modified: false });
        self.emit_list_changed();
        self.emit(AppEvent::success(format!("Scenario '{name}' saved")));

        Ok(SaveOutcome::Saved {
            name,
            replaced: exists,
        })
    }

    /// Push a saved scenario into the live settings and notify listeners
    pub fn activate(&mut self, name: &str) -> Result<()> {
        let name = normalize_scenario_name(name).ok_or(Error::InvalidName)?;
        let settings = self.repository.get(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })?;

        self.bridge.write_live_settings(&settings)?;
        self.bridge.set_active_name(name)?;
        info!(scenario = name, "Activated scenario");

        self.emit(AppEvent::ScenarioActivated {
            name: name.to_string(),
            settings,
        });
        self.emit(AppEvent::ModifiedChanged { modified: false });
        self.emit_list_changed();
        self.emit(AppEvent::success(format!("Scenario '{name}' loaded")));
        Ok(())
    }

    /// Delete a saved scenario other than the active one
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let name = normalize_scenario_name(name).ok_or(Error::InvalidName)?;

        if self.bridge.active_name().as_deref() == Some(name) {
            return Err(Error::DeleteActive {
                name: name.to_string(),
            });
        }

        let removed = self.repository.delete(name)?;
        if removed {
            self.emit_list_changed();
            self.emit(AppEvent::success(format!("Scenario '{name}' deleted")));
        } else {
            self.emit(AppEvent::warn(format!("Scenario '{name}' does not exist")));
        }
        Ok(removed)
    }

    /// Which reload affordance to show for the active scenario
    pub fn reload_prompt(&self) -> Result<ReloadPrompt> {
        let name = self.bridge.active_name().ok_or_else(|| Error::Invalid {
            message: "No active scenario to reload".to_string(),
        })?;

        Ok(if self.bridge.is_modified() {
            ReloadPrompt::UnsavedChanges { name }
        } else {
            ReloadPrompt::Load { name }
        })
    }

    /// Carry out the user's reload choice; returns whether the scenario was loaded
    pub fn resolve_reload(&mut self, choice: ReloadChoice) -> Result<bool> {
        let name = match self.reload_prompt()? {
            ReloadPrompt::Load { name } | ReloadPrompt::UnsavedChanges { name } => name,
        };

        match choice {
            ReloadChoice::Cancel => Ok(false),
            ReloadChoice::DiscardAndLoad => {
                self.activate(&name)?;
                Ok(true)
            }
            ReloadChoice::SaveThenLoad => {
                self.save_current_as(&name, OverwritePolicy::Overwrite)?;
                self.activate(&name)?;
                Ok(true)
            }
        }
    }

    // ==================== Post-Transform Table ====================

    /// Resolved row of the post-transform settings table
    pub fn post_transform_row(&self, field: &str) -> ResolvedField {
        resolve_field(
            field,
            &self.bridge.post_transform_settings(),
            &self.bridge.field_settings(),
        )
    }

    /// Resolved rows for every post-transform field, in order
    pub fn post_transform_rows<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Vec<ResolvedField> {
        resolve_fields(
            fields,
            &self.bridge.post_transform_settings(),
            &self.bridge.field_settings(),
        )
    }

    /// Drop a post-transform override so the field falls back to its
    /// inherited or default value
    ///
    /// The flag is updated before the row is re-resolved; the returned row is
    /// a projection of stored state.
    pub fn reset_override(&mut self, field: &str, kind: SettingKind) -> Result<ResolvedField> {
        let mut post = self.bridge.post_transform_settings();
        if post.clear(field, kind) {
            self.bridge.set_post_transform_settings(&post)?;
            self.mark_modified()?;
            debug!(field, ?kind, "Reset post-transform override");
        }

        let row = self.post_transform_row(field);
        self.emit(AppEvent::PostTransformRowChanged { row: row.clone() });
        Ok(row)
    }

    // ==================== Import / Export ====================

    /// Import a scenario file; its contents are stored as-is
    pub fn import(&mut self, file_name: &str, contents: &str, policy: OverwritePolicy) -> Result<ImportOutcome> {
        if file_extension(file_name).as_deref() != Some("json") {
            return Err(Error::UnsupportedFile {
                file_name: file_name.to_string(),
                expected: ".json",
            });
        }

        let document: Value = serde_json::from_str(contents)?;
        validate_import(&document)?;

        let name = scenario_name_from_file(file_name);
        let exists = self.repository.contains(&name);
        if exists && policy == OverwritePolicy::Ask {
            return Ok(ImportOutcome::ConfirmOverwrite { name });
        }

        let name = self.repository.put_raw(&name, document)?;
        self.emit_list_changed();
        self.emit(AppEvent::success(format!("Scenario '{name}' imported")));

        Ok(ImportOutcome::Imported {
            name,
            replaced: exists,
        })
    }

    /// Render a saved scenario as pretty-printed JSON
    pub fn export(&self, name: &str) -> Result<ExportedScenario> {
        let name = normalize_scenario_name(name).ok_or(Error::InvalidName)?;
        let configuration = self.repository.get(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })?;

        Ok(ExportedScenario {
            file_name: export_file_name(name),
            contents: serde_json::to_string_pretty(&configuration)?,
        })
    }

    // ==================== Dispatch ====================

    /// Handle one user command; failures become status messages
    pub fn dispatch(&mut self, command: ScenarioCommand) -> CommandOutcome {
        let result = match command {
            ScenarioCommand::SaveAs { name, policy } => {
                self.save_current_as(&name, policy).map(|outcome| match outcome {
                    SaveOutcome::Saved { .. } => CommandOutcome::Completed,
                    SaveOutcome::ConfirmOverwrite { name } => CommandOutcome::ConfirmOverwrite { name },
                })
            }
            ScenarioCommand::Activate { name } => self.activate(&name).map(|_| CommandOutcome::Completed),
            ScenarioCommand::Delete { name } => self.delete(&name).map(|removed| {
                if removed {
                    CommandOutcome::Completed
                } else {
                    CommandOutcome::Ignored
                }
            }),
            ScenarioCommand::Reload { choice } => self.resolve_reload(choice).map(|loaded| {
                if loaded {
                    CommandOutcome::Completed
                } else {
                    CommandOutcome::Ignored
                }
            }),
            ScenarioCommand::ResetOverride { field, kind } => {
                self.reset_override(&field, kind).map(CommandOutcome::Row)
            }
            ScenarioCommand::Import {
                file_name,
                contents,
                policy,
            } => self
                .import(&file_name, &contents, policy)
                .map(|outcome| match outcome {
                    ImportOutcome::Imported { .. } => CommandOutcome::Completed,
                    ImportOutcome::ConfirmOverwrite { name } => CommandOutcome::ConfirmOverwrite { name },
                }),
            ScenarioCommand::Export { name } => self.export(&name).map(CommandOutcome::Exported),
            ScenarioCommand::ControlChanged { handle, control } => {
                self.on_control_changed(&handle, control).map(|flipped| {
                    if flipped {
                        CommandOutcome::Completed
                    } else {
                        CommandOutcome::Ignored
                    }
                })
            }
        };

        result.unwrap_or_else(|e| {
            let message = e.to_string();
            match e {
                Error::InvalidName
                | Error::NotFound { .. }
                | Error::DeleteActive { .. }
                | Error::MissingImportKeys { .. }
                | Error::UnsupportedFile { .. }
                | Error::Json { .. }
                | Error::Invalid { .. } => {
                    warn!(error = %message, "Scenario command rejected");
                    self.emit(AppEvent::warn(message.clone()));
                }
                _ => {
                    error!(error = %message, "Scenario command failed");
                    self.emit(AppEvent::error(message.clone()));
                }
            }
            CommandOutcome::Failed { message }
        })
    }
}

impl std::fmt::Debug for ScenarioController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioController")
            .field("repository", &self.repository)
            .field("bridge", &self.bridge)
            .field("listeners", &self.tracker.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{LIVE_FILTERS_KEY, MODIFIED_FLAG_KEY};
    use crate::domain::inheritance::ValueSource;
    use crate::domain::scenario::NamedConfiguration;
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn controller() -> (Arc<MemoryStore>, ScenarioController, Receiver<AppEvent>) {
        let store = Arc::new(MemoryStore::new());
        let (controller, rx) = ScenarioController::with_channel(store.clone());
        (store, controller, rx)
    }

    fn price_filter() -> Vec<Value> {
        vec![json!({"field": "price", "op": ">", "value": 10})]
    }

    #[test]
    fn initialize_prefers_default() {
        let (_, mut ctl, _rx) = controller();
        for name in ["Alpha", "Default", "Zeta"] {
            ctl.repository().put(name, &NamedConfiguration::default()).expect("put");
        }

        let outcome = ctl.initialize().expect("init");
        assert_eq!(outcome, InitOutcome::Selected { name: "Default".into() });
        assert_eq!(ctl.active_name().as_deref(), Some("Default"));
        assert!(!ctl.is_modified());
    }

    #[test]
    fn initialize_picks_first_alphabetically_without_default() {
        let (_, mut ctl, _rx) = controller();
        for name in ["beta", "Alpha"] {
            ctl.repository().put(name, &NamedConfiguration::default()).expect("put");
        }

        assert_eq!(
            ctl.initialize().expect("init"),
            InitOutcome::Selected { name: "Alpha".into() }
        );
    }

    #[test]
    fn initialize_with_no_scenarios_clears_flag() {
        let (store, mut ctl, _rx) = controller();
        store.set_item(MODIFIED_FLAG_KEY, "true").expect("seed");

        assert_eq!(ctl.initialize().expect("init"), InitOutcome::Empty);
        assert_eq!(ctl.active_name(), None);
        assert_eq!(store.get_item(MODIFIED_FLAG_KEY), None);
    }

    #[test]
    fn initialize_keeps_existing_active_scenario() {
        let (_, mut ctl, _rx) = controller();
        ctl.repository().put("Default", &NamedConfiguration::default()).expect("put");
        ctl.repository().put("Mine", &NamedConfiguration::default()).expect("put");
        ctl.bridge().set_active_name("Mine").expect("active");
        ctl.bridge().set_modified(true).expect("flag");

        assert_eq!(
            ctl.initialize().expect("init"),
            InitOutcome::Restored { name: "Mine".into() }
        );
        assert!(ctl.is_modified());
    }

    #[test]
    fn save_then_activate_default_scenario() {
        let (store, mut ctl, rx) = controller();
        ctl.bridge().set_filters(&price_filter()).expect("filters");

        let saved = ctl
            .save_current_as("Default", OverwritePolicy::Ask)
            .expect("save");
        assert_eq!(
            saved,
            SaveOutcome::Saved { name: "Default".into(), replaced: false }
        );

        // Diverge the live filters, then load the scenario back
        ctl.bridge().set_filters(&[]).expect("clear filters");
        ctl.bridge().set_modified(true).expect("flag");
        ctl.activate("Default").expect("activate");

        let live: Value = serde_json::from_str(&store.get_item(LIVE_FILTERS_KEY).expect("filters"))
            .expect("json");
        assert_eq!(live, json!([{"field": "price", "op": ">", "value": 10}]));
        assert!(!ctl.is_modified());

        let activated = rx.try_iter().find_map(|e| match e {
            AppEvent::ScenarioActivated { name, settings } => Some((name, settings)),
            _ => None,
        });
        let (name, settings) = activated.expect("activation event");
        assert_eq!(name, "Default");
        assert_eq!(settings.filters, price_filter());
    }

    #[test]
    fn saved_scenario_equals_live_snapshot() {
        let (_, mut ctl, _rx) = controller();
        ctl.bridge().set_filters(&price_filter()).expect("filters");
        ctl.bridge()
            .set_rules(&[json!({"type": "ratio", "output": "pe_growth"})])
            .expect("rules");

        let snapshot = ctl.bridge().read_live_settings();
        ctl.save_current_as("X", OverwritePolicy::Ask).expect("save");
        assert_eq!(ctl.repository().get("X"), Some(snapshot));
    }

    #[test]
    fn activation_is_idempotent() {
        let (_, mut ctl, _rx) = controller();
        ctl.bridge().set_filters(&price_filter()).expect("filters");
        ctl.save_current_as("N", OverwritePolicy::Ask).expect("save");

        ctl.activate("N").expect("first");
        let first = ctl.bridge().read_live_settings();
        assert!(!ctl.is_modified());

        ctl.activate("N").expect("second");
        assert_eq!(ctl.bridge().read_live_settings(), first);
        assert!(!ctl.is_modified());
    }

    #[test]
    fn existing_name_needs_confirmation() {
        let (_, mut ctl, _rx) = controller();
        ctl.save_current_as("X", OverwritePolicy::Ask).expect("save");

        assert_eq!(
            ctl.save_current_as("X", OverwritePolicy::Ask).expect("ask"),
            SaveOutcome::ConfirmOverwrite { name: "X".into() }
        );
        assert_eq!(
            ctl.save_current_as("X", OverwritePolicy::Overwrite).expect("overwrite"),
            SaveOutcome::Saved { name: "X".into(), replaced: true }
        );
    }

    #[test]
    fn deleting_active_scenario_is_rejected() {
        let (_, mut ctl, _rx) = controller();
        ctl.save_current_as("Active", OverwritePolicy::Ask).expect("save");
        ctl.repository().put("Other", &NamedConfiguration::default()).expect("put");

        assert!(matches!(ctl.delete("Active"), Err(Error::DeleteActive { .. })));
        assert_eq!(ctl.names(), vec!["Active", "Other"]);

        assert!(ctl.delete("Other").expect("delete other"));
        assert_eq!(ctl.names(), vec!["Active"]);
    }

    #[test]
    fn modified_flag_requires_active_scenario_and_live_listener() {
        let (_, mut ctl, rx) = controller();
        let handle = ctl.attach_change_tracking("filters-panel");

        // No active scenario yet
        assert!(!ctl.on_control_changed(&handle, TrackedControl::FilterButton).expect("change"));

        ctl.save_current_as("S", OverwritePolicy::Ask).expect("save");
        assert!(ctl.on_control_changed(&handle, TrackedControl::FilterButton).expect("change"));
        // Already modified
        assert!(!ctl.on_control_changed(&handle, TrackedControl::TipInput).expect("change"));
        assert!(ctl.is_modified());

        let flips = rx
            .try_iter()
            .filter(|e| matches!(e, AppEvent::ModifiedChanged { modified: true }))
            .count();
        assert_eq!(flips, 1);
    }

    #[test]
    fn stale_listener_changes_are_ignored() {
        let (_, mut ctl, _rx) = controller();
        ctl.save_current_as("S", OverwritePolicy::Ask).expect("save");

        let old = ctl.attach_change_tracking("field-config-table");
        let _new = ctl.attach_change_tracking("field-config-table");

        assert!(!ctl.on_control_changed(&old, TrackedControl::EnableToggle).expect("change"));
        assert!(!ctl.is_modified());
    }

    #[test]
    fn reload_prompt_depends_on_modified_flag() {
        let (_, mut ctl, _rx) = controller();
        assert!(ctl.reload_prompt().is_err());

        ctl.save_current_as("S", OverwritePolicy::Ask).expect("save");
        assert_eq!(
            ctl.reload_prompt().expect("prompt"),
            ReloadPrompt::Load { name: "S".into() }
        );

        ctl.mark_modified().expect("mark");
        assert_eq!(
            ctl.reload_prompt().expect("prompt"),
            ReloadPrompt::UnsavedChanges { name: "S".into() }
        );
    }

    #[test]
    fn reload_choices() {
        let (_, mut ctl, _rx) = controller();
        ctl.bridge().set_filters(&price_filter()).expect("filters");
        ctl.save_current_as("S", OverwritePolicy::Ask).expect("save");

        ctl.bridge().set_filters(&[]).expect("edit");
        ctl.mark_modified().expect("mark");

        assert!(!ctl.resolve_reload(ReloadChoice::Cancel).expect("cancel"));
        assert!(ctl.is_modified());

        assert!(ctl.resolve_reload(ReloadChoice::DiscardAndLoad).expect("discard"));
        assert_eq!(ctl.bridge().filters(), price_filter());
        assert!(!ctl.is_modified());

        ctl.bridge().set_filters(&[]).expect("edit");
        ctl.mark_modified().expect("mark");
        assert!(ctl.resolve_reload(ReloadChoice::SaveThenLoad).expect("save then load"));
        assert!(ctl.bridge().filters().is_empty());
        assert!(ctl.repository().get("S").expect("saved").filters.is_empty());
        assert!(!ctl.is_modified());
    }

    #[test]
    fn reset_override_reverts_to_inherited_value() {
        let (_, mut ctl, _rx) = controller();
        ctl.save_current_as("S", OverwritePolicy::Ask).expect("save");

        let mut pre = ctl.bridge().field_settings();
        pre.enabled.insert("growth".into(), false);
        ctl.bridge().set_field_settings(&pre).expect("pre");

        let mut post = ctl.bridge().post_transform_settings();
        post.enabled.insert("growth".into(), true);
        ctl.bridge().set_post_transform_settings(&post).expect("post");

        let row = ctl.post_transform_row("growth");
        assert!(row.enabled.value);
        assert_eq!(row.enabled.source, ValueSource::Explicit);

        let row = ctl.reset_override("growth", SettingKind::Enabled).expect("reset");
        assert!(!row.enabled.value);
        assert!(row.enabled.is_inherited());
        assert!(ctl.is_modified());
    }

    #[test]
    fn reset_without_override_leaves_flag_alone() {
        let (_, mut ctl, _rx) = controller();
        ctl.save_current_as("S", OverwritePolicy::Ask).expect("save");

        let row = ctl.reset_override("score", SettingKind::Tip).expect("reset");
        assert_eq!(row.tip.source, ValueSource::Default);
        assert!(!ctl.is_modified());
    }

    #[test]
    fn import_sanitizes_file_name() {
        let (_, mut ctl, _rx) = controller();
        let outcome = ctl
            .import(
                "Q3 Plan!!.json",
                r#"{"filters":[],"rules":[],"fieldSettings":{}}"#,
                OverwritePolicy::Ask,
            )
            .expect("import");

        assert_eq!(
            outcome,
            ImportOutcome::Imported { name: "Q3_Plan__".into(), replaced: false }
        );
        assert_eq!(ctl.names(), vec!["Q3_Plan__"]);
        // Importing does not touch the active scenario
        assert_eq!(ctl.active_name(), None);
    }

    #[test]
    fn import_rejects_bad_input_without_side_effects() {
        let (_, mut ctl, _rx) = controller();

        assert!(matches!(
            ctl.import("plan.txt", "{}", OverwritePolicy::Ask),
            Err(Error::UnsupportedFile { .. })
        ));
        assert!(matches!(
            ctl.import("plan.json", "{", OverwritePolicy::Ask),
            Err(Error::Json { .. })
        ));
        assert!(matches!(
            ctl.import("plan.json", r#"{"filters": []}"#, OverwritePolicy::Ask),
            Err(Error::MissingImportKeys { .. })
        ));
        assert!(ctl.names().is_empty());
    }

    #[test]
    fn import_collision_asks_first() {
        let (_, mut ctl, _rx) = controller();
        ctl.repository().put("plan", &NamedConfiguration::default()).expect("put");
        let doc = r#"{"filters":[{"field":"pe"}],"rules":[],"fieldSettings":{}}"#;

        assert_eq!(
            ctl.import("plan.json", doc, OverwritePolicy::Ask).expect("ask"),
            ImportOutcome::ConfirmOverwrite { name: "plan".into() }
        );
        assert!(ctl.repository().get("plan").expect("plan").filters.is_empty());

        ctl.import("plan.json", doc, OverwritePolicy::Overwrite).expect("overwrite");
        assert_eq!(ctl.repository().get("plan").expect("plan").filters.len(), 1);
    }

    #[test]
    fn export_then_import_preserves_settings() {
        let (_, mut ctl, _rx) = controller();
        ctl.bridge().set_filters(&price_filter()).expect("filters");
        ctl.save_current_as("Value Picks", OverwritePolicy::Ask).expect("save");

        let exported = ctl.export("Value Picks").expect("export");
        assert_eq!(exported.file_name, "analytics_scenario_Value_Picks.json");
        assert!(exported.contents.contains('\n'));

        ctl.import(&exported.file_name, &exported.contents, OverwritePolicy::Ask)
            .expect("import");
        assert_eq!(
            ctl.repository().get("analytics_scenario_Value_Picks"),
            ctl.repository().get("Value Picks")
        );
    }

    #[test]
    fn dispatch_turns_errors_into_status_messages() {
        let (_, mut ctl, rx) = controller();

        let outcome = ctl.dispatch(ScenarioCommand::Activate { name: "Missing".into() });
        assert!(matches!(outcome, CommandOutcome::Failed { .. }));

        let status = rx.try_iter().find_map(|e| e.as_status().map(|(l, m)| (l, m.to_string())));
        let (level, message) = status.expect("status message");
        assert_eq!(level, crate::eventing::StatusLevel::Warn);
        assert!(message.contains("Missing"));
    }

    #[test]
    fn dispatch_routes_every_command() {
        let (_, mut ctl, _rx) = controller();

        assert_eq!(
            ctl.dispatch(ScenarioCommand::SaveAs { name: "A".into(), policy: OverwritePolicy::Ask }),
            CommandOutcome::Completed
        );
        assert_eq!(
            ctl.dispatch(ScenarioCommand::SaveAs { name: "A".into(), policy: OverwritePolicy::Ask }),
            CommandOutcome::ConfirmOverwrite { name: "A".into() }
        );
        assert!(matches!(
            ctl.dispatch(ScenarioCommand::Export { name: "A".into() }),
            CommandOutcome::Exported(_)
        ));
        assert!(matches!(
            ctl.dispatch(ScenarioCommand::ResetOverride { field: "x".into(), kind: SettingKind::Format }),
            CommandOutcome::Row(_)
        ));
        assert_eq!(
            ctl.dispatch(ScenarioCommand::Reload { choice: ReloadChoice::Cancel }),
            CommandOutcome::Ignored
        );
        assert!(matches!(
            ctl.dispatch(ScenarioCommand::Delete { name: "A".into() }),
            CommandOutcome::Failed { .. }
        ));
    }
}
