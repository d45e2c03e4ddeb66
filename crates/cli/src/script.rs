//! Scripted authoring sessions.
//!
//! A script is a YAML document naming the mode, the host context and a list of actions:
//!
//! ```yaml
//! mode: goal
//! context:
//!   visit_id: V1
//! actions:
//!   - edit: { care-plan-title: Post-op Mobility Plan }
//!   - next
//!   - next
//!   - edit: { intervention-goal: G9 }
//!   - edit: { intervention-title: Ankle ROM exercises }
//!   - save
//! ```

use anyhow::Context;
use careplan_core::{Action, FieldEdit, HostSurface, Mode, OpenContext, Step, Workflow};
use careplan_gateway::EntityGateway;
use careplan_wire::EntityId;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptContext {
    #[serde(default)]
    pub visit_id: Option<EntityId>,
    #[serde(default)]
    pub care_plan_id: Option<EntityId>,
    #[serde(default)]
    pub goal_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptAction {
    Edit(FieldEdit),
    Next,
    Back,
    Save,
    Cancel,
}

impl From<ScriptAction> for Action {
    fn from(action: ScriptAction) -> Self {
        match action {
            ScriptAction::Edit(edit) => Action::Edit(edit),
            ScriptAction::Next => Action::Next,
            ScriptAction::Back => Action::Back,
            ScriptAction::Save => Action::SaveAndComplete,
            ScriptAction::Cancel => Action::Cancel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub mode: Mode,
    #[serde(default)]
    pub start_step: Option<Step>,
    /// Overrides the default review date; the local date otherwise.
    #[serde(default)]
    pub today: Option<NaiveDate>,
    #[serde(default)]
    pub context: ScriptContext,
    #[serde(default)]
    pub actions: Vec<ScriptAction>,
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse script {}", path.display()))
    }

    pub fn open_context(&self, default_today: NaiveDate) -> OpenContext {
        OpenContext {
            mode: self.mode,
            start_step: self.start_step,
            visit_id: self.context.visit_id.clone(),
            care_plan_id: self.context.care_plan_id.clone(),
            goal_id: self.context.goal_id.clone(),
            today: self.today.unwrap_or(default_today),
        }
    }
}

/// Opens a workflow for `script` and dispatches its actions in order.
///
/// A session still open after the last action is closed as if by the host.
pub async fn run<G, H>(
    script: Script,
    workflow: &mut Workflow<G, H>,
    default_today: NaiveDate,
) -> anyhow::Result<()>
where
    G: EntityGateway,
    H: HostSurface,
{
    workflow.open(script.open_context(default_today)).await;
    for (index, action) in script.actions.into_iter().enumerate() {
        workflow
            .dispatch(action.into())
            .await
            .with_context(|| format!("action {} was refused", index + 1))?;
    }
    workflow.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TerminalHost;
    use careplan_core::CloseReason;
    use careplan_gateway::{GatewayConfig, HttpGateway, StaticToken};
    use careplan_stub::StubStore;
    use std::io::Write as _;
    use std::sync::Arc;
    use std::time::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn write_script(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write script");
        file
    }

    async fn gateway(store: &StubStore) -> HttpGateway {
        let addr = careplan_stub::spawn(store.clone())
            .await
            .expect("spawn stub server");
        let cfg = GatewayConfig::new(&format!("http://{addr}"), Duration::from_secs(5))
            .expect("valid config");
        HttpGateway::new(&cfg, Arc::new(StaticToken::new(Some("secret".into()))))
            .expect("build gateway")
    }

    #[test]
    fn parses_actions_and_context() {
        let file = write_script(
            "mode: intervention\n\
             today: 2024-07-01\n\
             context:\n  goal_id: 42\n\
             actions:\n  - edit: { intervention-title: Ankle ROM exercises }\n  - edit: { intervention-staff: D4 }\n  - save\n",
        );
        let script = Script::load(file.path()).expect("load script");

        assert_eq!(script.mode, Mode::Intervention);
        assert_eq!(
            script.actions,
            vec![
                ScriptAction::Edit(FieldEdit::InterventionTitle("Ankle ROM exercises".into())),
                ScriptAction::Edit(FieldEdit::InterventionStaff(Some(
                    EntityId::new("D4").expect("id")
                ))),
                ScriptAction::Save,
            ]
        );
        let context = script.open_context(today());
        assert_eq!(context.goal_id, Some(EntityId::new("42").expect("id")));
        assert_eq!(context.today.to_string(), "2024-07-01");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_script("mode: goal\nvisit: V1\n");
        let err = Script::load(file.path()).expect_err("unknown key");
        assert!(format!("{err:#}").contains("visit"));
    }

    #[tokio::test]
    async fn runs_wizard_against_stub_server() {
        let store = StubStore::new(Some("secret".into()));
        let other_plan = store.seed_care_plan("V0", "Nutrition").expect("seed plan");
        let g9 = store.seed_goal(&other_plan, "Gain weight").expect("seed goal");
        let file = write_script(&format!(
            "mode: goal\n\
             context:\n  visit_id: V1\n\
             actions:\n  - edit: {{ care-plan-title: Post-op Mobility Plan }}\n  - next\n  - next\n  - edit: {{ intervention-goal: '{g9}' }}\n  - edit: {{ intervention-title: Ankle ROM exercises }}\n  - save\n"
        ));
        let script = Script::load(file.path()).expect("load script");

        let mut workflow = Workflow::new(gateway(&store).await, TerminalHost::new(Vec::new()));
        run(script, &mut workflow, today()).await.expect("script runs");

        let (_, host) = workflow.into_parts();
        assert_eq!(host.close_reason(), Some(CloseReason::Completed));
        assert_eq!(host.errors(), 0);
        assert_eq!(store.care_plans().len(), 2);
        let interventions = store.interventions_for(&g9).expect("goal exists");
        assert_eq!(interventions.len(), 1);
        assert_eq!(interventions[0].title, "Ankle ROM exercises");
    }

    #[tokio::test]
    async fn unfinished_script_is_closed_by_host() {
        let store = StubStore::new(Some("secret".into()));
        let file = write_script("mode: review\nactions:\n  - edit: { review-notes: steady }\n");
        let script = Script::load(file.path()).expect("load script");

        let mut workflow = Workflow::new(gateway(&store).await, TerminalHost::new(Vec::new()));
        run(script, &mut workflow, today()).await.expect("script runs");

        let (_, host) = workflow.into_parts();
        assert_eq!(host.close_reason(), Some(CloseReason::Host));
    }

    #[tokio::test]
    async fn actions_after_close_are_refused() {
        let store = StubStore::new(Some("secret".into()));
        let file = write_script("mode: goal\nactions:\n  - cancel\n  - next\n");
        let script = Script::load(file.path()).expect("load script");

        let mut workflow = Workflow::new(gateway(&store).await, TerminalHost::new(Vec::new()));
        let err = run(script, &mut workflow, today())
            .await
            .expect_err("second action refused");
        assert!(format!("{err:#}").contains("action 2 was refused"));
    }
}
