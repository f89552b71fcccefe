//! Interactive mode: pick forces and options, then fetch.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, MultiSelect, Select};
use uk_crime_cli_utils::MultiProgress;
use uk_crime_pipeline::{FailurePolicy, PipelineConfig};
use uk_crime_police_api::PoliceApiClient;

use crate::commands;

/// Top-level actions offered in interactive mode.
enum Action {
    FetchCrimes,
    ListForces,
}

impl Action {
    const ALL: &[Self] = &[Self::FetchCrimes, Self::ListForces];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::FetchCrimes => "Fetch street-level crimes",
            Self::ListForces => "List police forces",
        }
    }
}

const POLICIES: &[(FailurePolicy, &str)] = &[
    (FailurePolicy::Abort, "Stop at the first failed triangle"),
    (FailurePolicy::Partial, "Skip failed triangles and report them"),
];

/// Runs the interactive prompts.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen action fails.
pub async fn run(
    multi: &MultiProgress,
    client: &PoliceApiClient,
    mut config: PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("UK Street Crime Pipeline");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::ListForces => commands::list_forces(client, None).await,
        Action::FetchCrimes => {
            let forces = client.forces().await?;
            let force_labels: Vec<String> = forces
                .iter()
                .map(|f| format!("{} ({})", f.name, f.id))
                .collect();
            let defaults: Vec<bool> = forces
                .iter()
                .map(|f| config.forces.contains(&f.id))
                .collect();

            let selected = MultiSelect::new()
                .with_prompt("Forces to fetch (space=toggle, a=all, enter=confirm)")
                .items(&force_labels)
                .defaults(&defaults)
                .max_length(20)
                .interact()?;

            if selected.is_empty() {
                println!("No forces selected.");
                return Ok(());
            }
            let chosen: Vec<String> = selected.iter().map(|&i| forces[i].id.clone()).collect();

            let date: String = Input::new()
                .with_prompt("Month (YYYY-MM, empty for latest)")
                .default(config.date.clone().unwrap_or_default())
                .allow_empty(true)
                .interact_text()?;
            config.date = Some(date.trim().to_string()).filter(|d| !d.is_empty());

            let policy_labels: Vec<&str> = POLICIES.iter().map(|(_, label)| *label).collect();
            let policy = Select::new()
                .with_prompt("When a triangle fails")
                .items(&policy_labels)
                .default(0)
                .interact()?;
            config.failure_policy = POLICIES[policy].0;

            let output: String = Input::new()
                .with_prompt("Output CSV")
                .default(config.output.display().to_string())
                .interact_text()?;
            config.output = PathBuf::from(output);

            config.validate()?;

            if !Confirm::new()
                .with_prompt(format!("Fetch crimes for {} force(s)?", chosen.len()))
                .default(true)
                .interact()?
            {
                return Ok(());
            }

            commands::fetch_all(multi, client, &config, &chosen).await
        }
    }
}
