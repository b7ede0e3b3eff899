use std::path::PathBuf;

use clap::{Parser, Subcommand};
use skirmish_engine::{ArenaConfig, ArenaSettings};
use skirmish_training::curriculum::{Curriculum, Lesson};

use crate::{
    params::{ExternalParameters, ParamArg},
    util,
};

use self::{resolve_settings::ResolveSettingsArg, simulate::SimulateArg};

mod resolve_settings;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run episodes headlessly with scripted pilots
    Simulate(#[clap(flatten)] SimulateArg),
    /// Print the effective settings for one episode
    ResolveSettings(#[clap(flatten)] ResolveSettingsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::ResolveSettings(arg) => resolve_settings::run(&arg)?,
    }
    Ok(())
}

/// Inputs of the settings resolver shared by every subcommand.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SettingsArg {
    /// Arena configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override settings JSON file, replacing the defaults
    #[arg(long = "override")]
    override_settings: Option<PathBuf>,
    /// External parameter overriding a settings field (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<ParamArg>,
    /// Curriculum lessons JSON file
    #[arg(long)]
    curriculum: Option<PathBuf>,
}

impl SettingsArg {
    pub(crate) fn load_config(&self) -> anyhow::Result<ArenaConfig> {
        let config: ArenaConfig = match &self.config {
            Some(path) => util::read_json_file("arena config", path)?,
            None => ArenaConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn load_override(&self) -> anyhow::Result<Option<ArenaSettings>> {
        let Some(path) = &self.override_settings else {
            return Ok(None);
        };
        let settings: ArenaSettings = util::read_json_file("override settings", path)?;
        settings.validate()?;
        Ok(Some(settings))
    }

    /// Parameter source built from `--param` and `--curriculum`, if either is given.
    pub(crate) fn load_parameters(&self) -> anyhow::Result<Option<ExternalParameters>> {
        let curriculum = match &self.curriculum {
            Some(path) => {
                let lessons: Vec<Lesson> = util::read_json_file("curriculum", path)?;
                Some(Curriculum::new(lessons))
            }
            None => None,
        };
        if curriculum.is_none() && self.params.is_empty() {
            return Ok(None);
        }
        Ok(Some(ExternalParameters::new(curriculum, &self.params)))
    }
}
