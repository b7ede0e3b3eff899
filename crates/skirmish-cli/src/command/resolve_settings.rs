use std::path::PathBuf;

use skirmish_engine::{BoundaryRadii, ParameterSource, SettingsResolver};

use crate::{command::SettingsArg, schema::report::ResolvedSettingsReport, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ResolveSettingsArg {
    #[clap(flatten)]
    settings: SettingsArg,
    /// Episode index used to pick the curriculum lesson
    #[arg(long, default_value_t = 0)]
    episode: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ResolveSettingsArg) -> anyhow::Result<()> {
    let ResolveSettingsArg {
        settings,
        episode,
        output,
    } = arg;

    let config = settings.load_config()?;
    let mut resolver = SettingsResolver::new(config.defaults);
    resolver.set_override(settings.load_override()?);

    let mut params = settings.load_parameters()?;
    if let Some(params) = &mut params {
        params.prepare(*episode);
    }
    let effective = resolver.resolve(params.as_ref().map(|p| p as &dyn ParameterSource));
    let radii = BoundaryRadii::new(effective.arena_size(), &config.boundary);

    let report = ResolvedSettingsReport {
        episode: *episode,
        settings: effective,
        soft_radius: radii.soft,
        hard_radius: radii.hard,
        spawn_radius: effective.arena_size() * config.episode.spawn_radius_fraction,
    };
    util::save_json(&report, output.as_deref())?;
    Ok(())
}
