use std::{collections::BTreeMap, num::ParseFloatError, str::FromStr};

use skirmish_engine::ParameterSource;
use skirmish_training::curriculum::Curriculum;

/// A `name=value` pair given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParamArg {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub(crate) enum ParseParamError {
    #[display("expected NAME=VALUE, got `{arg}`")]
    MissingSeparator { arg: String },
    #[display("empty parameter name in `{arg}`")]
    EmptyName { arg: String },
    #[display("invalid value for parameter `{name}`")]
    InvalidValue {
        name: String,
        source: ParseFloatError,
    },
}

impl FromStr for ParamArg {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, value)) = s.split_once('=') else {
            return Err(ParseParamError::MissingSeparator { arg: s.to_owned() });
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseParamError::EmptyName { arg: s.to_owned() });
        }
        let value = value
            .trim()
            .parse()
            .map_err(|source| ParseParamError::InvalidValue {
                name: name.to_owned(),
                source,
            })?;
        Ok(Self {
            name: name.to_owned(),
            value,
        })
    }
}

/// Trainer-side parameters: fixed command line values on top of an optional
/// curriculum.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExternalParameters {
    curriculum: Option<Curriculum>,
    fixed: BTreeMap<String, f32>,
}

impl ExternalParameters {
    pub(crate) fn new(curriculum: Option<Curriculum>, params: &[ParamArg]) -> Self {
        Self {
            curriculum,
            fixed: params
                .iter()
                .map(|param| (param.name.clone(), param.value))
                .collect(),
        }
    }
}

impl ParameterSource for ExternalParameters {
    fn scalar(&self, name: &str, default: f32) -> f32 {
        if let Some(value) = self.fixed.get(name) {
            return *value;
        }
        self.curriculum
            .as_ref()
            .map_or(default, |curriculum| curriculum.scalar(name, default))
    }

    fn prepare(&mut self, episode: u64) {
        if let Some(curriculum) = &mut self.curriculum {
            curriculum.prepare(episode);
        }
    }
}
