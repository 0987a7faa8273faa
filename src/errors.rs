/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use thiserror::Error;

/// Error for `assembly_streams`
///
/// Sampling failures are not errors. A stream that could not find a witness
/// returns a value saying so, these variants are for broken inputs and misuse
/// of the collision world.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("entity {entity} requires tool type {tool_type} but no such tool is registered")]
    UnknownToolType { entity: String, tool_type: String },
    #[error("entity {entity} refers to unknown tool {tool_id}")]
    UnknownTool { entity: String, tool_id: String },
    #[error("entity {entity} has no target frame for movement {movement}")]
    MissingTargetFrame { entity: String, movement: String },
    #[error("unknown entity {0}")]
    UnknownEntity(String),
    #[error("invalid reachable range: min={min}, max={max}")]
    InvalidReachableRange { min: f64, max: f64 },
    #[error("body {0} is not in the collision world")]
    UnknownBody(String),
    #[error("link {0} is not in the robot model")]
    UnknownLink(String),
    #[error("body {0} is already attached")]
    AlreadyAttached(String),
    #[error("body {0} is not attached")]
    NotAttached(String),
    #[error("configuration has {actual} joint values, expected {expected}")]
    ConfigurationSize { expected: usize, actual: usize },
    #[error("unknown stream {0}")]
    UnknownStream(String),
    #[error("invalid arguments for stream {stream}: {reason}")]
    InvalidStreamArguments { stream: String, reason: String },
    #[error("URDF error: {0:?}")]
    Urdf(#[from] urdf_rs::UrdfError),
    #[error("kinematics error: {0:?}")]
    Kinematics(#[from] k::Error),
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True if the error comes from static process or robot data.
    ///
    /// These must be surfaced to the user, retrying the stream cannot fix them.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownToolType { .. }
                | Error::UnknownTool { .. }
                | Error::MissingTargetFrame { .. }
                | Error::UnknownEntity(_)
                | Error::InvalidReachableRange { .. }
                | Error::UnknownBody(_)
                | Error::UnknownLink(_)
        )
    }
}

/// Result for `assembly_streams`
pub type Result<T> = ::std::result::Result<T, Error>;

impl<'a> From<&'a str> for Error {
    fn from(err: &'a str) -> Error {
        Error::Other(err.to_owned())
    }
}

impl From<String> for Error {
    fn from(error: String) -> Error {
        Error::Other(error)
    }
}
