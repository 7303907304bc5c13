use std::io;

use thiserror::Error;

/// Errors produced while configuring or running an agent
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Environment has no available actions")]
    NoActions,

    #[error("Environment has no enumerable states")]
    NoStates,

    #[error("Episode is finished, the environment must be reset before stepping")]
    EpisodeFinished,

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
