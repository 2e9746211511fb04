// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Parameter '{0}' not found.")]
    NotFound(String),

    #[error(
        "A parameter named '{0}' already exists. To update an existing parameter, use 'update'."
    )]
    DuplicateKey(String),

    #[error("A parameter named '{0}' does not exist. To add a new parameter, use 'add'.")]
    MissingKey(String),

    #[error(
        "Base parameter '{0}' cannot be changed from within a linked parameter store."
    )]
    BaseIsImmutable(String),

    #[error("No serialization defined for objects of type {0}")]
    NoSerializerDefined(String),

    #[error("Invalid store settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}
