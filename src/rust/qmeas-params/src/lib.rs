// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! File-backed parameter stores for measurement scripting.
//!
//! A [`BaseParameterStore`] holds the parameters of one sample/structure, a
//! [`LinkedParameterStore`] layers its own keys on top of a base while
//! refusing to touch the keys the base owns. Every mutation rewrites the
//! store file as indented JSON.

pub mod base;
pub mod error;
pub mod linked;
pub mod sample;
pub mod settings;
pub mod store;
pub mod value;

pub use crate::base::{BaseParameterStore, SharedBaseStore};
pub use crate::error::{Error, Result};
pub use crate::linked::LinkedParameterStore;
pub use crate::sample::SampleIdentity;
pub use crate::settings::StoreSettings;
pub use crate::store::ParameterStore;
pub use crate::value::{OpaqueValue, ParameterValue, PulseDescriptor};
