// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod cache;
pub(crate) mod model;

pub use cache::{ProfileCache, ProfileState};
pub use model::{ProfilePatch, Role, UserProfile};
