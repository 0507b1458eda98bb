// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use crate::{error::Result, session::SessionStore};

use super::Request;

pub const AUTHORIZATION: &str = "Authorization";

/// Attaches the stored bearer token, if any. The store is consulted on every
/// call so a token written between two requests is picked up by the second.
pub async fn inject(store: &SessionStore, req: &mut Request) -> Result<()> {
    if let Some(token) = store.get_token().await? {
        req.set_header(AUTHORIZATION, token.to_header());
    }
    Ok(())
}
