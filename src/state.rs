// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::coordinator::IssuanceCoordinator;
use crate::store::TokenDatabase;

/// Shared application state.
///
/// The coordinator and store are constructed once at startup and shared
/// across request handlers; neither holds request-scoped state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<IssuanceCoordinator>,
    pub store: Arc<TokenDatabase>,
}

impl AppState {
    pub fn new(coordinator: Arc<IssuanceCoordinator>, store: Arc<TokenDatabase>) -> Self {
        Self { coordinator, store }
    }
}
