// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator seams of the sync loop.
//!
//! [`ConversationStore`], [`ChatSurface`] and [`ResponseGenerator`] all extend
//! [`PluginAdapter`].

pub mod adapter;
pub mod generator;
pub mod store;
pub mod surface;

pub use adapter::PluginAdapter;
pub use generator::ResponseGenerator;
pub use store::ConversationStore;
pub use surface::ChatSurface;
